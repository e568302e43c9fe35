use crate::error::CompletionError;
use crate::models::{Candidate, Evidence, MIN_QUOTE_CHARS};
use crate::pipeline::fanout::{bounded_fan_out, CancelToken};
use crate::pipeline::prompts::{self, EVIDENCE_RELEVANCE_SYSTEM, SOURCE_CLASSIFICATION_SYSTEM};
use crate::pipeline::responses::{EvidenceRelevanceResponse, SourceClassificationResponse};
use crate::pipeline::traits::{complete_structured, CompletionService};
use std::collections::HashSet;

pub const MAX_EVIDENCE: usize = 5;
pub const MIN_RELEVANCE: f32 = 0.5;
pub const MIN_TOKEN_OVERLAP: f32 = 0.6;

/// Vets every candidate concurrently (at most `limit` in flight), then keeps
/// the [`MAX_EVIDENCE`] most relevant. Ties keep retrieval order.
pub async fn gate_candidates<C>(
    completion: &C,
    claim: &str,
    candidates: Vec<Candidate>,
    limit: usize,
    cancel: &CancelToken,
) -> Vec<Evidence>
where
    C: CompletionService + ?Sized,
{
    if candidates.is_empty() {
        tracing::warn!("no candidates to filter");
        return Vec::new();
    }
    let total = candidates.len();

    let vetted = bounded_fan_out(candidates, limit, cancel, |candidate| async move {
        match vet_candidate(completion, claim, &candidate).await {
            Ok(evidence) => evidence,
            Err(e) => {
                tracing::warn!(title = %candidate.title, error = %e, "evidence assessment failed");
                None
            }
        }
    })
    .await;

    let evidence = rank_evidence(vetted.into_iter().flatten().collect());
    tracing::info!(candidates = total, kept = evidence.len(), "filtered evidence");
    evidence
}

/// Stable descending sort by relevance, truncated to [`MAX_EVIDENCE`].
pub fn rank_evidence(mut evidence: Vec<Evidence>) -> Vec<Evidence> {
    evidence.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    evidence.truncate(MAX_EVIDENCE);
    evidence
}

/// Relevance and provenance are requested concurrently; either failing fails
/// the candidate. `Ok(None)` means the candidate was filtered out.
async fn vet_candidate<C>(
    completion: &C,
    claim: &str,
    candidate: &Candidate,
) -> Result<Option<Evidence>, CompletionError>
where
    C: CompletionService + ?Sized,
{
    let url = candidate.url.as_str();
    let relevance = complete_structured::<EvidenceRelevanceResponse, _>(
        completion,
        EVIDENCE_RELEVANCE_SYSTEM,
        prompts::evidence_relevance_user(claim, url, &candidate.title, &candidate.content_snippet),
        None,
    );
    let classification = complete_structured::<SourceClassificationResponse, _>(
        completion,
        SOURCE_CLASSIFICATION_SYSTEM,
        prompts::source_classification_user(url, &candidate.title, &candidate.content_snippet),
        None,
    );
    let (relevance, classification) = tokio::join!(relevance, classification);
    let (relevance, classification) = (relevance?, classification?);

    if !(0.0..=1.0).contains(&relevance.relevance_score) {
        return Err(CompletionError::Invalid(format!(
            "relevance_score {} out of range",
            relevance.relevance_score
        )));
    }
    if !relevance.is_relevant {
        tracing::debug!(title = %candidate.title, "filtered out: not relevant");
        return Ok(None);
    }
    if relevance.relevance_score < MIN_RELEVANCE {
        tracing::debug!(title = %candidate.title, score = relevance.relevance_score, "filtered out: low score");
        return Ok(None);
    }

    let quote = relevance
        .verbatim_quote
        .as_deref()
        .and_then(|q| substantiate_quote(q, candidate.source_text()));
    let Some(verbatim_quote) = quote else {
        tracing::debug!(title = %candidate.title, "filtered out: no substantiated quote");
        return Ok(None);
    };

    tracing::info!(
        title = %candidate.title,
        source_type = classification.source_type.as_str(),
        "found evidence"
    );
    Ok(Some(Evidence {
        source_url: candidate.url.clone(),
        source_title: candidate.title.clone(),
        source_type: classification.source_type,
        verbatim_quote,
        relevance_score: relevance.relevance_score,
        relevance_explanation: relevance.relevance_explanation,
    }))
}

/// Returns the trimmed quote if the source backs it up: either as a
/// case-insensitive substring, or with at least [`MIN_TOKEN_OVERLAP`] of its
/// whitespace tokens present among the source's tokens. Quotes shorter than
/// [`MIN_QUOTE_CHARS`] are never accepted.
pub fn substantiate_quote(quote: &str, source: &str) -> Option<String> {
    let quote = quote.trim();
    if quote.chars().count() < MIN_QUOTE_CHARS {
        return None;
    }
    let normalized_quote = quote.to_lowercase();
    let normalized_source = source.to_lowercase();
    if normalized_source.contains(&normalized_quote) {
        return Some(quote.to_string());
    }

    if token_overlap(&normalized_quote, &normalized_source) >= MIN_TOKEN_OVERLAP {
        Some(quote.to_string())
    } else {
        None
    }
}

/// Share of quote tokens (counted with repetition) that occur anywhere in the
/// source. Both inputs are expected lowercased.
pub fn token_overlap(quote: &str, source: &str) -> f32 {
    let quote_tokens: Vec<&str> = quote.split_whitespace().collect();
    if quote_tokens.is_empty() {
        return 0.0;
    }
    let source_tokens: HashSet<&str> = source.split_whitespace().collect();
    let present = quote_tokens
        .iter()
        .filter(|t| source_tokens.contains(*t))
        .count();
    present as f32 / quote_tokens.len() as f32
}
