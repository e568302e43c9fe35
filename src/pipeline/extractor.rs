use crate::error::CompletionError;
use crate::models::{Claim, Extraction, InputText};
use crate::pipeline::fanout::CancelToken;
use crate::pipeline::prompts::{self, CLAIM_EXTRACTION_SYSTEM, EXTRACTION_MAX_TOKENS};
use crate::pipeline::responses::ClaimExtractionResponse;
use crate::pipeline::traits::{complete_structured, CompletionService};

pub const DEFAULT_EXTRACTION_FAILURE: &str =
    "Could not extract a verifiable factual claim from the input.";

/// Asks the completion service for one atomic claim. `Ok(Extraction::Failed)`
/// is a semantic miss; `Err` is a service or decode failure, which the caller
/// downgrades to a failed extraction.
pub async fn extract_claim<C>(
    completion: &C,
    input: &InputText,
    cancel: &CancelToken,
) -> Result<Extraction, CompletionError>
where
    C: CompletionService + ?Sized,
{
    tracing::info!(chars = input.char_len(), "extracting claim");
    let response: ClaimExtractionResponse = cancel
        .run_until_cancelled(complete_structured(
            completion,
            CLAIM_EXTRACTION_SYSTEM,
            prompts::claim_extraction_user(input.as_str()),
            Some(EXTRACTION_MAX_TOKENS),
        ))
        .await
        .ok_or(CompletionError::Cancelled)??;

    interpret(response)
}

fn interpret(response: ClaimExtractionResponse) -> Result<Extraction, CompletionError> {
    let notes = response
        .extraction_notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    if response.extraction_failed {
        let reason = notes.unwrap_or_else(|| DEFAULT_EXTRACTION_FAILURE.to_string());
        tracing::warn!(%reason, "extraction failed");
        return Ok(Extraction::Failed { reason });
    }

    let text = response
        .claim
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CompletionError::Invalid("claim missing from extraction".to_string()))?;
    let originating_context = response
        .original_context
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            CompletionError::Invalid("original_context missing from extraction".to_string())
        })?;
    let confidence = response.extraction_confidence.ok_or_else(|| {
        CompletionError::Invalid("extraction_confidence missing from extraction".to_string())
    })?;

    tracing::info!(claim = %text, ?confidence, "extracted claim");
    Ok(Extraction::Claimed(Claim {
        text,
        originating_context,
        confidence,
        notes,
    }))
}
