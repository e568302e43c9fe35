use crate::models::{Assessment, Evidence};
use crate::pipeline::fanout::{bounded_fan_out, CancelToken};
use crate::pipeline::prompts::{self, SOURCE_RELATION_SYSTEM};
use crate::pipeline::responses::SourceRelationResponse;
use crate::pipeline::traits::{complete_structured, CompletionService};

/// Classifies each evidence item's textual relation to the claim. Items whose
/// call fails or is cancelled are dropped; the rest keep evidence order.
pub async fn compare_sources<C>(
    completion: &C,
    claim: &str,
    evidence: Vec<Evidence>,
    limit: usize,
    cancel: &CancelToken,
) -> Vec<Assessment>
where
    C: CompletionService + ?Sized,
{
    if evidence.is_empty() {
        tracing::warn!("no evidence to compare");
        return Vec::new();
    }

    let assessed = bounded_fan_out(evidence, limit, cancel, |evidence| async move {
        let reply = complete_structured::<SourceRelationResponse, _>(
            completion,
            SOURCE_RELATION_SYSTEM,
            prompts::source_relation_user(
                claim,
                &evidence.source_title,
                evidence.source_type.as_str(),
                &evidence.verbatim_quote,
            ),
            None,
        )
        .await;
        match reply {
            Ok(reply) => {
                tracing::info!(
                    title = %evidence.source_title,
                    relation = reply.relation.as_str(),
                    "classified source"
                );
                Some(Assessment {
                    evidence,
                    relation: reply.relation,
                    reasoning: reply.reasoning,
                })
            }
            Err(e) => {
                tracing::warn!(title = %evidence.source_title, error = %e, "source attribution failed");
                None
            }
        }
    })
    .await;

    let assessments: Vec<Assessment> = assessed.into_iter().flatten().collect();
    tracing::info!(count = assessments.len(), "completed source attributions");
    assessments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompletionError;
    use crate::models::{SourceRelation, SourceType};
    use crate::pipeline::fanout::cancel_pair;
    use crate::pipeline::mock::ScriptedCompletion;
    use serde_json::json;
    use url::Url;

    const CLAIM: &str = "Tesla delivered approximately 1.81 million vehicles in 2023.";

    fn evidence(title: &str, source_type: SourceType, quote: &str, score: f32) -> Evidence {
        Evidence {
            source_url: Url::parse("https://example.com/a").unwrap(),
            source_title: title.to_string(),
            source_type,
            verbatim_quote: quote.to_string(),
            relevance_score: score,
            relevance_explanation: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn compares_supporting_and_contradicting_evidence() {
        let completion = ScriptedCompletion::new().on::<SourceRelationResponse, _>(|req| {
            if req.user.contains("1.5 million") {
                Ok(json!({ "relation": "contradiction", "reasoning": "Different figure." }))
            } else {
                Ok(json!({ "relation": "direct", "reasoning": "Same figure." }))
            }
        });
        let items = vec![
            evidence(
                "Tesla Q4 2023 Update",
                SourceType::Primary,
                "delivered approximately 1.81 million vehicles",
                0.95,
            ),
            evidence(
                "Analyst note",
                SourceType::Secondary,
                "Tesla delivered only 1.5 million vehicles in 2023",
                0.7,
            ),
        ];

        let assessments = compare_sources(&completion, CLAIM, items, 4, &CancelToken::never()).await;

        assert_eq!(assessments.len(), 2);
        assert_eq!(assessments[0].relation, SourceRelation::Direct);
        assert_eq!(assessments[0].evidence.source_title, "Tesla Q4 2023 Update");
        assert_eq!(assessments[1].relation, SourceRelation::Contradiction);
    }

    #[tokio::test]
    async fn failed_item_does_not_block_others() {
        let completion = ScriptedCompletion::new().on::<SourceRelationResponse, _>(|req| {
            if req.user.contains("Flaky") {
                Err(CompletionError::Service("timeout".to_string()))
            } else {
                Ok(json!({ "relation": "paraphrase", "reasoning": "Reworded." }))
            }
        });
        let items = vec![
            evidence("First", SourceType::Secondary, "quote number one here", 0.9),
            evidence("Flaky", SourceType::Primary, "quote number two here", 0.8),
            evidence("Third", SourceType::Secondary, "quote number three here", 0.7),
        ];

        let assessments = compare_sources(&completion, CLAIM, items, 1, &CancelToken::never()).await;
        let titles: Vec<_> = assessments
            .iter()
            .map(|a| a.evidence.source_title.as_str())
            .collect();
        assert_eq!(titles, vec!["First", "Third"]);
    }

    #[tokio::test]
    async fn invalid_relation_drops_item() {
        let completion = ScriptedCompletion::new().on::<SourceRelationResponse, _>(|_| {
            Ok(json!({ "relation": "not_found", "reasoning": "?" }))
        });
        let items = vec![evidence("Only", SourceType::Primary, "some quote text", 0.9)];
        let assessments = compare_sources(&completion, CLAIM, items, 2, &CancelToken::never()).await;
        assert!(assessments.is_empty());
    }

    #[tokio::test]
    async fn no_evidence_makes_no_calls() {
        let completion = ScriptedCompletion::new();
        let assessments = compare_sources(&completion, CLAIM, Vec::new(), 2, &CancelToken::never()).await;
        assert!(assessments.is_empty());
        assert_eq!(completion.calls(), 0);
    }

    #[tokio::test]
    async fn cancelled_items_are_dropped() {
        let completion = ScriptedCompletion::new().stall::<SourceRelationResponse>();
        let (handle, token) = cancel_pair();
        let items = vec![
            evidence("A", SourceType::Primary, "some quote text", 0.9),
            evidence("B", SourceType::Primary, "other quote text", 0.8),
        ];
        let (assessments, ()) = tokio::join!(
            compare_sources(&completion, CLAIM, items, 2, &token),
            async {
                tokio::task::yield_now().await;
                handle.cancel();
            }
        );
        assert!(assessments.is_empty());
    }
}
