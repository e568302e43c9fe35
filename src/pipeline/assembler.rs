use crate::error::CompletionError;
use crate::models::{clip_summary, Assessment, Claim, Relation, SourceType, Verdict};
use crate::pipeline::fanout::CancelToken;
use crate::pipeline::prompts::{self, SYNTHESIS_MAX_TOKENS, VERDICT_SYNTHESIS_SYSTEM};
use crate::pipeline::responses::VerdictSynthesisResponse;
use crate::pipeline::traits::{complete_structured, CompletionService};
use std::fmt::Write as _;

pub const NO_CLAIM_PLACEHOLDER: &str = "[No factual claim could be extracted]";
pub const NO_SOURCES_SUMMARY: &str = "No relevant sources were found that address this claim.";

/// The verdict plus the synthesis failure, if the fallback was used.
pub struct Assembled {
    pub verdict: Verdict,
    pub error: Option<CompletionError>,
}

pub fn verdict_for_failed_extraction(reason: &str) -> Verdict {
    Verdict::not_found(NO_CLAIM_PLACEHOLDER, reason)
}

/// True iff there is at least one assessment and every one of them rests on
/// secondary evidence.
pub fn relies_on_secondary_only(assessments: &[Assessment]) -> bool {
    !assessments.is_empty()
        && assessments
            .iter()
            .all(|a| a.evidence.source_type == SourceType::Secondary)
}

/// Highest `(source type, relation)` score wins; on ties the earliest entry
/// is kept.
pub fn select_best(assessments: &[Assessment]) -> Option<&Assessment> {
    let mut best: Option<(&Assessment, (u8, u8))> = None;
    for assessment in assessments {
        let score = (
            assessment.evidence.source_type.rank(),
            assessment.relation.rank(),
        );
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((assessment, score)),
        }
    }
    best.map(|(a, _)| a)
}

pub fn format_assessments(assessments: &[Assessment]) -> String {
    if assessments.is_empty() {
        return NO_SOURCES_SUMMARY.to_string();
    }
    let mut out = String::new();
    for (i, a) in assessments.iter().enumerate() {
        let _ = write!(
            out,
            "\nSource {}:\n- Title: {}\n- Type: {}\n- Quote: \"{}\"\n- Attribution: {}\n- Reasoning: {}\n",
            i + 1,
            a.evidence.source_title,
            a.evidence.source_type.as_str(),
            a.evidence.verbatim_quote,
            a.relation.as_str(),
            a.reasoning
        );
    }
    out
}

/// Builds the verdict for a run that produced a claim.
pub async fn assemble_verdict<C>(
    completion: &C,
    claim: &Claim,
    assessments: Vec<Assessment>,
    cancel: &CancelToken,
) -> Assembled
where
    C: CompletionService + ?Sized,
{
    if assessments.is_empty() {
        return Assembled {
            verdict: Verdict::not_found(claim.text.clone(), NO_SOURCES_SUMMARY),
            error: None,
        };
    }

    let secondary_only = relies_on_secondary_only(&assessments);
    let best_assessment = select_best(&assessments).cloned();

    let synthesis = cancel
        .run_until_cancelled(complete_structured::<VerdictSynthesisResponse, _>(
            completion,
            VERDICT_SYNTHESIS_SYSTEM,
            prompts::verdict_synthesis_user(&claim.text, &format_assessments(&assessments)),
            Some(SYNTHESIS_MAX_TOKENS),
        ))
        .await
        .unwrap_or(Err(CompletionError::Cancelled));

    match synthesis {
        Ok(reply) => {
            tracing::info!(relation = ?reply.relation, "final attribution");
            Assembled {
                verdict: Verdict {
                    claim: claim.text.clone(),
                    relation: reply.relation,
                    summary: clip_summary(reply.summary),
                    assessments,
                    best_assessment,
                    relies_on_secondary_only: secondary_only || reply.relies_on_secondary_only,
                },
                error: None,
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "attribution assembly failed");
            Assembled {
                verdict: Verdict {
                    claim: claim.text.clone(),
                    relation: Relation::NotFound,
                    summary: clip_summary(format!(
                        "An error occurred while assembling the attribution: {e}"
                    )),
                    assessments,
                    best_assessment,
                    relies_on_secondary_only: secondary_only,
                },
                error: Some(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, Evidence, SourceRelation};
    use crate::pipeline::mock::ScriptedCompletion;
    use serde_json::json;
    use url::Url;

    fn claim() -> Claim {
        Claim {
            text: "Tesla delivered approximately 1.81 million vehicles in 2023.".to_string(),
            originating_context: "delivered approximately 1.81 million vehicles in 2023".to_string(),
            confidence: Confidence::High,
            notes: None,
        }
    }

    fn assessment(title: &str, source_type: SourceType, relation: SourceRelation) -> Assessment {
        Assessment {
            evidence: Evidence {
                source_url: Url::parse("https://example.com/a").unwrap(),
                source_title: title.to_string(),
                source_type,
                verbatim_quote: "a sufficiently long quote".to_string(),
                relevance_score: 0.9,
                relevance_explanation: "test".to_string(),
            },
            relation,
            reasoning: "test".to_string(),
        }
    }

    #[test]
    fn primary_direct_beats_secondary_paraphrase() {
        let list = vec![
            assessment("secondary", SourceType::Secondary, SourceRelation::Paraphrase),
            assessment("primary", SourceType::Primary, SourceRelation::Direct),
        ];
        assert_eq!(select_best(&list).unwrap().evidence.source_title, "primary");
    }

    #[test]
    fn type_outranks_relation() {
        let list = vec![
            assessment("reporting-direct", SourceType::OriginalReporting, SourceRelation::Direct),
            assessment("primary-contradiction", SourceType::Primary, SourceRelation::Contradiction),
        ];
        assert_eq!(
            select_best(&list).unwrap().evidence.source_title,
            "primary-contradiction"
        );
    }

    #[test]
    fn ties_keep_first_occurrence() {
        let list = vec![
            assessment("unknown", SourceType::Unknown, SourceRelation::Direct),
            assessment("first", SourceType::Primary, SourceRelation::Paraphrase),
            assessment("second", SourceType::Primary, SourceRelation::Paraphrase),
        ];
        assert_eq!(select_best(&list).unwrap().evidence.source_title, "first");
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn secondary_only_detection() {
        let all_secondary = vec![
            assessment("a", SourceType::Secondary, SourceRelation::Paraphrase),
            assessment("b", SourceType::Secondary, SourceRelation::Paraphrase),
        ];
        assert!(relies_on_secondary_only(&all_secondary));

        let mixed = vec![
            assessment("a", SourceType::Secondary, SourceRelation::Paraphrase),
            assessment("b", SourceType::Unknown, SourceRelation::Paraphrase),
        ];
        assert!(!relies_on_secondary_only(&mixed));
        assert!(!relies_on_secondary_only(&[]));
    }

    #[test]
    fn failed_extraction_verdict_is_terminal_not_found() {
        let verdict = verdict_for_failed_extraction("Text contains only opinions.");
        assert_eq!(verdict.relation, Relation::NotFound);
        assert_eq!(verdict.summary, "Text contains only opinions.");
        assert_eq!(verdict.claim, NO_CLAIM_PLACEHOLDER);
        assert!(verdict.assessments.is_empty());
        assert!(verdict.best_assessment.is_none());
        assert!(!verdict.relies_on_secondary_only);
    }

    #[tokio::test]
    async fn assembles_direct_attribution() {
        let completion = ScriptedCompletion::new().on::<VerdictSynthesisResponse, _>(|req| {
            assert!(req.user.contains("Source 2:"));
            Ok(json!({
                "relation": "direct",
                "summary": "Tesla's investor relations report confirms the figure.",
                "relies_on_secondary_only": false
            }))
        });
        let list = vec![
            assessment("Tesla IR", SourceType::Primary, SourceRelation::Direct),
            assessment("Reuters", SourceType::OriginalReporting, SourceRelation::Direct),
        ];

        let assembled = assemble_verdict(&completion, &claim(), list, &CancelToken::never()).await;
        assert!(assembled.error.is_none());
        let verdict = assembled.verdict;
        assert_eq!(verdict.relation, Relation::Direct);
        assert_eq!(verdict.assessments.len(), 2);
        let best = verdict.best_assessment.expect("best");
        assert_eq!(best.evidence.source_type, SourceType::Primary);
        assert!(!verdict.relies_on_secondary_only);
    }

    #[tokio::test]
    async fn no_assessments_skip_synthesis() {
        let completion = ScriptedCompletion::new();
        let assembled = assemble_verdict(&completion, &claim(), Vec::new(), &CancelToken::never()).await;
        assert_eq!(assembled.verdict.relation, Relation::NotFound);
        assert_eq!(assembled.verdict.summary, NO_SOURCES_SUMMARY);
        assert_eq!(completion.calls(), 0);
    }

    #[tokio::test]
    async fn synthesis_flag_is_ored_with_local_flag() {
        let completion = ScriptedCompletion::new().on::<VerdictSynthesisResponse, _>(|_| {
            Ok(json!({
                "relation": "paraphrase",
                "summary": "Only a blog restates it.",
                "relies_on_secondary_only": true
            }))
        });
        let list = vec![assessment("Blog", SourceType::Unknown, SourceRelation::Paraphrase)];
        let verdict = assemble_verdict(&completion, &claim(), list, &CancelToken::never())
            .await
            .verdict;
        assert!(verdict.relies_on_secondary_only);
    }

    #[tokio::test]
    async fn synthesis_failure_falls_back_but_keeps_evidence() {
        let completion = ScriptedCompletion::new().on::<VerdictSynthesisResponse, _>(|_| {
            Err(CompletionError::Service("upstream 503".to_string()))
        });
        let list = vec![
            assessment("a", SourceType::Secondary, SourceRelation::Paraphrase),
            assessment("b", SourceType::Secondary, SourceRelation::Direct),
        ];
        let assembled = assemble_verdict(&completion, &claim(), list, &CancelToken::never()).await;
        assert!(assembled.error.is_some());
        let verdict = assembled.verdict;
        assert_eq!(verdict.relation, Relation::NotFound);
        assert!(verdict.summary.contains("upstream 503"));
        assert_eq!(verdict.assessments.len(), 2);
        assert_eq!(verdict.best_assessment.unwrap().evidence.source_title, "b");
        assert!(verdict.relies_on_secondary_only);
    }

    #[tokio::test]
    async fn overlong_summary_is_clipped() {
        let completion = ScriptedCompletion::new().on::<VerdictSynthesisResponse, _>(|_| {
            Ok(json!({ "relation": "direct", "summary": "x".repeat(900) }))
        });
        let list = vec![assessment("a", SourceType::Primary, SourceRelation::Direct)];
        let verdict = assemble_verdict(&completion, &claim(), list, &CancelToken::never())
            .await
            .verdict;
        assert_eq!(verdict.summary.chars().count(), crate::models::MAX_SUMMARY_CHARS);
    }
}
