use crate::models::evidence::Assessment;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const MAX_SUMMARY_CHARS: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Direct,
    Paraphrase,
    Contradiction,
    NotFound,
}

/// Final attribution result handed back to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub claim: String,
    pub relation: Relation,
    pub summary: String,
    pub assessments: Vec<Assessment>,
    pub best_assessment: Option<Assessment>,
    pub relies_on_secondary_only: bool,
}

impl Verdict {
    pub fn not_found(claim: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
            relation: Relation::NotFound,
            summary: clip_summary(summary.into()),
            assessments: Vec::new(),
            best_assessment: None,
            relies_on_secondary_only: false,
        }
    }
}

pub fn clip_summary(summary: String) -> String {
    if summary.chars().count() <= MAX_SUMMARY_CHARS {
        return summary;
    }
    let mut out: String = summary.chars().take(MAX_SUMMARY_CHARS - 3).collect();
    out.push_str("...");
    out
}
