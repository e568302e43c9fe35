use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

pub const MIN_QUOTE_CHARS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Primary,
    OriginalReporting,
    Secondary,
    Unknown,
}

impl SourceType {
    pub fn rank(self) -> u8 {
        match self {
            SourceType::Primary => 3,
            SourceType::OriginalReporting => 2,
            SourceType::Secondary => 1,
            SourceType::Unknown => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Primary => "primary",
            SourceType::OriginalReporting => "original_reporting",
            SourceType::Secondary => "secondary",
            SourceType::Unknown => "unknown",
        }
    }
}

/// Textual relationship between one source and the claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceRelation {
    Direct,
    Paraphrase,
    Contradiction,
}

impl SourceRelation {
    pub fn rank(self) -> u8 {
        match self {
            SourceRelation::Direct => 2,
            SourceRelation::Paraphrase => 1,
            SourceRelation::Contradiction => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceRelation::Direct => "direct",
            SourceRelation::Paraphrase => "paraphrase",
            SourceRelation::Contradiction => "contradiction",
        }
    }
}

/// A vetted candidate. `verbatim_quote` is substantiated by the candidate's
/// content and is at least [`MIN_QUOTE_CHARS`] long.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub source_url: Url,
    pub source_title: String,
    pub source_type: SourceType,
    pub verbatim_quote: String,
    pub relevance_score: f32,
    pub relevance_explanation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub evidence: Evidence,
    pub relation: SourceRelation,
    pub reasoning: String,
}
