use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// The single atomic factual statement pulled out of the input text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub text: String,
    /// The portion of the input the claim was derived from.
    pub originating_context: String,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Result of the extraction stage. A failed extraction is not an error: it
/// routes the run straight to the verdict.
#[derive(Clone, Debug, PartialEq)]
pub enum Extraction {
    Claimed(Claim),
    Failed { reason: String },
}

impl Extraction {
    pub fn claim(&self) -> Option<&Claim> {
        match self {
            Extraction::Claimed(claim) => Some(claim),
            Extraction::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Extraction::Failed { .. })
    }
}
