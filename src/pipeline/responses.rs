//! Typed completion replies. Each struct doubles as the JSON schema sent with
//! its request.

use crate::models::{Confidence, Relation, SourceRelation, SourceType};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClaimExtractionResponse {
    #[serde(default)]
    pub claim: Option<String>,
    #[serde(default)]
    pub original_context: Option<String>,
    #[serde(default)]
    pub extraction_confidence: Option<Confidence>,
    #[serde(default)]
    pub extraction_notes: Option<String>,
    #[serde(default)]
    pub extraction_failed: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EvidenceRelevanceResponse {
    pub is_relevant: bool,
    pub relevance_score: f32,
    #[serde(default)]
    pub verbatim_quote: Option<String>,
    #[serde(default)]
    pub relevance_explanation: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SourceClassificationResponse {
    pub source_type: SourceType,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SourceRelationResponse {
    pub relation: SourceRelation,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VerdictSynthesisResponse {
    pub relation: Relation,
    pub summary: String,
    #[serde(default)]
    pub relies_on_secondary_only: bool,
}
