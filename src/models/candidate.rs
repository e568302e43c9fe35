use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// An unvetted search result, consumed only by the evidence gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub url: Url,
    pub title: String,
    pub content_snippet: String,
    #[serde(default)]
    pub raw_content: Option<String>,
    pub score: f32,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Candidate {
    /// Full page text when the provider returned it, otherwise the snippet.
    pub fn source_text(&self) -> &str {
        match self.raw_content.as_deref() {
            Some(raw) if !raw.is_empty() => raw,
            _ => &self.content_snippet,
        }
    }
}
