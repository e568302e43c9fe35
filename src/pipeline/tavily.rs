use crate::config::Settings;
use crate::error::SearchError;
use crate::pipeline::traits::{SearchDepth, SearchHit, SearchProvider, SearchQuery};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

pub struct TavilySearch {
    client: Client,
    api_key: String,
    endpoint: Url,
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: SearchDepth,
    max_results: u32,
    include_raw_content: bool,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

/// Decodes hits one at a time so a single malformed entry is skipped instead
/// of failing the whole reply.
fn decode_hits(results: Vec<serde_json::Value>) -> Vec<SearchHit> {
    results
        .into_iter()
        .enumerate()
        .filter_map(|(i, raw)| match serde_json::from_value::<SearchHit>(raw) {
            Ok(hit) => Some(hit),
            Err(e) => {
                tracing::warn!(index = i, error = %e, "skipping undecodable search result");
                None
            }
        })
        .collect()
}

impl TavilySearch {
    pub fn new(api_key: &str) -> Result<Self, SearchError> {
        let client = Client::builder()
            .user_agent(concat!("chase-source/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()?;
        let endpoint = Url::parse(TAVILY_ENDPOINT)
            .map_err(|e| SearchError::Provider(format!("bad endpoint: {e}")))?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            endpoint,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, SearchError> {
        Self::new(&settings.tavily_api_key)
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, SearchError> {
        let body = TavilyRequest {
            query: &query.text,
            search_depth: query.depth,
            max_results: query.max_results,
            include_raw_content: true,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: TavilyResponse = response.json().await?;
        Ok(decode_hits(parsed.results))
    }
}
