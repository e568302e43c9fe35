use crate::error::{CompletionError, SearchError};
use async_trait::async_trait;
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// Name of the response schema, also used by mocks to route requests.
    pub schema_name: String,
    pub schema: serde_json::Value,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn for_schema<T: JsonSchema>(system: &str, user: String, max_tokens: Option<u32>) -> Self {
        let generator = SchemaSettings::draft07()
            .with(|s| {
                s.inline_subschemas = true;
                s.meta_schema = None;
            })
            .into_generator();
        let root = generator.into_root_schema_for::<T>();
        Self {
            system: system.to_string(),
            user,
            schema_name: T::schema_name(),
            schema: serde_json::to_value(&root).unwrap_or(serde_json::Value::Null),
            max_tokens,
        }
    }
}

/// A structured-completion backend. Implementations return the JSON object the
/// model produced; typed decoding happens in [`complete_structured`].
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<serde_json::Value, CompletionError>;
}

/// Sends a schema-bearing request and decodes the reply into `T`. Any shape
/// mismatch is reported as [`CompletionError::SchemaMismatch`].
pub async fn complete_structured<T, C>(
    service: &C,
    system: &str,
    user: String,
    max_tokens: Option<u32>,
) -> Result<T, CompletionError>
where
    T: DeserializeOwned + JsonSchema,
    C: CompletionService + ?Sized,
{
    let request = CompletionRequest::for_schema::<T>(system, user, max_tokens);
    let schema = request.schema_name.clone();
    let value = service.complete(request).await?;
    serde_json::from_value(value).map_err(|source| CompletionError::SchemaMismatch { schema, source })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    Advanced,
}

#[derive(Clone, Debug)]
pub struct SearchQuery {
    pub text: String,
    pub max_results: u32,
    pub depth: SearchDepth,
}

/// A search result as the provider reported it, before validation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub raw_content: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub published_date: Option<String>,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, SearchError>;
}
