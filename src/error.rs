use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("input text too short: {len} characters (minimum {min})")]
    TooShort { len: usize, min: usize },

    #[error("input text too long: {len} characters (maximum {max})")]
    TooLong { len: usize, max: usize },
}

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("completion transport error: {0}")]
    Transport(#[from] async_openai::error::OpenAIError),

    #[error("completion service returned no content")]
    EmptyResponse,

    #[error("completion response is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("completion response does not match schema {schema}: {source}")]
    SchemaMismatch {
        schema: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("completion response rejected: {0}")]
    Invalid(String),

    #[error("completion service error: {0}")]
    Service(String),

    #[error("cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search provider error: {0}")]
    Provider(String),

    #[error("cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
