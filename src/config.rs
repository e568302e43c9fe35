use crate::error::ConfigError;
use crate::pipeline::traits::SearchDepth;
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_MODEL: &str = "gpt-5-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_MAX_RESULTS: u32 = 10;
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 120;

#[derive(Clone, Debug)]
pub struct Settings {
    pub openai_api_key: String,
    pub tavily_api_key: String,
    pub openai_model: String,
    pub openai_api_base: Option<String>,
    pub openai_temperature: Option<f32>,
    pub openai_max_tokens: u32,
    pub tavily_max_results: u32,
    pub tavily_search_depth: SearchDepth,
    pub max_concurrency: usize,
    pub run_timeout_secs: u64,
    pub log_level: String,
}

pub fn valid_api_key(key: &str) -> bool {
    let trimmed = key.trim();
    !trimmed.is_empty() && !trimmed.contains("...")
}

impl Settings {
    /// Reads settings from the process environment, after loading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| map.get(key).cloned())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = required_key(&lookup, "OPENAI_API_KEY")?;
        let tavily_api_key = required_key(&lookup, "TAVILY_API_KEY")?;

        let openai_model = lookup("OPENAI_MODEL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let openai_api_base = lookup("OPENAI_API_BASE").filter(|v| !v.trim().is_empty());
        let openai_temperature = parse_optional::<f32, _>(&lookup, "OPENAI_TEMPERATURE")?;
        let openai_max_tokens =
            parse_optional(&lookup, "OPENAI_MAX_TOKENS")?.unwrap_or(DEFAULT_MAX_TOKENS);
        let tavily_max_results =
            parse_optional(&lookup, "TAVILY_MAX_RESULTS")?.unwrap_or(DEFAULT_MAX_RESULTS);

        let tavily_search_depth = match lookup("TAVILY_SEARCH_DEPTH") {
            None => SearchDepth::Advanced,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "basic" => SearchDepth::Basic,
                "advanced" => SearchDepth::Advanced,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "TAVILY_SEARCH_DEPTH",
                        value: raw,
                    })
                }
            },
        };

        let max_concurrency: usize =
            parse_optional(&lookup, "CHASE_MAX_CONCURRENCY")?.unwrap_or(DEFAULT_MAX_CONCURRENCY);
        if max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "CHASE_MAX_CONCURRENCY",
                value: "0".to_string(),
            });
        }
        let run_timeout_secs =
            parse_optional(&lookup, "CHASE_RUN_TIMEOUT_SECS")?.unwrap_or(DEFAULT_RUN_TIMEOUT_SECS);

        let log_level = lookup("LOG_LEVEL")
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "info".to_string());

        Ok(Self {
            openai_api_key,
            tavily_api_key,
            openai_model,
            openai_api_base,
            openai_temperature,
            openai_max_tokens,
            tavily_max_results,
            tavily_search_depth,
            max_concurrency,
            run_timeout_secs,
            log_level,
        })
    }

    /// `RUST_LOG` wins when set and valid; otherwise `LOG_LEVEL`, then `info`.
    pub fn log_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| self.fallback_log_filter())
    }

    fn fallback_log_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn required_key<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if valid_api_key(&value) => Ok(value.trim().to_string()),
        Some(value) if !value.trim().is_empty() => Err(ConfigError::Invalid { key, value }),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn parse_optional<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
