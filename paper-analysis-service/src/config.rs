use std::time::Duration;
use tracing::warn;

use crate::clients::arxiv::DEFAULT_ARXIV_API_URL;
use crate::error::ServiceError;

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_PORT: u16 = 3000;

/// Service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openrouter_api_key: String,
    pub llm_model: String,
    pub tavily_api_key: Option<String>,
    pub winston_api_key: Option<String>,
    pub arxiv_api_url: String,
    pub call_timeout: Duration,
    pub citation_concurrency: usize,
    pub port: u16,
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openrouter_api_key = non_empty("OPENROUTER_API_KEY").ok_or_else(|| {
            ServiceError::Config("OPENROUTER_API_KEY environment variable not set".to_string())
        })?;

        let timeout_secs = parse_or_default(
            "EXTERNAL_CALL_TIMEOUT_SECS",
            non_empty("EXTERNAL_CALL_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        );
        let citation_concurrency = parse_or_default(
            "CITATION_CONCURRENCY",
            non_empty("CITATION_CONCURRENCY"),
            DEFAULT_CONCURRENCY,
        )
        .max(1);

        Ok(Self {
            openrouter_api_key,
            llm_model: non_empty("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            tavily_api_key: non_empty("TAVILY_API_KEY"),
            winston_api_key: non_empty("WINSTON_API_KEY"),
            arxiv_api_url: non_empty("ARXIV_API_URL")
                .unwrap_or_else(|| DEFAULT_ARXIV_API_URL.to_string()),
            call_timeout: Duration::from_secs(timeout_secs.max(1)),
            citation_concurrency,
            port: parse_or_default("PORT", non_empty("PORT"), DEFAULT_PORT),
        })
    }
}

fn parse_or_default<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match value {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, %default, "Invalid numeric setting, using default");
            default
        }),
    }
}
