use anyhow::{Context, Result};

const DEFAULT_LLM_BASE_URL: &str = "https://api.siliconflow.cn/v1";
const DEFAULT_LLM_MODEL: &str = "deepseek-ai/DeepSeek-V2.5";

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a numeric one does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub default_question_count: usize,
    pub event_channel_capacity: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let with_default =
            |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            llm_api_key: get("LLM_API_KEY").with_context(|| {
                "Required environment variable 'LLM_API_KEY' is not set".to_string()
            })?,
            llm_base_url: with_default("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
            llm_model: with_default("LLM_MODEL", DEFAULT_LLM_MODEL),
            llm_timeout_secs: with_default("LLM_TIMEOUT_SECS", "30")
                .parse()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            default_question_count: with_default("DEFAULT_QUESTION_COUNT", "5")
                .parse()
                .context("DEFAULT_QUESTION_COUNT must be a positive integer")?,
            event_channel_capacity: with_default("EVENT_CHANNEL_CAPACITY", "64")
                .parse()
                .context("EVENT_CHANNEL_CAPACITY must be a positive integer")?,
            port: with_default("PORT", "8000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: with_default("RUST_LOG", "info"),
        })
    }
}

#[cfg(test)]
impl Config {
    /// Configuration for in-process tests; never read from the environment.
    pub fn for_tests() -> Self {
        Config {
            llm_api_key: "test-key".to_string(),
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_timeout_secs: 30,
            default_question_count: 5,
            event_channel_capacity: 16,
            port: 0,
            rust_log: "info".to_string(),
        }
    }
}
