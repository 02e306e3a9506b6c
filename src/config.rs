use std::env;
use std::time::Duration;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_TAVILY_API_URL: &str = "https://api.tavily.com/search";
const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Outbound calls are bounded so a hung upstream cannot pin a request forever.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub claude_api_url: String,
    pub tavily_api_url: String,
    pub gemini_api_url: String,
    pub gemini_model: String,
    /// Absence disables the model-backed intent strategy entirely; the
    /// rule-based extractor then handles every query.
    pub gemini_api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            claude_api_url: DEFAULT_CLAUDE_API_URL.to_string(),
            tavily_api_url: DEFAULT_TAVILY_API_URL.to_string(),
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_key: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            claude_api_url: env::var("CLAUDE_API_URL").unwrap_or(defaults.claude_api_url),
            tavily_api_url: env::var("TAVILY_API_URL").unwrap_or(defaults.tavily_api_url),
            gemini_api_url: env::var("GEMINI_API_URL").unwrap_or(defaults.gemini_api_url),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
        }
    }

    pub fn model_strategy_enabled(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}
