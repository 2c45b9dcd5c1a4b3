//! Suggestion service configuration.

/// Default OpenAI-compatible API base.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default completion model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Default completion length cap.
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Connection settings for the suggestion service.
///
/// The credential is always supplied from outside (environment, CLI);
/// without one the advisor degrades to never suggesting.
#[derive(Clone)]
pub struct AdvisorConfig {
    /// Bearer credential for the service.
    pub api_key: Option<String>,
    /// API base URL; `/chat/completions` is appended when missing.
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// Completion length cap.
    pub max_tokens: u32,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl AdvisorConfig {
    /// Create a configuration with a credential and defaults for the rest.
    #[must_use]
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Read configuration from environment variables or defaults.
    ///
    /// Environment variables:
    /// - `LAYOUT_ADVISOR_API_KEY` or `OPENAI_API_KEY`: credential (default: none)
    /// - `LAYOUT_ADVISOR_URL`: API base (default: `https://api.openai.com/v1`)
    /// - `LAYOUT_ADVISOR_MODEL`: model name (default: `gpt-3.5-turbo`)
    /// - `LAYOUT_ADVISOR_MAX_TOKENS`: completion cap (default: 500)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`AdvisorConfig::from_env`] but reading through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty("LAYOUT_ADVISOR_API_KEY").or_else(|| non_empty("OPENAI_API_KEY"));
        let base_url = non_empty("LAYOUT_ADVISOR_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let model = non_empty("LAYOUT_ADVISOR_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into());
        let max_tokens = non_empty("LAYOUT_ADVISOR_MAX_TOKENS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        Self {
            api_key,
            base_url,
            model,
            max_tokens,
        }
    }

    /// Whether a credential is present.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

impl std::fmt::Debug for AdvisorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
