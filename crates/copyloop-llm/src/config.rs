//! Backend configuration read from the environment.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_GENERATOR_MODEL: &str = "gpt-4";
pub const DEFAULT_JUDGE_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Model name and sampling temperature for one role.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
}

impl ModelSettings {
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
        }
    }
}

/// Endpoint, credentials and per-role model settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub generator: ModelSettings,
    pub judge: ModelSettings,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            generator: ModelSettings::new(DEFAULT_GENERATOR_MODEL, 0.7),
            judge: ModelSettings::new(DEFAULT_JUDGE_MODEL, 0.0),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LlmConfig {
    /// Read `OPENAI_API_KEY`, `COPYLOOP_BASE_URL`, `COPYLOOP_GENERATOR_MODEL`
    /// and `COPYLOOP_JUDGE_MODEL`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        config.api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());
        if let Some(url) = lookup("COPYLOOP_BASE_URL") {
            config.base_url = url;
        }
        if let Some(model) = lookup("COPYLOOP_GENERATOR_MODEL") {
            config.generator.model = model;
        }
        if let Some(model) = lookup("COPYLOOP_JUDGE_MODEL") {
            config.judge.model = model;
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_generator_model(mut self, model: impl Into<String>) -> Self {
        self.generator.model = model.into();
        self
    }

    pub fn with_judge_model(mut self, model: impl Into<String>) -> Self {
        self.judge.model = model.into();
        self
    }

    /// Full chat completions URL. A base URL that already names the
    /// endpoint is used as is.
    pub fn chat_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{base}/v1/chat/completions")
        }
    }
}
