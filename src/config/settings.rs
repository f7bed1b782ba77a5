//! Application settings and configuration types.
//!
//! Settings are assembled once at startup, from the process environment
//! (see [`Settings::from_env`]) plus command line overrides, and then passed
//! by reference into every component.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::providers::generation::OPENAI_BASE_URL;
use crate::providers::marketing::{KLAVIYO_API_BASE, KLAVIYO_REVISION};

/// Environment variable holding the marketing API key.
pub const MARKETING_KEY_VAR: &str = "KLAVIYO_API_KEY";
/// Environment variable holding the generation API key.
pub const GENERATION_KEY_VAR: &str = "OPENAI_API_KEY";

/// Smallest accepted flow page size.
pub const MIN_PAGE_SIZE: u32 = 1;
/// Largest accepted flow page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Top-level application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Marketing API access.
    pub marketing: MarketingSettings,
    /// Subject line generation backend.
    pub generation: GenerationSettings,
    /// Flow resolution retry and pacing.
    pub resolver: ResolverSettings,
    /// Subject evaluation cache.
    pub cache: CacheSettings,
}

/// Marketing API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketingSettings {
    /// Private API key. Required at startup.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL.
    pub base_url: String,
    /// Pinned API revision header.
    pub revision: String,
    /// How many flows one listing fetches.
    pub page_size: u32,
}

impl Default for MarketingSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: KLAVIYO_API_BASE.to_string(),
            revision: KLAVIYO_REVISION.to_string(),
            page_size: 25,
        }
    }
}

/// Text-generation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Whether generation was requested. Without a key it is off regardless.
    pub enabled: bool,
    /// API key. Absence degrades to fallback mode.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Chat completions base URL.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Cap on generated tokens per evaluation, backend default when unset.
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: OPENAI_BASE_URL.to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.6,
            max_tokens: None,
        }
    }
}

impl GenerationSettings {
    /// Generation runs only when requested and a key is present.
    pub fn is_active(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Retry and pacing knobs for the flow email resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Total attempts for the flow-actions fetch.
    pub max_retries: u32,
    /// Total attempts for each action's message fetch.
    pub message_attempts: u32,
    /// First backoff delay; doubles per attempt.
    pub backoff_base: Duration,
    /// Pause after each resolved email step.
    pub politeness_delay: Duration,
    /// Soft wall-clock budget per flow, checked after resolution.
    pub flow_budget: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            message_attempts: 3,
            backoff_base: Duration::from_secs(1),
            politeness_delay: Duration::from_millis(250),
            flow_budget: Duration::from_secs(15),
        }
    }
}

impl ResolverSettings {
    /// Settings with every delay set to zero, for tests.
    pub fn without_delays() -> Self {
        Self {
            backoff_base: Duration::ZERO,
            politeness_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Subject evaluation memo configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Maximum number of distinct subject lines remembered.
    pub capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_raw_values(
            std::env::var(MARKETING_KEY_VAR).ok().as_deref(),
            std::env::var(GENERATION_KEY_VAR).ok().as_deref(),
            std::env::var("KLAVIYO_BASE_URL").ok().as_deref(),
            std::env::var("OPENAI_BASE_URL").ok().as_deref(),
            std::env::var("OPENAI_MODEL").ok().as_deref(),
        )
    }

    /// Builds settings from raw string values (as they would come from env vars).
    /// Used directly in tests to avoid mutating process-global environment.
    pub fn from_raw_values(
        marketing_key: Option<&str>,
        generation_key: Option<&str>,
        marketing_base_url: Option<&str>,
        generation_base_url: Option<&str>,
        model: Option<&str>,
    ) -> Self {
        let non_empty = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(String::from);

        let mut settings = Settings::default();
        settings.marketing.api_key = non_empty(marketing_key);
        settings.generation.api_key = non_empty(generation_key);
        if let Some(url) = non_empty(marketing_base_url) {
            settings.marketing.base_url = url;
        }
        if let Some(url) = non_empty(generation_base_url) {
            settings.generation.base_url = url;
        }
        if let Some(model) = non_empty(model) {
            settings.generation.model = model;
        }
        settings
    }

    /// Clamps a requested page size into the accepted range.
    pub fn clamp_page_size(page_size: u32) -> u32 {
        page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    /// Checks that the settings can start the application.
    ///
    /// A missing marketing key is fatal; a missing generation key is not.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marketing.api_key.is_none() {
            return Err(ConfigError::MissingRequired {
                key: MARKETING_KEY_VAR.to_string(),
                hint: format!("export {}=pk_...", MARKETING_KEY_VAR),
            });
        }

        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.marketing.page_size) {
            return Err(ConfigError::InvalidValue {
                key: "page_size".to_string(),
                message: format!(
                    "{} is outside {}..={}",
                    self.marketing.page_size, MIN_PAGE_SIZE, MAX_PAGE_SIZE
                ),
            });
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::InvalidValue {
                key: "temperature".to_string(),
                message: format!("{} is outside 0.0..=2.0", self.generation.temperature),
            });
        }

        if self.cache.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "cache.capacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
