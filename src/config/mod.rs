//! Configuration and settings management.
//!
//! This module provides the application settings types. Settings are built
//! from the environment once and handed to each component explicitly.

mod settings;

pub use settings::{
    CacheSettings, ConfigError, GenerationSettings, MarketingSettings, ResolverSettings,
    Settings, GENERATION_KEY_VAR, MARKETING_KEY_VAR, MAX_PAGE_SIZE, MIN_PAGE_SIZE,
};
