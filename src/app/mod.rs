//! Application wiring and lifecycle.
//!
//! Builds the HTTP clients from [`Settings`] and hands them to the
//! [`Dashboard`]. Rendering lives in [`render`].

pub mod render;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::providers::generation::{ChatCompletionsClient, TextGenerator};
use crate::providers::marketing::{KlaviyoClient, MarketingApi};
use crate::services::{Dashboard, DashboardReport};

/// Main application entry point.
pub struct App {
    settings: Settings,
    dashboard: Dashboard,
}

impl App {
    /// Validates `settings` and builds the provider clients.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;

        let api_key = settings
            .marketing
            .api_key
            .clone()
            .context("marketing API key missing")?;
        let marketing: Arc<dyn MarketingApi> = Arc::new(
            KlaviyoClient::new(api_key)
                .with_base_url(&settings.marketing.base_url)
                .with_revision(&settings.marketing.revision)
                .with_client(http.clone()),
        );

        let generator: Option<Arc<dyn TextGenerator>> = if settings.generation.is_active() {
            let client = ChatCompletionsClient::new(
                &settings.generation.base_url,
                settings.generation.api_key.clone(),
                &settings.generation.model,
            )
            .with_client(http);
            tracing::info!(
                backend = client.backend(),
                model = %client.model(),
                base_url = %settings.generation.base_url,
                "Subject evaluation enabled"
            );
            Some(Arc::new(client) as Arc<dyn TextGenerator>)
        } else {
            if settings.generation.enabled {
                tracing::warn!("No generation API key set, subject evaluation uses fallback mode");
            }
            None
        };

        let dashboard = Dashboard::new(marketing, generator, &settings);

        Ok(Self {
            settings,
            dashboard,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs one dashboard refresh with the configured page size.
    pub async fn run(&self) -> DashboardReport {
        let use_generation = self.settings.generation.is_active();
        tracing::info!(
            page_size = self.settings.marketing.page_size,
            use_generation,
            "Fetching flows"
        );

        self.dashboard
            .run_with_progress(
                self.settings.marketing.page_size,
                use_generation,
                |done, total| tracing::debug!("Processed {}/{} flows", done, total),
            )
            .await
    }
}
