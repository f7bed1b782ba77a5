//! Flow listing service.
//!
//! Fetches a single page of flows. Unlike the resolver this layer never
//! retries: a rate limit is just another failure here.

use std::sync::Arc;

use tracing::debug;

use crate::config::Settings;
use crate::domain::Flow;
use crate::providers::marketing::MarketingApi;

use super::reporter::{Notice, Reporter};

/// Lists flows from the marketing API.
pub struct FlowLister {
    api: Arc<dyn MarketingApi>,
    reporter: Arc<dyn Reporter>,
}

impl FlowLister {
    pub fn new(api: Arc<dyn MarketingApi>, reporter: Arc<dyn Reporter>) -> Self {
        Self { api, reporter }
    }

    /// Returns at most `page_size` flows from the first page.
    ///
    /// `page_size` is clamped into `1..=100`. Any failure yields an empty list
    /// and an error notice.
    pub async fn list_flows(&self, page_size: u32) -> Vec<Flow> {
        let page_size = Settings::clamp_page_size(page_size);

        match self.api.list_flows(page_size).await {
            Ok(mut flows) => {
                flows.truncate(page_size as usize);
                debug!(count = flows.len(), "Listed flows");
                if !flows.is_empty() {
                    self.reporter
                        .report(Notice::info(format!("Found {} flows.", flows.len())));
                }
                flows
            }
            Err(e) => {
                self.reporter
                    .report(Notice::error(format!("Error fetching flows: {}", e)));
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FlowStatus;
    use crate::providers::marketing::{MockMarketingApi, ProviderError};
    use crate::services::reporter::{CollectingReporter, Severity};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn flows(n: usize) -> Vec<Flow> {
        (0..n)
            .map(|i| Flow::new(format!("F{}", i), format!("Flow {}", i), FlowStatus::Live))
            .collect()
    }

    #[tokio::test]
    async fn returns_flows() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flows()
            .with(eq(25))
            .times(1)
            .returning(|_| Ok(flows(2)));

        let reporter = Arc::new(CollectingReporter::new());
        let lister = FlowLister::new(Arc::new(api), reporter.clone());

        let result = lister.list_flows(25).await;
        assert_eq!(result, flows(2));
        assert_eq!(
            reporter.notices(),
            vec![Notice::info("Found 2 flows.")]
        );
    }

    #[tokio::test]
    async fn truncates_oversized_pages() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flows().returning(|_| Ok(flows(10)));

        let lister = FlowLister::new(Arc::new(api), Arc::new(CollectingReporter::new()));
        assert_eq!(lister.list_flows(3).await.len(), 3);
    }

    #[tokio::test]
    async fn clamps_page_size() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flows()
            .with(eq(100))
            .times(1)
            .returning(|_| Ok(Vec::new()));
        api.expect_list_flows()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let lister = FlowLister::new(Arc::new(api), Arc::new(CollectingReporter::new()));
        lister.list_flows(500).await;
        lister.list_flows(0).await;
    }

    #[tokio::test]
    async fn empty_page_reports_nothing() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flows().returning(|_| Ok(Vec::new()));

        let reporter = Arc::new(CollectingReporter::new());
        let lister = FlowLister::new(Arc::new(api), reporter.clone());

        assert!(lister.list_flows(25).await.is_empty());
        assert!(reporter.notices().is_empty());
    }

    #[tokio::test]
    async fn error_yields_empty_list() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flows()
            .times(1)
            .returning(|_| Err(ProviderError::Connection("refused".to_string())));

        let reporter = Arc::new(CollectingReporter::new());
        let lister = FlowLister::new(Arc::new(api), reporter.clone());

        assert!(lister.list_flows(25).await.is_empty());
        assert_eq!(reporter.count(Severity::Error), 1);
        assert!(reporter.notices()[0].message.starts_with("Error fetching flows"));
    }

    #[tokio::test]
    async fn rate_limit_is_not_retried() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flows().times(1).returning(|_| {
            Err(ProviderError::RateLimited {
                retry_after_secs: None,
            })
        });

        let reporter = Arc::new(CollectingReporter::new());
        let lister = FlowLister::new(Arc::new(api), reporter.clone());

        assert!(lister.list_flows(25).await.is_empty());
        assert_eq!(reporter.count(Severity::Error), 1);
    }
}
