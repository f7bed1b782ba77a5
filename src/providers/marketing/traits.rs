//! Marketing API trait definition.
//!
//! This module defines the [`MarketingApi`] trait which abstracts over the
//! upstream marketing automation service. The services layer only talks to
//! this trait, so every component can be exercised against a fake.

use async_trait::async_trait;

use crate::domain::{ActionId, EmailPerformance, Flow, FlowAction, FlowId, FlowMessage, MessageId};

/// Result type alias for marketing API operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur while talking to the marketing API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// API key rejected.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network or connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Rate limit exceeded (HTTP 429).
    #[error("rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, if the server said so.
        retry_after_secs: Option<u64>,
    },

    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether this error is the upstream asking us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}

/// Read access to marketing automation flows.
///
/// All list responses are a single page; implementations do not follow
/// pagination cursors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketingApi: Send + Sync {
    /// Lists up to `page_size` flows.
    async fn list_flows(&self, page_size: u32) -> Result<Vec<Flow>>;

    /// Lists the actions (steps) of a flow.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::RateLimited`] when the upstream answers 429.
    async fn list_flow_actions(&self, flow_id: &FlowId) -> Result<Vec<FlowAction>>;

    /// Lists the messages attached to a flow action.
    async fn list_flow_messages(&self, action_id: &ActionId) -> Result<Vec<FlowMessage>>;

    /// Fetches display-only performance metrics for a message.
    async fn email_performance(&self, message_id: &MessageId) -> Result<EmailPerformance>;
}
