//! Klaviyo REST API provider implementation.
//!
//! This module provides a [`MarketingApi`] implementation on top of the
//! Klaviyo JSON:API endpoints. Every response wraps its payload in a
//! top-level `data` member whose entries carry an `id` and an `attributes`
//! object.
//!
//! # API Usage
//!
//! - `GET /flows/?page[size]=N` for flow summaries
//! - `GET /flows/{id}/flow-actions` for the steps of a flow
//! - `GET /flow-actions/{id}/flow-messages` for the email of a step
//! - `GET /metrics/email-performance/{id}/overview` for display metrics

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{MarketingApi, ProviderError, Result};
use crate::domain::{
    ActionId, EmailPerformance, Flow, FlowAction, FlowId, FlowMessage, FlowStatus, MessageId,
};

/// Default base URL of the Klaviyo API.
pub const KLAVIYO_API_BASE: &str = "https://a.klaviyo.com/api";

/// API revision pinned by this client.
pub const KLAVIYO_REVISION: &str = "2023-10-15";

/// JSON:API response envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    data: T,
}

/// A single JSON:API resource object.
#[derive(Debug, Deserialize)]
struct Resource<A> {
    id: String,
    #[serde(default)]
    attributes: A,
}

#[derive(Debug, Default, Deserialize)]
struct FlowAttributes {
    name: Option<String>,
    status: Option<FlowStatus>,
}

#[derive(Debug, Default, Deserialize)]
struct ActionAttributes {
    action_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageAttributes {
    name: Option<String>,
    subject: Option<String>,
    content: Option<MessageContent>,
}

/// Newer revisions nest the subject under `content`.
#[derive(Debug, Default, Deserialize)]
struct MessageContent {
    subject: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MetricsData {
    #[serde(default)]
    attributes: EmailPerformance,
}

impl From<Resource<FlowAttributes>> for Flow {
    fn from(resource: Resource<FlowAttributes>) -> Self {
        Flow {
            id: FlowId::from(resource.id),
            name: resource
                .attributes
                .name
                .unwrap_or_else(|| "Unnamed Flow".to_string()),
            status: resource.attributes.status.unwrap_or(FlowStatus::Unknown),
        }
    }
}

impl From<Resource<ActionAttributes>> for FlowAction {
    fn from(resource: Resource<ActionAttributes>) -> Self {
        FlowAction {
            id: ActionId::from(resource.id),
            action_type: resource.attributes.action_type.unwrap_or_default(),
        }
    }
}

impl From<Resource<MessageAttributes>> for FlowMessage {
    fn from(resource: Resource<MessageAttributes>) -> Self {
        let attributes = resource.attributes;
        let subject = attributes
            .subject
            .or_else(|| attributes.content.and_then(|c| c.subject))
            .unwrap_or_else(|| FlowMessage::MISSING_SUBJECT.to_string());

        FlowMessage {
            id: MessageId::from(resource.id),
            subject,
            name: attributes
                .name
                .unwrap_or_else(|| FlowMessage::MISSING_NAME.to_string()),
        }
    }
}

/// Klaviyo API client.
///
/// Authenticates every request with a private API key header and pins the
/// API revision so response shapes stay stable.
///
/// # Example
///
/// ```ignore
/// use flowscope::providers::marketing::{KlaviyoClient, MarketingApi};
///
/// let client = KlaviyoClient::new("pk_live_...");
/// let flows = client.list_flows(25).await?;
/// ```
pub struct KlaviyoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    revision: String,
}

impl KlaviyoClient {
    /// Creates a client for the public Klaviyo API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: KLAVIYO_API_BASE.to_string(),
            api_key: api_key.into(),
            revision: KLAVIYO_REVISION.to_string(),
        }
    }

    /// Points the client at another base URL (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the pinned API revision.
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    /// Overrides the HTTP client (useful for custom timeouts or proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the authentication and revision headers.
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Klaviyo-API-Key {}", self.api_key))
                .map_err(|e| ProviderError::Authentication(format!("invalid API key: {}", e)))?,
        );
        headers.insert(
            HeaderName::from_static("revision"),
            HeaderValue::from_str(&self.revision)
                .map_err(|e| ProviderError::InvalidResponse(format!("invalid revision: {}", e)))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Makes an authenticated GET request and unwraps the `data` envelope.
    async fn get<T: DeserializeOwned + Default>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .headers(self.build_headers()?)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        let envelope: Envelope<T> = self.handle_response(response).await?;
        Ok(envelope.data)
    }

    /// Handles API response, checking for errors.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("parse response: {}", e)))
    }

    /// Maps a non-success response onto a [`ProviderError`].
    async fn handle_error(response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response.text().await.unwrap_or_default();

        Self::classify_status(status, retry_after_secs, body)
    }

    fn classify_status(status: u16, retry_after_secs: Option<u64>, body: String) -> ProviderError {
        match status {
            401 | 403 => ProviderError::Authentication(format!("unauthorized: {}", body)),
            404 => ProviderError::NotFound(body),
            429 => ProviderError::RateLimited { retry_after_secs },
            _ => ProviderError::Api {
                status,
                message: body,
            },
        }
    }
}

#[async_trait]
impl MarketingApi for KlaviyoClient {
    async fn list_flows(&self, page_size: u32) -> Result<Vec<Flow>> {
        let resources: Vec<Resource<FlowAttributes>> = self
            .get("/flows/", &[("page[size]", page_size.to_string())])
            .await?;
        Ok(resources.into_iter().map(Flow::from).collect())
    }

    async fn list_flow_actions(&self, flow_id: &FlowId) -> Result<Vec<FlowAction>> {
        let endpoint = format!("/flows/{}/flow-actions", flow_id);
        let resources: Vec<Resource<ActionAttributes>> = self.get(&endpoint, &[]).await?;
        Ok(resources.into_iter().map(FlowAction::from).collect())
    }

    async fn list_flow_messages(&self, action_id: &ActionId) -> Result<Vec<FlowMessage>> {
        let endpoint = format!("/flow-actions/{}/flow-messages", action_id);
        let resources: Vec<Resource<MessageAttributes>> = self.get(&endpoint, &[]).await?;
        Ok(resources.into_iter().map(FlowMessage::from).collect())
    }

    async fn email_performance(&self, message_id: &MessageId) -> Result<EmailPerformance> {
        let endpoint = format!("/metrics/email-performance/{}/overview", message_id);
        let data: MetricsData = self.get(&endpoint, &[]).await?;
        Ok(data.attributes)
    }
}
