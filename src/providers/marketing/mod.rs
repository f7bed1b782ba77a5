//! Marketing API providers.
//!
//! This module contains the [`MarketingApi`] trait and its Klaviyo
//! implementation:
//!
//! - [`KlaviyoClient`] - Klaviyo JSON:API over HTTPS with a private API key
//!
//! # Example
//!
//! ```ignore
//! use flowscope::providers::marketing::{KlaviyoClient, MarketingApi};
//!
//! async fn print_flows(api: &dyn MarketingApi) {
//!     for flow in api.list_flows(25).await.unwrap_or_default() {
//!         println!("{} [{}]", flow.name, flow.status);
//!     }
//! }
//! ```

mod klaviyo;
mod traits;

pub use klaviyo::{KlaviyoClient, KLAVIYO_API_BASE, KLAVIYO_REVISION};
#[cfg(test)]
pub use traits::MockMarketingApi;
pub use traits::{MarketingApi, ProviderError, Result};
