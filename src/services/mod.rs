//! Business services layer.
//!
//! This module contains the components that turn raw marketing API calls
//! into a dashboard: flow listing, flow email resolution with rate-limit
//! retries, and subject line evaluation.
//!
//! # Architecture
//!
//! Services sit between the application layer and the providers:
//!
//! ```text
//! Application Layer (CLI, rendering)
//!          |
//!          v
//!    Services Layer  <-- You are here
//!          |
//!          v
//! Providers (marketing API, text generation)
//! ```
//!
//! # Services Overview
//!
//! - [`FlowLister`]: Fetches one page of flows, no retry
//! - [`EmailResolver`]: Walks flow → actions → messages with bounded backoff
//! - [`SubjectEvaluator`]: Rates subject lines, with a static fallback
//! - [`Dashboard`]: Runs the three in sequence for one refresh
//!
//! Failures never cross this layer as errors. They become [`Notice`]s sent to
//! a [`Reporter`], and the affected scope yields an empty or fallback result.

mod dashboard;
mod flow_lister;
mod reporter;
mod resolver;
mod retry;
mod subject_evaluator;

pub use dashboard::{Dashboard, DashboardReport, EmailReport, FlowOutcome, FlowReport};
pub use flow_lister::FlowLister;
pub use reporter::{CollectingReporter, Notice, Reporter, Severity, TracingReporter};
pub use resolver::{ActionFilter, ActionTypeFilter, EmailResolver, SEND_EMAIL};
pub use retry::{retry_on_rate_limit, Backoff, RetryOutcome};
pub use subject_evaluator::{build_prompt, Evaluation, Origin, SubjectEvaluator};
