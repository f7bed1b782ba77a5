//! Domain layer types for flowscope.
//!
//! Flows, their actions and messages as fetched from the marketing API, the
//! derived email steps, and the subject line assessments attached to them.

mod assessment;
mod flow;
mod metrics;
mod types;

pub use assessment::{
    AssessmentParseError, SubjectAssessment, FALLBACK_SUGGESTION, FALLBACK_TEXT, MAX_SCORE,
    MIN_SCORE,
};
pub use flow::{EmailStep, Flow, FlowAction, FlowMessage, FlowStatus};
pub use metrics::{EmailPerformance, MetricValue};
pub use types::{ActionId, FlowId, MessageId};
