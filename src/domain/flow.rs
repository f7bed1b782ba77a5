//! Flow domain types.
//!
//! A flow is an ordered sequence of actions; the ones that send email carry
//! a message whose subject line is what the dashboard evaluates.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ActionId, FlowId, MessageId};

/// Lifecycle status of a flow as reported by the marketing API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStatus {
    /// Flow is running and sending.
    Live,
    /// Flow is being edited and does not send.
    Draft,
    /// Flow requires manual review before each send.
    Manual,
    /// Flow has been archived.
    Archived,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlowStatus::Live => "live",
            FlowStatus::Draft => "draft",
            FlowStatus::Manual => "manual",
            FlowStatus::Archived => "archived",
            FlowStatus::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Summary of a flow returned by a listing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    pub id: FlowId,
    pub name: String,
    pub status: FlowStatus,
}

impl Flow {
    pub fn new(id: impl Into<FlowId>, name: impl Into<String>, status: FlowStatus) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
        }
    }
}

/// One step of a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowAction {
    pub id: ActionId,
    /// Upstream action type, e.g. `SEND_EMAIL`, `TIME_DELAY`.
    pub action_type: String,
}

impl FlowAction {
    pub fn new(id: impl Into<ActionId>, action_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action_type: action_type.into(),
        }
    }
}

/// Email content attached to a send action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowMessage {
    pub id: MessageId,
    pub subject: String,
    pub name: String,
}

impl FlowMessage {
    /// Placeholder used when the upstream message has no subject.
    pub const MISSING_SUBJECT: &'static str = "No subject";
    /// Placeholder used when the upstream message has no name.
    pub const MISSING_NAME: &'static str = "Unnamed Email";

    pub fn new(
        id: impl Into<MessageId>,
        subject: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            name: name.into(),
        }
    }
}

/// An email-sending step of a flow, joined with its canonical message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailStep {
    pub name: String,
    pub subject: String,
    pub action_id: ActionId,
    pub message_id: MessageId,
}

impl EmailStep {
    /// Joins an action with the first message the API returned for it.
    pub fn from_parts(action: &FlowAction, message: FlowMessage) -> Self {
        Self {
            name: message.name,
            subject: message.subject,
            action_id: action.id.clone(),
            message_id: message.id,
        }
    }
}
