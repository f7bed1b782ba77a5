//! User-visible notices.
//!
//! Services never surface provider errors to their callers; they degrade to
//! an empty or fallback result and describe what happened through a
//! [`Reporter`]. The dashboard collects these notices and renders them next
//! to the flows they belong to.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational, nothing went wrong.
    Info,
    /// Something degraded but the operation continued.
    Warning,
    /// The operation gave up for its scope.
    Error,
}

/// A single user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Sink for user-visible notices.
pub trait Reporter: Send + Sync {
    fn report(&self, notice: Notice);
}

fn log_notice(notice: &Notice) {
    match notice.severity {
        Severity::Info => tracing::info!("{}", notice.message),
        Severity::Warning => tracing::warn!("{}", notice.message),
        Severity::Error => tracing::error!("{}", notice.message),
    }
}

/// Reporter that only writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, notice: Notice) {
        log_notice(&notice);
    }
}

/// Reporter that logs notices and keeps them for later display.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every notice reported so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|notices| notices.clone())
            .unwrap_or_default()
    }

    /// Removes and returns every notice reported so far.
    pub fn drain(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .map(|mut notices| std::mem::take(&mut *notices))
            .unwrap_or_default()
    }

    /// Number of notices with exactly the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.notices
            .lock()
            .map(|notices| notices.iter().filter(|n| n.severity == severity).count())
            .unwrap_or(0)
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, notice: Notice) {
        log_notice(&notice);
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}
