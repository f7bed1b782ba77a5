//! Dashboard orchestration.
//!
//! Lists flows, resolves each flow's email steps, then fetches metrics and a
//! subject evaluation for every email. Everything runs sequentially: one
//! flow at a time, one email at a time.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Settings;
use crate::domain::{EmailPerformance, EmailStep, Flow, MessageId};
use crate::providers::generation::TextGenerator;
use crate::providers::marketing::MarketingApi;

use super::flow_lister::FlowLister;
use super::reporter::{CollectingReporter, Notice, Reporter, Severity};
use super::resolver::{ActionFilter, EmailResolver};
use super::subject_evaluator::{Evaluation, SubjectEvaluator};

/// One email step with its metrics and subject evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailReport {
    #[serde(flatten)]
    pub step: EmailStep,
    /// Omitted when the metrics lookup failed or returned nothing.
    pub performance: Option<EmailPerformance>,
    pub evaluation: Evaluation,
}

/// What happened to a flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowOutcome {
    Emails { emails: Vec<EmailReport> },
    NoEmails,
    /// Resolution took longer than the flow budget.
    Skipped { elapsed_ms: u64 },
}

/// Result of processing one flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowReport {
    pub flow: Flow,
    pub elapsed_ms: u64,
    pub outcome: FlowOutcome,
    /// Notices raised while processing this flow.
    pub notices: Vec<Notice>,
}

impl FlowReport {
    pub fn emails(&self) -> &[EmailReport] {
        match &self.outcome {
            FlowOutcome::Emails { emails } => emails,
            _ => &[],
        }
    }
}

/// Result of a full dashboard refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub page_size: u32,
    pub generation_enabled: bool,
    pub flows: Vec<FlowReport>,
    /// Notices not tied to a single flow.
    pub notices: Vec<Notice>,
}

impl DashboardReport {
    /// Total number of email steps across all flows.
    pub fn email_count(&self) -> usize {
        self.flows.iter().map(|f| f.emails().len()).sum()
    }

    /// Whether any notice, global or per flow, is an error.
    pub fn has_errors(&self) -> bool {
        self.notices
            .iter()
            .chain(self.flows.iter().flat_map(|f| f.notices.iter()))
            .any(|n| n.severity == Severity::Error)
    }
}

/// Runs the lister, resolver and evaluator for one refresh.
pub struct Dashboard {
    api: Arc<dyn MarketingApi>,
    lister: FlowLister,
    resolver: EmailResolver,
    evaluator: SubjectEvaluator,
    notices: Arc<CollectingReporter>,
}

impl Dashboard {
    /// Wires up the components from settings.
    ///
    /// `generator` is `None` when generation is unavailable; every evaluation
    /// then uses the fallback.
    pub fn new(
        api: Arc<dyn MarketingApi>,
        generator: Option<Arc<dyn TextGenerator>>,
        settings: &Settings,
    ) -> Self {
        let notices = Arc::new(CollectingReporter::new());
        let reporter: Arc<dyn Reporter> = notices.clone();

        Self {
            lister: FlowLister::new(api.clone(), reporter.clone()),
            resolver: EmailResolver::new(api.clone(), reporter.clone(), settings.resolver.clone()),
            evaluator: SubjectEvaluator::new(
                generator,
                reporter,
                &settings.generation,
                &settings.cache,
            ),
            api,
            notices,
        }
    }

    /// Replaces the resolver's action filter.
    pub fn with_action_filter(mut self, filter: impl ActionFilter + 'static) -> Self {
        self.resolver = self.resolver.with_filter(filter);
        self
    }

    pub async fn run(&self, page_size: u32, use_generation: bool) -> DashboardReport {
        self.run_with_progress(page_size, use_generation, |_, _| {})
            .await
    }

    /// Runs a refresh, calling `on_progress(done, total)` after each flow.
    pub async fn run_with_progress<P>(
        &self,
        page_size: u32,
        use_generation: bool,
        mut on_progress: P,
    ) -> DashboardReport
    where
        P: FnMut(usize, usize),
    {
        let page_size = Settings::clamp_page_size(page_size);
        let flows = self.lister.list_flows(page_size).await;
        let notices = self.notices.drain();
        let total = flows.len();

        let mut reports = Vec::with_capacity(total);
        for (i, flow) in flows.into_iter().enumerate() {
            reports.push(self.process_flow(flow, use_generation).await);
            info!(done = i + 1, total, "Processed flow");
            on_progress(i + 1, total);
        }

        DashboardReport {
            generated_at: Utc::now(),
            page_size,
            generation_enabled: use_generation && self.evaluator.has_generator(),
            flows: reports,
            notices,
        }
    }

    async fn process_flow(&self, flow: Flow, use_generation: bool) -> FlowReport {
        let started = Instant::now();
        let steps = self.resolver.resolve(&flow.id).await;
        let elapsed = started.elapsed();
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        let outcome = if elapsed > self.resolver.settings().flow_budget {
            self.notices.report(Notice::warning(format!(
                "Skipped flow `{}`, took too long ({:.1}s).",
                flow.name,
                elapsed.as_secs_f64()
            )));
            FlowOutcome::Skipped { elapsed_ms }
        } else if steps.is_empty() {
            debug!(flow_id = %flow.id, "No email steps");
            FlowOutcome::NoEmails
        } else {
            let mut emails = Vec::with_capacity(steps.len());
            for step in steps {
                let performance = self.performance(&step.message_id).await;
                let evaluation = self.evaluator.evaluate(&step.subject, use_generation).await;
                emails.push(EmailReport {
                    step,
                    performance,
                    evaluation,
                });
            }
            FlowOutcome::Emails { emails }
        };

        FlowReport {
            flow,
            elapsed_ms,
            outcome,
            notices: self.notices.drain(),
        }
    }

    async fn performance(&self, message_id: &MessageId) -> Option<EmailPerformance> {
        match self.api.email_performance(message_id).await {
            Ok(performance) if performance.is_empty() => None,
            Ok(performance) => Some(performance),
            Err(e) => {
                self.notices.report(Notice::warning(format!(
                    "Failed to fetch analytics for message {}: {}",
                    message_id, e
                )));
                None
            }
        }
    }
}
