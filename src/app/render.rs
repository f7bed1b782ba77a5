//! Plain text rendering of a dashboard report.

use std::fmt;

use crate::domain::EmailPerformance;
use crate::services::{DashboardReport, EmailReport, FlowOutcome, FlowReport, Notice, Severity};

const RULE: &str = "----------------------------------------";

/// Renders the report for a terminal.
pub fn render_text(report: &DashboardReport) -> String {
    TextReport(report).to_string()
}

/// Terminal view of a [`DashboardReport`].
struct TextReport<'a>(&'a DashboardReport);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(
            f,
            "Flows fetched {} | {} flow(s), {} email(s) | AI feedback {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.flows.len(),
            report.email_count(),
            if report.generation_enabled { "on" } else { "off (fallback)" },
        )?;

        for notice in &report.notices {
            write_notice(f, notice, "")?;
        }

        if report.flows.is_empty() {
            writeln!(f, "\nNo flows found.")?;
        }

        for flow in &report.flows {
            write_flow(f, flow)?;
        }

        Ok(())
    }
}

fn write_flow(f: &mut fmt::Formatter<'_>, flow: &FlowReport) -> fmt::Result {
    writeln!(f, "\n== {} [{}] ==", flow.flow.name, flow.flow.status)?;

    for notice in &flow.notices {
        write_notice(f, notice, "  ")?;
    }

    match &flow.outcome {
        FlowOutcome::Emails { emails } => {
            for email in emails {
                write_email(f, email)?;
            }
            Ok(())
        }
        FlowOutcome::NoEmails => writeln!(f, "  No email steps found in this flow."),
        FlowOutcome::Skipped { .. } => Ok(()),
    }
}

fn write_email(f: &mut fmt::Formatter<'_>, email: &EmailReport) -> fmt::Result {
    writeln!(f, "  Email: {}", email.step.name)?;
    writeln!(f, "  Subject: {}", email.step.subject)?;

    if let Some(performance) = &email.performance {
        writeln!(f, "  Performance: {}", performance_line(performance))?;
    }

    let label = if email.evaluation.is_fallback() {
        "AI feedback (fallback):"
    } else {
        "AI feedback:"
    };
    writeln!(f, "  {}", label)?;
    for line in email.evaluation.text.lines() {
        writeln!(f, "    {}", line)?;
    }
    writeln!(f, "  {}", RULE)
}

/// One-line metrics summary, with `-` for unknown counters.
pub fn performance_line(performance: &EmailPerformance) -> String {
    fn count(value: Option<u64>) -> String {
        value.map_or_else(|| "-".to_string(), |v| v.to_string())
    }
    fn rate(value: Option<f64>) -> String {
        value.map_or_else(String::new, |r| format!(" ({:.1}%)", r * 100.0))
    }

    format!(
        "sends {} | opens {}{} | clicks {}{} | revenue {} | bounce rate {}",
        count(performance.send_count),
        count(performance.open_count),
        rate(performance.open_rate()),
        count(performance.click_count),
        rate(performance.click_rate()),
        performance
            .revenue
            .as_ref()
            .map_or_else(|| "$0".to_string(), ToString::to_string),
        performance
            .bounce_rate
            .as_ref()
            .map_or_else(|| "N/A".to_string(), ToString::to_string),
    )
}

fn write_notice(f: &mut fmt::Formatter<'_>, notice: &Notice, indent: &str) -> fmt::Result {
    let tag = match notice.severity {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    writeln!(f, "{}[{}] {}", indent, tag, notice.message)
}
