//! Flow email resolver.
//!
//! Walks flow → actions → messages and flattens the result into
//! [`EmailStep`]s. Both levels retry on rate limiting with exponential
//! backoff, but with different bounds:
//!
//! - the flow-actions fetch makes at most `max_retries` attempts in total,
//!   and exhausting them fails the whole flow with no partial result;
//! - each action's message fetch makes at most
//!   [`ResolverSettings::message_attempts`] attempts, and a failure there only
//!   drops that action.

use std::sync::Arc;

use tracing::debug;

use crate::config::ResolverSettings;
use crate::domain::{EmailStep, FlowAction, FlowId, FlowMessage};
use crate::providers::marketing::MarketingApi;

use super::reporter::{Notice, Reporter};
use super::retry::{retry_on_rate_limit, Backoff, RetryOutcome};

/// Action type of a classic email send step.
pub const SEND_EMAIL: &str = "SEND_EMAIL";

/// Decides which flow actions are email sends worth resolving.
pub trait ActionFilter: Send + Sync {
    fn is_email_send(&self, action: &FlowAction) -> bool;
}

impl<F> ActionFilter for F
where
    F: Fn(&FlowAction) -> bool + Send + Sync,
{
    fn is_email_send(&self, action: &FlowAction) -> bool {
        self(action)
    }
}

/// Accepts actions whose type is one of a fixed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTypeFilter {
    accepted: Vec<String>,
}

impl ActionTypeFilter {
    pub fn new<I, S>(accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted: accepted.into_iter().map(Into::into).collect(),
        }
    }

    /// Only `SEND_EMAIL`.
    pub fn send_email() -> Self {
        Self::new([SEND_EMAIL])
    }

    /// `SEND_EMAIL` plus the `EMAIL` and `EMAIL_V2` spellings.
    pub fn lenient() -> Self {
        Self::new([SEND_EMAIL, "EMAIL", "EMAIL_V2"])
    }
}

impl Default for ActionTypeFilter {
    fn default() -> Self {
        Self::send_email()
    }
}

impl ActionFilter for ActionTypeFilter {
    fn is_email_send(&self, action: &FlowAction) -> bool {
        self.accepted.iter().any(|t| *t == action.action_type)
    }
}

/// Resolves the email steps of a flow.
pub struct EmailResolver {
    api: Arc<dyn MarketingApi>,
    reporter: Arc<dyn Reporter>,
    filter: Arc<dyn ActionFilter>,
    settings: ResolverSettings,
}

impl EmailResolver {
    pub fn new(
        api: Arc<dyn MarketingApi>,
        reporter: Arc<dyn Reporter>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            api,
            reporter,
            filter: Arc::new(ActionTypeFilter::default()),
            settings,
        }
    }

    /// Replaces the action filter.
    pub fn with_filter(mut self, filter: impl ActionFilter + 'static) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolves a flow using the configured `max_retries`.
    pub async fn resolve(&self, flow_id: &FlowId) -> Vec<EmailStep> {
        self.resolve_emails(flow_id, self.settings.max_retries).await
    }

    /// Resolves the email steps of `flow_id`.
    ///
    /// `max_retries` is the total number of flow-actions attempts. Values
    /// below one are treated as one.
    pub async fn resolve_emails(&self, flow_id: &FlowId, max_retries: u32) -> Vec<EmailStep> {
        let backoff = Backoff::new(self.settings.backoff_base);

        let outcome = retry_on_rate_limit(
            max_retries,
            backoff,
            || self.api.list_flow_actions(flow_id),
            |attempt, wait| {
                debug!(flow_id = %flow_id, attempt, "flow-actions rate limited");
                self.reporter.report(Notice::warning(format!(
                    "Rate limited. Retrying flow-actions in {}s...",
                    wait.as_secs()
                )));
            },
        )
        .await;

        let actions = match outcome {
            RetryOutcome::Success(actions) => actions,
            RetryOutcome::Exhausted { attempts } => {
                self.reporter.report(Notice::error(format!(
                    "Failed to fetch emails for flow {} after {} retries.",
                    flow_id, attempts
                )));
                return Vec::new();
            }
            RetryOutcome::Failed(e) => {
                self.reporter.report(Notice::error(format!(
                    "Error fetching flow-actions for flow {}: {}",
                    flow_id, e
                )));
                return Vec::new();
            }
        };

        let mut steps = Vec::new();
        for action in actions.iter().filter(|a| self.filter.is_email_send(a)) {
            let Some(message) = self.first_message(action).await else {
                continue;
            };

            steps.push(EmailStep::from_parts(action, message));

            if !self.settings.politeness_delay.is_zero() {
                tokio::time::sleep(self.settings.politeness_delay).await;
            }
        }

        debug!(flow_id = %flow_id, count = steps.len(), "Resolved email steps");
        steps
    }

    /// Fetches the canonical (first) message of an email action.
    async fn first_message(&self, action: &FlowAction) -> Option<FlowMessage> {
        let backoff = Backoff::new(self.settings.backoff_base);

        let outcome = retry_on_rate_limit(
            self.settings.message_attempts,
            backoff,
            || self.api.list_flow_messages(&action.id),
            |attempt, wait| {
                debug!(action_id = %action.id, attempt, "flow-messages rate limited");
                self.reporter.report(Notice::warning(format!(
                    "Rate limit hit fetching message {}. Retrying in {}s...",
                    action.id,
                    wait.as_secs()
                )));
            },
        )
        .await;

        match outcome {
            RetryOutcome::Success(messages) => messages.into_iter().next(),
            RetryOutcome::Exhausted { attempts } => {
                self.reporter.report(Notice::warning(format!(
                    "Failed to fetch message for action {}: still rate limited after {} attempts",
                    action.id, attempts
                )));
                None
            }
            RetryOutcome::Failed(e) => {
                self.reporter.report(Notice::warning(format!(
                    "Failed to fetch message for action {}: {}",
                    action.id, e
                )));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActionId;
    use crate::providers::marketing::{MockMarketingApi, ProviderError};
    use crate::services::reporter::{CollectingReporter, Severity};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn rate_limited() -> ProviderError {
        ProviderError::RateLimited {
            retry_after_secs: None,
        }
    }

    fn resolver(api: MockMarketingApi) -> (EmailResolver, Arc<CollectingReporter>) {
        let reporter = Arc::new(CollectingReporter::new());
        let resolver = EmailResolver::new(
            Arc::new(api),
            reporter.clone(),
            ResolverSettings::without_delays(),
        );
        (resolver, reporter)
    }

    #[test]
    fn default_filter_accepts_send_email_only() {
        let filter = ActionTypeFilter::default();
        assert!(filter.is_email_send(&FlowAction::new("A1", "SEND_EMAIL")));
        assert!(!filter.is_email_send(&FlowAction::new("A2", "TIME_DELAY")));
        assert!(!filter.is_email_send(&FlowAction::new("A3", "EMAIL_V2")));
    }

    #[test]
    fn lenient_filter_accepts_variants() {
        let filter = ActionTypeFilter::lenient();
        assert!(filter.is_email_send(&FlowAction::new("A1", "EMAIL")));
        assert!(filter.is_email_send(&FlowAction::new("A2", "EMAIL_V2")));
        assert!(!filter.is_email_send(&FlowAction::new("A3", "SEND_SMS")));
    }

    #[tokio::test]
    async fn resolves_email_actions_and_skips_others() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flow_actions()
            .with(eq(FlowId::from("F1")))
            .times(1)
            .returning(|_| {
                Ok(vec![
                    FlowAction::new("A1", "SEND_EMAIL"),
                    FlowAction::new("A2", "TIME_DELAY"),
                ])
            });
        api.expect_list_flow_messages()
            .with(eq(ActionId::from("A1")))
            .times(1)
            .returning(|_| Ok(vec![FlowMessage::new("M1", "Hello", "Welcome")]));

        let (resolver, reporter) = resolver(api);
        let steps = resolver.resolve_emails(&FlowId::from("F1"), 3).await;

        assert_eq!(
            steps,
            vec![EmailStep {
                name: "Welcome".to_string(),
                subject: "Hello".to_string(),
                action_id: ActionId::from("A1"),
                message_id: "M1".into(),
            }]
        );
        assert!(reporter.notices().is_empty());
    }

    #[tokio::test]
    async fn continuous_rate_limit_fails_the_flow() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flow_actions()
            .times(3)
            .returning(|_| Err(rate_limited()));
        api.expect_list_flow_messages().never();

        let (resolver, reporter) = resolver(api);
        let steps = resolver.resolve_emails(&FlowId::from("F2"), 3).await;

        assert!(steps.is_empty());
        assert_eq!(reporter.count(Severity::Error), 1);
        assert_eq!(reporter.count(Severity::Warning), 2);
        let last = reporter.notices().pop().unwrap();
        assert_eq!(last.message, "Failed to fetch emails for flow F2 after 3 retries.");
    }

    #[tokio::test]
    async fn recovers_from_transient_rate_limit() {
        let mut api = MockMarketingApi::new();
        let mut calls = 0;
        api.expect_list_flow_actions().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(rate_limited())
            } else {
                Ok(vec![FlowAction::new("A1", "SEND_EMAIL")])
            }
        });
        api.expect_list_flow_messages()
            .returning(|_| Ok(vec![FlowMessage::new("M1", "Hi", "Intro")]));

        let (resolver, reporter) = resolver(api);
        let steps = resolver.resolve_emails(&FlowId::from("F1"), 3).await;

        assert_eq!(steps.len(), 1);
        assert_eq!(reporter.count(Severity::Warning), 1);
        assert_eq!(reporter.count(Severity::Error), 0);
    }

    #[tokio::test]
    async fn other_errors_fail_without_retry() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flow_actions()
            .times(1)
            .returning(|_| Err(ProviderError::NotFound("flow F9".to_string())));

        let (resolver, reporter) = resolver(api);
        let steps = resolver.resolve_emails(&FlowId::from("F9"), 3).await;

        assert!(steps.is_empty());
        let notices = reporter.notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0]
            .message
            .starts_with("Error fetching flow-actions for flow F9"));
    }

    #[tokio::test]
    async fn message_fetch_has_its_own_bound() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flow_actions().returning(|_| {
            Ok(vec![
                FlowAction::new("A1", "SEND_EMAIL"),
                FlowAction::new("A2", "SEND_EMAIL"),
            ])
        });
        api.expect_list_flow_messages()
            .with(eq(ActionId::from("A1")))
            .times(3)
            .returning(|_| Err(rate_limited()));
        api.expect_list_flow_messages()
            .with(eq(ActionId::from("A2")))
            .times(1)
            .returning(|_| Ok(vec![FlowMessage::new("M2", "Second", "Follow up")]));

        let (resolver, reporter) = resolver(api);
        let steps = resolver.resolve_emails(&FlowId::from("F1"), 1).await;

        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].action_id, ActionId::from("A2"));
        assert_eq!(reporter.count(Severity::Error), 0);
        // two retry warnings plus the give-up warning
        assert_eq!(reporter.count(Severity::Warning), 3);
    }

    #[tokio::test]
    async fn message_error_skips_action() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flow_actions()
            .returning(|_| Ok(vec![FlowAction::new("A1", "SEND_EMAIL")]));
        api.expect_list_flow_messages().times(1).returning(|_| {
            Err(ProviderError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        });

        let (resolver, reporter) = resolver(api);
        let steps = resolver.resolve_emails(&FlowId::from("F1"), 3).await;

        assert!(steps.is_empty());
        assert_eq!(reporter.count(Severity::Warning), 1);
        assert!(reporter.notices()[0]
            .message
            .starts_with("Failed to fetch message for action A1"));
    }

    #[tokio::test]
    async fn empty_message_list_contributes_nothing() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flow_actions()
            .returning(|_| Ok(vec![FlowAction::new("A1", "SEND_EMAIL")]));
        api.expect_list_flow_messages().returning(|_| Ok(Vec::new()));

        let (resolver, reporter) = resolver(api);
        assert!(resolver.resolve_emails(&FlowId::from("F1"), 3).await.is_empty());
        assert!(reporter.notices().is_empty());
    }

    #[tokio::test]
    async fn first_message_is_canonical() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flow_actions()
            .returning(|_| Ok(vec![FlowAction::new("A1", "SEND_EMAIL")]));
        api.expect_list_flow_messages().returning(|_| {
            Ok(vec![
                FlowMessage::new("M1", "First", "Variant A"),
                FlowMessage::new("M2", "Second", "Variant B"),
            ])
        });

        let (resolver, _) = resolver(api);
        let steps = resolver.resolve_emails(&FlowId::from("F1"), 3).await;

        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].subject, "First");
    }

    #[tokio::test]
    async fn custom_filter_is_used() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flow_actions().returning(|_| {
            Ok(vec![
                FlowAction::new("A1", "SEND_EMAIL"),
                FlowAction::new("A2", "EMAIL_V2"),
            ])
        });
        api.expect_list_flow_messages()
            .with(eq(ActionId::from("A2")))
            .times(1)
            .returning(|_| Ok(vec![FlowMessage::new("M2", "V2", "Modern")]));

        let (resolver, _) = resolver(api);
        let resolver = resolver.with_filter(|a: &FlowAction| a.action_type == "EMAIL_V2");
        let steps = resolver.resolve_emails(&FlowId::from("F1"), 3).await;

        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].subject, "V2");
    }

    #[tokio::test]
    async fn resolve_uses_configured_retries() {
        let mut api = MockMarketingApi::new();
        api.expect_list_flow_actions()
            .times(2)
            .returning(|_| Err(rate_limited()));

        let reporter = Arc::new(CollectingReporter::new());
        let settings = ResolverSettings {
            max_retries: 2,
            ..ResolverSettings::without_delays()
        };
        let resolver = EmailResolver::new(Arc::new(api), reporter.clone(), settings);

        assert!(resolver.resolve(&FlowId::from("F1")).await.is_empty());
        assert_eq!(reporter.count(Severity::Error), 1);
    }
}
