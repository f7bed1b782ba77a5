//! Subject line evaluation.
//!
//! Asks the text-generation backend to rate a subject line and suggest a
//! better one. When generation is disabled, unconfigured, or failing, a fixed
//! fallback assessment is returned instead so the dashboard keeps working
//! with no external dependency.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{CacheSettings, GenerationSettings};
use crate::domain::{AssessmentParseError, SubjectAssessment, FALLBACK_TEXT};
use crate::providers::generation::{GenerationRequest, TextGenerator};

use super::reporter::{Notice, Reporter};

/// Where an evaluation's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Generated,
    Fallback,
}

/// Raw evaluation text for one subject line.
///
/// Generated text is passed through unvalidated; use [`Evaluation::assessment`]
/// to decode it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub subject: String,
    pub text: String,
    pub origin: Origin,
}

impl Evaluation {
    fn fallback(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            text: FALLBACK_TEXT.to_string(),
            origin: Origin::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == Origin::Fallback
    }

    /// Parses the text into a typed assessment.
    pub fn assessment(&self) -> Result<SubjectAssessment, AssessmentParseError> {
        SubjectAssessment::parse(&self.text)
    }
}

/// Builds the instruction sent to the generation backend.
pub fn build_prompt(subject: &str) -> String {
    format!(
        "Evaluate the following email subject line for marketing effectiveness:\n\n\
         Subject: \"{subject}\"\n\n\
         Rate its clarity, curiosity, urgency, and spam risk from 1–10.\n\
         Then suggest an improved subject line.\n\
         Respond in JSON like this:\n\
         {{\"clarity\": x, \"curiosity\": x, \"urgency\": x, \"spam_risk\": x, \"suggestion\": \"...\"}}"
    )
}

/// Evaluates subject lines, memoizing generated results by exact subject.
pub struct SubjectEvaluator {
    generator: Option<Arc<dyn TextGenerator>>,
    reporter: Arc<dyn Reporter>,
    temperature: f32,
    max_tokens: Option<u32>,
    cache: Mutex<LruCache<String, String>>,
}

impl SubjectEvaluator {
    /// Creates an evaluator. With no generator every evaluation falls back.
    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        reporter: Arc<dyn Reporter>,
        generation: &GenerationSettings,
        cache: &CacheSettings,
    ) -> Self {
        let capacity = NonZeroUsize::new(cache.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            generator,
            reporter,
            temperature: generation.temperature,
            max_tokens: generation.max_tokens,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Whether a generation backend is configured.
    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Number of memoized subjects.
    pub fn cached(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Evaluates `subject`.
    ///
    /// Never fails: any generation error degrades to the fallback text and a
    /// warning notice.
    pub async fn evaluate(&self, subject: &str, use_generation: bool) -> Evaluation {
        let generator = match (&self.generator, use_generation) {
            (Some(generator), true) => generator,
            _ => return Evaluation::fallback(subject),
        };

        if let Some(text) = self.cache_get(subject) {
            debug!(subject, "Subject evaluation cache hit");
            return Evaluation {
                subject: subject.to_string(),
                text,
                origin: Origin::Generated,
            };
        }

        let mut request =
            GenerationRequest::new(build_prompt(subject)).with_temperature(self.temperature);
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        match generator.generate(&request).await {
            Ok(generation) if generation.text.trim().is_empty() => {
                self.reporter.report(Notice::warning(
                    "Generation backend returned an empty answer, using fallback mode.",
                ));
                Evaluation::fallback(subject)
            }
            Ok(generation) => {
                debug!(
                    subject,
                    tokens = generation.usage.total(),
                    truncated = generation.truncated,
                    "Subject evaluated"
                );
                let text = generation.text.trim().to_string();
                self.cache_put(subject, &text);
                Evaluation {
                    subject: subject.to_string(),
                    text,
                    origin: Origin::Generated,
                }
            }
            Err(e) => {
                self.reporter.report(Notice::warning(format!(
                    "Generation backend unavailable, using fallback mode. Reason: {}",
                    e
                )));
                Evaluation::fallback(subject)
            }
        }
    }

    fn cache_get(&self, subject: &str) -> Option<String> {
        let mut cache = self.cache.lock().ok()?;
        cache.get(subject).cloned()
    }

    fn cache_put(&self, subject: &str, text: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(subject.to_string(), text.to_string());
        }
    }
}
