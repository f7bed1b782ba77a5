//! Subject line assessment types.
//!
//! The generation backend answers with free text that is expected, but not
//! guaranteed, to contain a JSON object. [`SubjectAssessment::parse`] is the
//! typed view over that text; callers that only display the raw answer never
//! need to call it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest accepted score.
pub const MIN_SCORE: u8 = 1;
/// Highest accepted score.
pub const MAX_SCORE: u8 = 10;

/// Suggestion used by the static fallback assessment.
pub const FALLBACK_SUGGESTION: &str = "Try testing different subject line variations.";

/// Raw text of the static fallback assessment.
pub const FALLBACK_TEXT: &str = "{\n  \"clarity\": 5,\n  \"curiosity\": 5,\n  \"urgency\": 5,\n  \"spam_risk\": 5,\n  \"suggestion\": \"Try testing different subject line variations.\"\n}";

/// Errors produced when generated text cannot be read as an assessment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssessmentParseError {
    /// The text contains no `{ ... }` object at all.
    #[error("no JSON object found in generated text")]
    NoJsonObject,

    /// The object exists but does not match the expected shape.
    #[error("malformed assessment: {0}")]
    Malformed(String),

    /// A score lies outside the 1..=10 scale.
    #[error("score `{field}` out of range: {value}")]
    ScoreOutOfRange { field: &'static str, value: u8 },
}

/// Quality assessment of a single subject line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectAssessment {
    pub clarity: u8,
    pub curiosity: u8,
    pub urgency: u8,
    pub spam_risk: u8,
    pub suggestion: String,
}

impl SubjectAssessment {
    /// The deterministic assessment used when generation is off or failing.
    pub fn fallback() -> Self {
        Self {
            clarity: 5,
            curiosity: 5,
            urgency: 5,
            spam_risk: 5,
            suggestion: FALLBACK_SUGGESTION.to_string(),
        }
    }

    /// Parses generated text into an assessment.
    ///
    /// Models often wrap the object in prose or a fenced code block, so the
    /// outermost `{ ... }` span is extracted before decoding.
    pub fn parse(text: &str) -> Result<Self, AssessmentParseError> {
        let start = text.find('{').ok_or(AssessmentParseError::NoJsonObject)?;
        let end = text.rfind('}').ok_or(AssessmentParseError::NoJsonObject)?;
        if end < start {
            return Err(AssessmentParseError::NoJsonObject);
        }

        let assessment: SubjectAssessment = serde_json::from_str(&text[start..=end])
            .map_err(|e| AssessmentParseError::Malformed(e.to_string()))?;
        assessment.validate()?;
        Ok(assessment)
    }

    fn validate(&self) -> Result<(), AssessmentParseError> {
        let scores = [
            ("clarity", self.clarity),
            ("curiosity", self.curiosity),
            ("urgency", self.urgency),
            ("spam_risk", self.spam_risk),
        ];
        for (field, value) in scores {
            if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
                return Err(AssessmentParseError::ScoreOutOfRange { field, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fallback_text_parses_to_fallback() {
        let parsed = SubjectAssessment::parse(FALLBACK_TEXT).unwrap();
        assert_eq!(parsed, SubjectAssessment::fallback());
    }

    #[test]
    fn fallback_text_matches_pretty_serialization() {
        let pretty = serde_json::to_string_pretty(&SubjectAssessment::fallback()).unwrap();
        assert_eq!(pretty, FALLBACK_TEXT);
    }

    #[test]
    fn parse_bare_object() {
        let text = r#"{"clarity": 8, "curiosity": 6, "urgency": 3, "spam_risk": 2, "suggestion": "Your cart misses you"}"#;
        let parsed = SubjectAssessment::parse(text).unwrap();

        assert_eq!(parsed.clarity, 8);
        assert_eq!(parsed.spam_risk, 2);
        assert_eq!(parsed.suggestion, "Your cart misses you");
    }

    #[test]
    fn parse_object_inside_code_fence() {
        let text = "Here is the evaluation:\n```json\n{\"clarity\": 7, \"curiosity\": 7, \"urgency\": 4, \"spam_risk\": 1, \"suggestion\": \"Last call\"}\n```";
        let parsed = SubjectAssessment::parse(text).unwrap();
        assert_eq!(parsed.urgency, 4);
    }

    #[test]
    fn parse_without_object_fails() {
        let err = SubjectAssessment::parse("I cannot rate this.").unwrap_err();
        assert_eq!(err, AssessmentParseError::NoJsonObject);
    }

    #[test]
    fn parse_missing_field_is_malformed() {
        let err = SubjectAssessment::parse(r#"{"clarity": 5}"#).unwrap_err();
        assert!(matches!(err, AssessmentParseError::Malformed(_)));
    }

    #[test]
    fn parse_rejects_out_of_range_score() {
        let text = r#"{"clarity": 11, "curiosity": 5, "urgency": 5, "spam_risk": 5, "suggestion": "x"}"#;
        let err = SubjectAssessment::parse(text).unwrap_err();
        assert_eq!(
            err,
            AssessmentParseError::ScoreOutOfRange {
                field: "clarity",
                value: 11
            }
        );
    }

    #[test]
    fn parse_rejects_zero_score() {
        let text = r#"{"clarity": 5, "curiosity": 5, "urgency": 5, "spam_risk": 0, "suggestion": "x"}"#;
        let err = SubjectAssessment::parse(text).unwrap_err();
        assert!(matches!(
            err,
            AssessmentParseError::ScoreOutOfRange {
                field: "spam_risk",
                ..
            }
        ));
    }
}
