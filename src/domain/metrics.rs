//! Display-only email performance metrics.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A metric the endpoint may send as a number or as preformatted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetricValue {
    fn from(s: &str) -> Self {
        MetricValue::Text(s.to_string())
    }
}

impl From<f64> for MetricValue {
    fn from(n: f64) -> Self {
        MetricValue::Number(n)
    }
}

/// Accepts integer, float or numeric-string counters. Anything else is unknown.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<MetricValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(MetricValue::Number(n)) if n.is_finite() && n >= 0.0 => Some(n.round() as u64),
        Some(MetricValue::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Aggregate performance of one flow message.
///
/// Every field is optional because the metrics endpoint omits counters it
/// has no data for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailPerformance {
    #[serde(default, deserialize_with = "lenient_count")]
    pub send_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub open_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub click_count: Option<u64>,
    #[serde(default)]
    pub revenue: Option<MetricValue>,
    #[serde(default)]
    pub bounce_rate: Option<MetricValue>,
}

impl EmailPerformance {
    /// Returns `true` when the endpoint reported nothing useful.
    pub fn is_empty(&self) -> bool {
        self.send_count.is_none()
            && self.open_count.is_none()
            && self.click_count.is_none()
            && self.revenue.is_none()
            && self.bounce_rate.is_none()
    }

    /// Opens divided by sends, when both are known and sends is non-zero.
    pub fn open_rate(&self) -> Option<f64> {
        match (self.open_count, self.send_count) {
            (Some(opens), Some(sends)) if sends > 0 => Some(opens as f64 / sends as f64),
            _ => None,
        }
    }

    /// Clicks divided by sends, when both are known and sends is non-zero.
    pub fn click_rate(&self) -> Option<f64> {
        match (self.click_count, self.send_count) {
            (Some(clicks), Some(sends)) if sends > 0 => Some(clicks as f64 / sends as f64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(EmailPerformance::default().is_empty());
    }

    #[test]
    fn rates_need_non_zero_sends() {
        let perf = EmailPerformance {
            send_count: Some(200),
            open_count: Some(50),
            click_count: Some(10),
            ..Default::default()
        };
        assert_eq!(perf.open_rate(), Some(0.25));
        assert_eq!(perf.click_rate(), Some(0.05));

        let zero = EmailPerformance {
            send_count: Some(0),
            open_count: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.open_rate(), None);
    }

    #[test]
    fn deserializes_partial_attributes() {
        let perf: EmailPerformance =
            serde_json::from_str(r#"{"send_count": 12, "revenue": "$40.00"}"#).unwrap();
        assert_eq!(perf.send_count, Some(12));
        assert_eq!(perf.revenue, Some(MetricValue::from("$40.00")));
        assert!(perf.bounce_rate.is_none());
    }

    #[test]
    fn deserializes_numeric_revenue_and_float_counts() {
        let perf: EmailPerformance = serde_json::from_str(
            r#"{"send_count": 1000.0, "open_count": "420", "click_count": null, "revenue": 312.5, "bounce_rate": 0.012}"#,
        )
        .unwrap();

        assert_eq!(perf.send_count, Some(1000));
        assert_eq!(perf.open_count, Some(420));
        assert_eq!(perf.click_count, None);
        assert_eq!(perf.revenue, Some(MetricValue::Number(312.5)));
        assert_eq!(perf.revenue.unwrap().to_string(), "312.5");
        assert_eq!(perf.bounce_rate.unwrap().to_string(), "0.012");
    }
}
