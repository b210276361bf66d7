use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// A published sample, as it travels through the metrics pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryPoint {
    /// Unix epoch milliseconds when the sample was taken.
    pub timestamp: i64,

    /// Device identifier (e.g., "fw1.example.com", "10.0.0.1").
    pub source: String,

    /// Name of the collector that produced the sample (e.g., "fortigate").
    pub collector: String,

    /// Metric name (e.g., "cpu", "sessions").
    pub metric: String,

    pub value: f64,

    /// Additional context labels (e.g., vdom).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
}

impl TelemetryPoint {
    /// Create a new point stamped with the current time.
    pub fn new(
        source: impl Into<String>,
        collector: impl Into<String>,
        metric: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            timestamp: current_timestamp_millis(),
            source: source.into(),
            collector: collector.into(),
            metric: metric.into(),
            value,
            labels: HashMap::new(),
        }
    }

    pub fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels.extend(labels);
        self
    }
}

/// Current time in milliseconds since the Unix epoch, or 0 if the clock is before it.
pub fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
