//! Collector status reporting.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::publisher::Publisher;

/// Status message published at `<prefix>/@/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorStatus {
    /// Collector name (e.g., "fortigate").
    pub collector: String,
    pub version: String,
    /// "running", "offline", or "error".
    pub status: String,
    /// Collector-specific details.
    #[serde(flatten)]
    pub metadata: serde_json::Value,
}

impl CollectorStatus {
    pub fn running(collector: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_state(collector, version, "running")
    }

    pub fn offline(collector: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_state(collector, version, "offline")
    }

    pub fn error(
        collector: impl Into<String>,
        version: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::with_state(collector, version, "error")
            .with_metadata(serde_json::json!({ "error": error.into() }))
    }

    fn with_state(
        collector: impl Into<String>,
        version: impl Into<String>,
        status: &str,
    ) -> Self {
        Self {
            collector: collector.into(),
            version: version.into(),
            status: status.to_string(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub async fn publish(&self, publisher: &Publisher) -> Result<()> {
        publisher
            .publish_json(&publisher.keys().status_key(), self)
            .await
    }
}

/// Publishes the collector's status transitions.
pub struct StatusPublisher {
    publisher: Publisher,
    collector: String,
    version: String,
}

impl StatusPublisher {
    pub fn new(
        publisher: Publisher,
        collector: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            collector: collector.into(),
            version: version.into(),
        }
    }

    pub async fn publish_running(&self, metadata: Option<serde_json::Value>) -> Result<()> {
        let mut status = CollectorStatus::running(&self.collector, &self.version);
        if let Some(meta) = metadata {
            status = status.with_metadata(meta);
        }
        status.publish(&self.publisher).await
    }

    pub async fn publish_offline(&self) -> Result<()> {
        CollectorStatus::offline(&self.collector, &self.version)
            .publish(&self.publisher)
            .await
    }

    pub async fn publish_error(&self, error: impl Into<String>) -> Result<()> {
        CollectorStatus::error(&self.collector, &self.version, error)
            .publish(&self.publisher)
            .await
    }
}
