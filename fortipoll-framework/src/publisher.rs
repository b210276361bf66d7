//! Sample publishing to the Zenoh pipeline.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use fortipoll_common::{Format, KeyExprBuilder, TelemetryPoint, encode};

use crate::error::{FrameworkError, Result};

/// Where the host hands each sample of a tick.
pub trait SampleSink: Send + Sync {
    /// Publish one named value.
    fn publish(&self, name: &str, value: f64) -> impl Future<Output = Result<()>> + Send;
}

/// Raw Zenoh publisher rooted at a key prefix.
#[derive(Clone, Debug)]
pub struct Publisher {
    session: Arc<zenoh::Session>,
    keys: KeyExprBuilder,
    format: Format,
}

impl Publisher {
    pub fn new(
        session: Arc<zenoh::Session>,
        key_prefix: impl Into<String>,
        format: Format,
    ) -> Self {
        Self {
            session,
            keys: KeyExprBuilder::with_prefix(key_prefix),
            format,
        }
    }

    /// Key expressions under this publisher's prefix.
    pub fn keys(&self) -> &KeyExprBuilder {
        &self.keys
    }

    /// Encode a telemetry point and put it at `key`.
    async fn publish_point(&self, key: &str, point: &TelemetryPoint) -> Result<()> {
        let payload =
            encode(point, self.format).map_err(|e| FrameworkError::Serialization(e.to_string()))?;
        self.publish_raw(key, payload).await
    }

    async fn publish_raw(&self, key: &str, payload: Vec<u8>) -> Result<()> {
        self.session
            .put(key, payload)
            .await
            .map_err(|e| FrameworkError::Publish {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    /// Put a JSON document at a full key (status messages).
    pub(crate) async fn publish_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        self.publish_raw(key, payload).await
    }
}

/// [`SampleSink`] that publishes a device's samples as telemetry points.
///
/// Samples land at `<prefix>/<source>/<name>`.
#[derive(Clone, Debug)]
pub struct SamplePublisher {
    publisher: Publisher,
    collector: String,
    source: String,
    labels: HashMap<String, String>,
}

impl SamplePublisher {
    pub fn new(
        publisher: Publisher,
        collector: impl Into<String>,
        source: impl Into<String>,
        labels: HashMap<String, String>,
    ) -> Self {
        Self {
            publisher,
            collector: collector.into(),
            source: source.into(),
            labels,
        }
    }

    /// The telemetry point a sample becomes on the wire.
    fn to_point(&self, name: &str, value: f64) -> TelemetryPoint {
        TelemetryPoint::new(&self.source, &self.collector, name, value)
            .with_labels(self.labels.clone())
    }
}

impl SampleSink for SamplePublisher {
    async fn publish(&self, name: &str, value: f64) -> Result<()> {
        let point = self.to_point(name, value);
        let key = self.publisher.keys().build(&self.source, name);
        self.publisher.publish_point(&key, &point).await?;
        tracing::debug!(source = %self.source, metric = name, value, "Published sample");
        Ok(())
    }
}

/// Outcome of publishing one tick's samples.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishStats {
    pub success: usize,
    pub failed: usize,
}
