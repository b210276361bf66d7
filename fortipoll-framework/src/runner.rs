//! Collector lifecycle management.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::signal;
use tokio::task::JoinHandle;

use fortipoll_common::{Format, LoggingConfig, connect, init_tracing};

use crate::CollectorArgs;
use crate::collector::{Collector, config_reference};
use crate::config::CollectorConfig;
use crate::error::{FrameworkError, Result};
use crate::poll::PollLoop;
use crate::publisher::{Publisher, SamplePublisher};
use crate::status::StatusPublisher;

/// Hosts one collector from startup to Ctrl+C.
///
/// Handles:
/// - Logging initialization (config level, overridable from the CLI)
/// - Zenoh connection
/// - Invoking the collector's `initialize`, then its poll loop
/// - Status publishing (optional)
/// - Graceful shutdown
pub struct CollectorRunner<C: CollectorConfig> {
    name: String,
    version: String,
    config: C,
    session: Arc<zenoh::Session>,
    publisher: Publisher,
    status_publisher: Option<StatusPublisher>,
}

impl<C: CollectorConfig> CollectorRunner<C> {
    /// Initialize logging (honouring `--log-level`) and connect to Zenoh.
    pub async fn new_with_args(
        name: impl Into<String>,
        config: C,
        args: Option<&CollectorArgs>,
    ) -> Result<Self> {
        let name = name.into();
        let version = env!("CARGO_PKG_VERSION").to_string();

        let mut log_config: LoggingConfig = config.logging().clone();
        if let Some(level) = args.and_then(|a| a.log_level.clone()) {
            log_config.level = level;
        }
        init_tracing(&log_config).map_err(|e| FrameworkError::config(e.to_string()))?;

        tracing::info!(collector = %name, version = %version, "Starting collector");

        let session = Arc::new(
            connect(config.zenoh())
                .await
                .map_err(|e| FrameworkError::ZenohConnection(e.to_string()))?,
        );

        let publisher = Publisher::new(session.clone(), config.key_prefix(), Format::Json);

        Ok(Self {
            name,
            version,
            config,
            session,
            publisher,
            status_publisher: None,
        })
    }

    /// Publish status on startup, shutdown, and startup failure.
    pub fn with_status_publishing(mut self) -> Self {
        self.status_publisher = Some(StatusPublisher::new(
            self.publisher.clone(),
            &self.name,
            &self.version,
        ));
        self
    }

    /// Change the payload format used for samples and status.
    pub fn with_format(mut self, format: Format) -> Self {
        self.publisher = Publisher::new(self.session.clone(), self.config.key_prefix(), format);
        if self.status_publisher.is_some() {
            self.status_publisher = Some(StatusPublisher::new(
                self.publisher.clone(),
                &self.name,
                &self.version,
            ));
        }
        self
    }

    /// Initialize `collector`, poll it until Ctrl+C, then shut down.
    ///
    /// If `initialize` fails the collector is disabled: an "error" status is
    /// published, the session is closed, and [`FrameworkError::Startup`] is
    /// returned.
    pub async fn run_collector<K>(
        self,
        mut collector: K,
        settings: K::Settings,
        source: impl Into<String>,
        labels: HashMap<String, String>,
        poll: PollLoop,
        metadata: Option<serde_json::Value>,
    ) -> Result<()>
    where
        K: Collector + 'static,
    {
        let source = source.into();

        for line in config_reference(&collector).lines() {
            tracing::debug!(collector = %self.name, "Setting {}", line);
        }

        if let Err(e) = collector.initialize(settings).await {
            tracing::error!(collector = %self.name, source = %source, error = %e, "Initialization failed");
            return Err(self.abort_startup(e.to_string()).await);
        }

        let sink = SamplePublisher::new(self.publisher.clone(), &self.name, source, labels);
        let poll_task = tokio::spawn(poll.run(collector, sink));

        self.run_until_shutdown(poll_task, metadata).await
    }

    /// Report a fatal startup error and release the pipeline.
    async fn abort_startup(self, message: String) -> FrameworkError {
        if let Some(ref status_pub) = self.status_publisher {
            if let Err(e) = status_pub.publish_error(message.clone()).await {
                tracing::warn!(error = %e, "Failed to publish error status");
            }
        }

        if let Err(e) = self.session.close().await {
            tracing::warn!(error = %e, "Error closing Zenoh session");
        }

        FrameworkError::startup(self.name, message)
    }

    async fn run_until_shutdown(
        self,
        poll_task: JoinHandle<()>,
        metadata: Option<serde_json::Value>,
    ) -> Result<()> {
        if let Some(ref status_pub) = self.status_publisher {
            if let Err(e) = status_pub.publish_running(metadata).await {
                tracing::warn!(error = %e, "Failed to publish running status");
            }
        }

        tracing::info!(collector = %self.name, "Collector running. Press Ctrl+C to stop.");

        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }

        tracing::info!(collector = %self.name, "Received shutdown signal");

        poll_task.abort();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        if let Some(ref status_pub) = self.status_publisher {
            if let Err(e) = status_pub.publish_offline().await {
                tracing::warn!(error = %e, "Failed to publish offline status");
            }
        }

        if let Err(e) = self.session.close().await {
            tracing::warn!(error = %e, "Error closing Zenoh session");
        }

        tracing::info!(collector = %self.name, "Goodbye!");

        Ok(())
    }
}
