//! Periodic invocation of a collector.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::collector::Collector;
use crate::publisher::{PublishStats, SampleSink};

/// What happened during one poll tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// `collect` succeeded and every sample was handed to the sink.
    Published(PublishStats),
    /// `collect` returned an error; nothing was published.
    Failed(String),
    /// `collect` did not finish within the tick timeout; nothing was published.
    TimedOut,
}

/// Drives `collect` on a fixed interval, one poll in flight at a time.
#[derive(Debug, Clone, Copy)]
pub struct PollLoop {
    interval: Duration,
    tick_timeout: Duration,
}

impl PollLoop {
    pub fn new(interval: Duration, tick_timeout: Duration) -> Self {
        Self {
            interval,
            tick_timeout,
        }
    }

    /// Run one tick: collect, then publish every sample in order.
    ///
    /// Errors are contained to the tick. A collect that outlives the timeout
    /// is dropped, which leaves the collector's session untouched.
    pub async fn tick<C, S>(&self, collector: &C, sink: &S) -> TickOutcome
    where
        C: Collector,
        S: SampleSink,
    {
        let samples = match tokio::time::timeout(self.tick_timeout, collector.collect()).await {
            Ok(Ok(samples)) => samples,
            Ok(Err(e)) => {
                error!(collector = collector.name(), error = %e, "Collection failed");
                return TickOutcome::Failed(e.to_string());
            }
            Err(_) => {
                error!(
                    collector = collector.name(),
                    timeout_ms = self.tick_timeout.as_millis() as u64,
                    "Collection timed out"
                );
                return TickOutcome::TimedOut;
            }
        };

        let mut stats = PublishStats::default();
        for sample in &samples {
            match sink.publish(&sample.name, sample.value).await {
                Ok(()) => stats.success += 1,
                Err(e) => {
                    stats.failed += 1;
                    warn!(metric = %sample.name, error = %e, "Failed to publish sample");
                }
            }
        }

        debug!(
            collector = collector.name(),
            published = stats.success,
            failed = stats.failed,
            "Tick complete"
        );

        TickOutcome::Published(stats)
    }

    /// Tick forever. Intended to be spawned and aborted on shutdown.
    pub async fn run<C, S>(self, collector: C, sink: S)
    where
        C: Collector,
        S: SampleSink,
    {
        info!(
            collector = collector.name(),
            interval_secs = self.interval.as_secs(),
            "Starting poll loop"
        );

        loop {
            self.tick(&collector, &sink).await;
            tokio::time::sleep(self.interval).await;
        }
    }
}
