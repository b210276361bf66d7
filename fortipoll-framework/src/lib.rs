//! FortiPoll Collector Framework
//!
//! The host side of a FortiPoll collector: it loads configuration, owns the
//! metrics pipeline, and drives a [`Collector`] on a fixed cadence.
//!
//! # Overview
//!
//! - [`Collector`] is the capability contract a collector implements
//!   (`initialize`, `collect`, `describe_config`)
//! - [`SampleSink`] is the `publish(name, value)` seam; [`SamplePublisher`]
//!   implements it over Zenoh
//! - [`PollLoop`] invokes `collect` once per tick and forwards the samples
//! - [`CollectorConfig`] loads and validates JSON5 configuration files
//! - [`CollectorRunner`] handles logging, Zenoh, status, and Ctrl+C shutdown
//!
//! # Example
//!
//! ```ignore
//! use fortipoll_framework::{CollectorArgs, CollectorConfig, CollectorRunner, PollLoop};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = CollectorArgs::parse_with_default("mycollector.json5");
//!     let config = MyConfig::load(&args.config)?;
//!     let settings = config.device.clone();
//!
//!     let runner = CollectorRunner::new_with_args("mycollector", config, Some(&args)).await?;
//!     let poll = PollLoop::new(settings.interval(), settings.timeout());
//!
//!     runner
//!         .run_collector(MyCollector::new(), settings, "device01", Default::default(), poll, None)
//!         .await?;
//!     Ok(())
//! }
//! ```

mod args;
mod collector;
mod config;
mod error;
mod poll;
mod publisher;
mod runner;
mod status;

pub use args::CollectorArgs;
pub use collector::{Collector, ConfigMap, Sample, config_reference};
pub use config::CollectorConfig;
pub use error::{FrameworkError, Result};
pub use poll::{PollLoop, TickOutcome};
pub use publisher::{PublishStats, Publisher, SamplePublisher, SampleSink};
pub use runner::CollectorRunner;
pub use status::{CollectorStatus, StatusPublisher};

pub use fortipoll_common::{Format, LoggingConfig, TelemetryPoint, ZenohConfig};
