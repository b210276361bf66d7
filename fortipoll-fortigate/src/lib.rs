//! FortiPoll collector for Fortinet Fortigate firewalls.
//!
//! Logs in to the FortiOS management API once at startup, then on every
//! poll queries the per-VDOM resource monitor and publishes three samples.
//!
//! # Key Expressions
//!
//! ```text
//! fortipoll/fortigate/<hostname>/cpu
//! fortipoll/fortigate/<hostname>/memory
//! fortipoll/fortigate/<hostname>/sessions
//! fortipoll/fortigate/@/status
//! ```

pub mod client;
pub mod collector;
pub mod config;

pub use client::{ClientError, ClientOptions, FortiosApi, FortiosClient};
pub use collector::{CollectorError, FortigateCollector, VdomResource};
pub use config::{COLLECTOR_NAME, ConfigError, FortigateCollectorConfig, FortigateSettings};
