//! The collector capability contract.

use std::collections::BTreeMap;
use std::future::Future;

/// String-keyed configuration mapping (defaults, overrides, help text).
pub type ConfigMap = BTreeMap<String, String>;

/// A named numeric observation produced by one poll tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub value: f64,
}

impl Sample {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Capabilities the host invokes on a collector.
///
/// Lifecycle is two-phase: a collector starts uninitialized, becomes ready
/// after a successful [`initialize`](Self::initialize), and is then polled
/// through [`collect`](Self::collect) until the process ends. A failed
/// `collect` leaves the collector ready for the next tick.
///
/// `collect` takes `&self`: the established session is read-only during a
/// poll.
pub trait Collector: Send + Sync {
    /// Effective settings handed to `initialize`.
    type Settings: Send;

    type Error: std::error::Error + Send + Sync + 'static;

    /// Short name used in logs, key expressions, and status messages.
    fn name(&self) -> &str;

    /// Default values of the base settings.
    fn default_config(&self) -> ConfigMap;

    /// Human-readable description of every recognized configuration key.
    fn describe_config(&self) -> ConfigMap;

    /// Whether `initialize` has completed successfully.
    fn is_ready(&self) -> bool;

    /// Establish the session. Must succeed before any `collect`.
    fn initialize(
        &mut self,
        settings: Self::Settings,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Produce the current samples. On error, no sample of this tick is published.
    fn collect(&self) -> impl Future<Output = Result<Vec<Sample>, Self::Error>> + Send;
}

/// One line per recognized configuration key: name, default if any, help.
pub fn config_reference<K: Collector>(collector: &K) -> String {
    let defaults = collector.default_config();

    collector
        .describe_config()
        .iter()
        .map(|(key, help)| match defaults.get(key) {
            Some(default) => format!("{key} (default: {default:?}): {help}\n"),
            None => format!("{key}: {help}\n"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("unused")]
    struct Never;

    struct Described;

    impl Collector for Described {
        type Settings = ();
        type Error = Never;

        fn name(&self) -> &str {
            "described"
        }

        fn default_config(&self) -> ConfigMap {
            ConfigMap::from([("user".to_string(), "admin".to_string())])
        }

        fn describe_config(&self) -> ConfigMap {
            ConfigMap::from([
                ("hostname".to_string(), "Device address".to_string()),
                ("user".to_string(), "Username".to_string()),
            ])
        }

        fn is_ready(&self) -> bool {
            false
        }

        async fn initialize(&mut self, _settings: ()) -> Result<(), Never> {
            Ok(())
        }

        async fn collect(&self) -> Result<Vec<Sample>, Never> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_config_reference_lists_defaults() {
        assert_eq!(
            config_reference(&Described),
            "hostname: Device address\nuser (default: \"admin\"): Username\n"
        );
    }
}
