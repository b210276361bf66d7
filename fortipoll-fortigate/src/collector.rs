//! Fortigate resource-usage collector.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

use fortipoll_framework::{Collector, ConfigMap, Sample};

use crate::client::{ClientError, FortiosApi, FortiosClient};
use crate::config::{COLLECTOR_NAME, FortigateSettings};

/// Monitor endpoint queried on every tick.
const RESOURCE_CATEGORY: &str = "system";
const RESOURCE_ENDPOINT: &str = "vdom-resource";
const RESOURCE_MKEY: &str = "select";

/// Errors raised by [`FortigateCollector`].
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The FortiOS API client could not be built; the collector cannot start.
    #[error("FortiOS API client unavailable: {0}")]
    DependencyMissing(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Transport setup or login failed.
    #[error("Failed to establish session with {hostname}: {source}")]
    SessionEstablishmentFailed {
        hostname: String,
        #[source]
        source: ClientError,
    },

    /// One tick's query failed or returned unusable data.
    #[error("Collection from {hostname} failed: {reason}")]
    CollectionFailed { hostname: String, reason: String },

    #[error("Collector has not been initialized")]
    NotInitialized,
}

/// The `results` object of `system/vdom-resource/select`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct VdomResource {
    pub cpu: f64,
    pub memory: f64,
    pub session: SessionUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SessionUsage {
    pub current_usage: f64,
}

impl VdomResource {
    /// Extract the snapshot; any missing or non-numeric field rejects it whole.
    pub fn from_results(results: serde_json::Value) -> Result<Self, String> {
        serde_json::from_value(results).map_err(|e| e.to_string())
    }

    /// The three samples, always in cpu, memory, sessions order.
    pub fn samples(&self) -> Vec<Sample> {
        vec![
            Sample::new("cpu", self.cpu),
            Sample::new("memory", self.memory),
            Sample::new("sessions", self.session.current_usage),
        ]
    }
}

/// Builds the API client during `initialize`.
pub type ClientFactory<A> =
    Box<dyn Fn(&FortigateSettings) -> Result<A, ClientError> + Send + Sync>;

enum State<A> {
    Uninitialized,
    Ready {
        session: A,
        hostname: String,
        vdom: String,
    },
}

/// Polls one Fortigate for CPU, memory, and session usage.
///
/// The collector owns its API session; nothing is shared between instances.
pub struct FortigateCollector<A: FortiosApi = FortiosClient> {
    factory: ClientFactory<A>,
    state: State<A>,
}

impl FortigateCollector<FortiosClient> {
    pub fn new() -> Self {
        Self::with_client_factory(FortiosClient::from_settings)
    }
}

impl Default for FortigateCollector<FortiosClient> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: FortiosApi> FortigateCollector<A> {
    /// Collector whose API client comes from `factory`.
    pub fn with_client_factory<F>(factory: F) -> Self
    where
        F: Fn(&FortigateSettings) -> Result<A, ClientError> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            state: State::Uninitialized,
        }
    }

    /// Hostname of the device, once initialized.
    pub fn hostname(&self) -> Option<&str> {
        match &self.state {
            State::Ready { hostname, .. } => Some(hostname),
            State::Uninitialized => None,
        }
    }
}

impl<A: FortiosApi> Collector for FortigateCollector<A> {
    type Settings = FortigateSettings;
    type Error = CollectorError;

    fn name(&self) -> &str {
        COLLECTOR_NAME
    }

    fn default_config(&self) -> ConfigMap {
        FortigateSettings::default_config()
    }

    fn describe_config(&self) -> ConfigMap {
        FortigateSettings::config_help()
    }

    fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready { .. })
    }

    async fn initialize(&mut self, settings: FortigateSettings) -> Result<(), CollectorError> {
        settings
            .validate()
            .map_err(|e| CollectorError::InvalidSettings(e.to_string()))?;

        let mut api = (self.factory)(&settings).map_err(|e| match e {
            ClientError::Backend(message) => {
                error!(error = %message, "Unable to construct the FortiOS API client");
                CollectorError::DependencyMissing(message)
            }
            source => CollectorError::SessionEstablishmentFailed {
                hostname: settings.hostname.clone(),
                source,
            },
        })?;

        api.set_transport_mode(settings.https);
        debug!(hostname = %settings.hostname, https = settings.https, "Transport mode selected");

        api.login(&settings.hostname, &settings.user, &settings.password)
            .await
            .map_err(|source| CollectorError::SessionEstablishmentFailed {
                hostname: settings.hostname.clone(),
                source,
            })?;

        info!(hostname = %settings.hostname, vdom = %settings.vdom, "Login successful");

        self.state = State::Ready {
            session: api,
            hostname: settings.hostname,
            vdom: settings.vdom,
        };
        Ok(())
    }

    async fn collect(&self) -> Result<Vec<Sample>, CollectorError> {
        let State::Ready {
            session,
            hostname,
            vdom,
        } = &self.state
        else {
            return Err(CollectorError::NotInitialized);
        };

        let failed = |reason: String| CollectorError::CollectionFailed {
            hostname: hostname.clone(),
            reason,
        };

        let results = session
            .monitor(RESOURCE_CATEGORY, RESOURCE_ENDPOINT, RESOURCE_MKEY, vdom)
            .await
            .map_err(|e| failed(e.to_string()))?;

        let resource = VdomResource::from_results(results).map_err(failed)?;

        debug!(
            hostname = %hostname,
            cpu = resource.cpu,
            memory = resource.memory,
            sessions = resource.session.current_usage,
            "Collected vdom resources"
        );

        Ok(resource.samples())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    type CallLog = Arc<Mutex<Vec<String>>>;

    /// In-memory API that records the calls made against it.
    struct FakeApi {
        calls: CallLog,
        accept_login: bool,
        results: Option<serde_json::Value>,
    }

    impl FortiosApi for FakeApi {
        fn set_transport_mode(&mut self, https: bool) {
            let mode = if https { "on" } else { "off" };
            self.calls.lock().unwrap().push(format!("https:{mode}"));
        }

        async fn login(&mut self, host: &str, user: &str, password: &str) -> Result<(), ClientError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("login:{host}:{user}:{password}"));
            if self.accept_login {
                Ok(())
            } else {
                Err(ClientError::LoginRejected {
                    host: host.to_string(),
                    user: user.to_string(),
                })
            }
        }

        async fn monitor(
            &self,
            category: &str,
            endpoint: &str,
            mkey: &str,
            vdom: &str,
        ) -> Result<serde_json::Value, ClientError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("monitor:{category}/{endpoint}/{mkey}?vdom={vdom}"));
            self.results.clone().ok_or_else(|| ClientError::Timeout {
                url: "http://fake/".to_string(),
            })
        }
    }

    fn collector(
        accept_login: bool,
        results: Option<serde_json::Value>,
    ) -> (FortigateCollector<FakeApi>, CallLog) {
        let calls: CallLog = Arc::default();
        let log = calls.clone();
        let collector = FortigateCollector::with_client_factory(move |_settings| {
            Ok(FakeApi {
                calls: log.clone(),
                accept_login,
                results: results.clone(),
            })
        });
        (collector, calls)
    }

    fn settings() -> FortigateSettings {
        let mut settings = FortigateSettings::with_hostname("fw1.example.com");
        settings.password = "secret".to_string();
        settings
    }

    fn healthy_results() -> serde_json::Value {
        json!({ "cpu": 12.5, "memory": 47.3, "session": { "current_usage": 300 } })
    }

    #[tokio::test]
    async fn test_initialize_then_collect() {
        let (mut collector, calls) = collector(true, Some(healthy_results()));

        collector.initialize(settings()).await.unwrap();
        assert!(collector.is_ready());
        assert_eq!(collector.hostname(), Some("fw1.example.com"));

        let samples = collector.collect().await.unwrap();
        assert_eq!(
            samples,
            vec![
                Sample::new("cpu", 12.5),
                Sample::new("memory", 47.3),
                Sample::new("sessions", 300.0),
            ]
        );

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "https:on",
                "login:fw1.example.com:admin:secret",
                "monitor:system/vdom-resource/select?vdom=root",
            ]
        );
    }

    #[tokio::test]
    async fn test_https_false_selects_plain_transport_before_login() {
        let (mut collector, calls) = collector(true, Some(healthy_results()));
        let mut settings = settings();
        settings.https = false;

        collector.initialize(settings).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], "https:off");
        assert!(calls[1].starts_with("login:"));
    }

    #[tokio::test]
    async fn test_vdom_is_forwarded() {
        let (mut collector, calls) = collector(true, Some(healthy_results()));
        let mut settings = settings();
        settings.vdom = "dmz".to_string();

        collector.initialize(settings).await.unwrap();
        collector.collect().await.unwrap();

        assert_eq!(
            calls.lock().unwrap().last().map(String::as_str),
            Some("monitor:system/vdom-resource/select?vdom=dmz")
        );
    }

    #[tokio::test]
    async fn test_collect_before_initialize() {
        let (collector, calls) = collector(true, Some(healthy_results()));

        let result = collector.collect().await;

        assert!(matches!(result, Err(CollectorError::NotInitialized)));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_failure_is_session_error() {
        let (mut collector, _calls) = collector(false, Some(healthy_results()));

        let result = collector.initialize(settings()).await;

        assert!(matches!(
            result,
            Err(CollectorError::SessionEstablishmentFailed { ref hostname, .. }) if hostname == "fw1.example.com"
        ));
        assert!(!collector.is_ready());
    }

    #[tokio::test]
    async fn test_missing_backend_is_dependency_missing() {
        let mut collector: FortigateCollector<FakeApi> =
            FortigateCollector::with_client_factory(|_settings| {
                Err(ClientError::Backend("no TLS backend".to_string()))
            });

        let result = collector.initialize(settings()).await;

        assert!(matches!(result, Err(CollectorError::DependencyMissing(_))));
        assert!(!collector.is_ready());
    }

    #[tokio::test]
    async fn test_empty_hostname_is_rejected() {
        let (mut collector, calls) = collector(true, Some(healthy_results()));

        let result = collector
            .initialize(FortigateSettings::with_hostname(""))
            .await;

        assert!(matches!(result, Err(CollectorError::InvalidSettings(_))));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_field_fails_whole_tick() {
        for results in [
            json!({ "memory": 47.3, "session": { "current_usage": 300 } }),
            json!({ "cpu": 12.5, "session": { "current_usage": 300 } }),
            json!({ "cpu": 12.5, "memory": 47.3, "session": {} }),
            json!({ "cpu": 12.5, "memory": 47.3 }),
            json!({ "cpu": "high", "memory": 47.3, "session": { "current_usage": 300 } }),
        ] {
            let (mut collector, _calls) = collector(true, Some(results.clone()));
            collector.initialize(settings()).await.unwrap();

            let result = collector.collect().await;
            assert!(
                matches!(result, Err(CollectorError::CollectionFailed { .. })),
                "expected failure for {results}"
            );
        }
    }

    #[tokio::test]
    async fn test_failed_collect_stays_ready() {
        let (mut collector, _calls) = collector(true, None);
        collector.initialize(settings()).await.unwrap();

        assert!(collector.collect().await.is_err());
        assert!(collector.is_ready());
        assert!(collector.collect().await.is_err());
    }

    #[test]
    fn test_from_results_ignores_extra_fields() {
        let resource = VdomResource::from_results(json!({
            "cpu": 3,
            "memory": 20,
            "setup_rate": 5,
            "session": { "current_usage": 42, "usage_percent": 1 }
        }))
        .unwrap();

        assert_eq!(resource.cpu, 3.0);
        assert_eq!(resource.session.current_usage, 42.0);
    }

    #[test]
    fn test_describe_and_defaults() {
        let (collector, _calls) = collector(true, None);

        assert_eq!(collector.name(), "fortigate");
        assert_eq!(collector.default_config()["user"], "admin");
        assert_eq!(collector.default_config()["https"], "true");
        assert!(collector.describe_config().contains_key("vdom"));
    }

    #[test]
    fn test_config_reference_shows_defaults_and_help() {
        let (collector, _calls) = collector(true, None);
        let reference = fortipoll_framework::config_reference(&collector);

        assert!(reference.contains("user (default: \"admin\"): Username\n"));
        assert!(reference.contains("https (default: \"true\"): "));
        assert!(reference.contains("hostname: Hostname or IP to collect from\n"));
        assert_eq!(reference.lines().count(), FortigateSettings::config_help().len());
    }
}
