//! Configuration for the Fortigate collector.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use fortipoll_common::KeyExprBuilder;
use fortipoll_framework::{
    CollectorConfig, ConfigMap, Format, FrameworkError, LoggingConfig, ZenohConfig,
};

/// Name the collector publishes under.
pub const COLLECTOR_NAME: &str = "fortigate";

/// Settings rejected by [`FortigateSettings::validate`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid key_prefix '{prefix}': {reason}")]
    InvalidKeyPrefix { prefix: String, reason: &'static str },
}

/// Complete collector configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FortigateCollectorConfig {
    #[serde(default)]
    pub zenoh: ZenohConfig,

    /// Payload format for published samples.
    #[serde(default)]
    pub serialization: Format,

    #[serde(default)]
    pub logging: LoggingConfig,

    pub fortigate: FortigateSettings,
}

impl CollectorConfig for FortigateCollectorConfig {
    fn zenoh(&self) -> &ZenohConfig {
        &self.zenoh
    }

    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn key_prefix(&self) -> &str {
        &self.fortigate.key_prefix
    }

    fn validate(&self) -> fortipoll_framework::Result<()> {
        self.fortigate
            .validate()
            .map_err(|e| FrameworkError::validation(e.to_string()))
    }
}

/// Connection settings for one Fortigate device.
///
/// Immutable once built: the collector takes it by value in `initialize`.
#[derive(Clone, Serialize, Deserialize)]
pub struct FortigateSettings {
    /// Hostname or IP of the device's management interface.
    pub hostname: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default, skip_serializing)]
    pub password: String,

    /// `false` (or the string "false") selects plain HTTP.
    #[serde(default = "default_https", deserialize_with = "deserialize_https")]
    pub https: bool,

    /// Virtual domain the resource query is scoped to.
    #[serde(default = "default_vdom")]
    pub vdom: String,

    /// Management port, when not the scheme default.
    #[serde(default)]
    pub port: Option<u16>,

    /// Verify the device's TLS certificate.
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// REST API token; when set, the login form is skipped.
    #[serde(default, skip_serializing)]
    pub api_token: Option<String>,

    /// Bound on every request to the device.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_user() -> String {
    "admin".to_string()
}

fn default_https() -> bool {
    true
}

fn default_vdom() -> String {
    "root".to_string()
}

fn default_verify_tls() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_poll_interval() -> u64 {
    60
}

fn default_key_prefix() -> String {
    KeyExprBuilder::new(COLLECTOR_NAME).prefix().to_string()
}

/// Transport selector: only the exact string "false" turns HTTPS off.
pub fn https_enabled(value: &str) -> bool {
    value != "false"
}

fn deserialize_https<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(on) => on,
        Flag::Text(text) => https_enabled(&text),
    })
}

impl FortigateSettings {
    /// Settings for `hostname` with every other key at its default.
    pub fn with_hostname(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            user: default_user(),
            password: String::new(),
            https: default_https(),
            vdom: default_vdom(),
            port: None,
            verify_tls: default_verify_tls(),
            api_token: None,
            timeout_ms: default_timeout_ms(),
            poll_interval_secs: default_poll_interval(),
            key_prefix: default_key_prefix(),
        }
    }

    /// Defaults of the base keys, as reported to the host.
    pub fn default_config() -> ConfigMap {
        let defaults = Self::with_hostname(String::new());
        [
            ("user", defaults.user),
            ("password", defaults.password),
            ("https", defaults.https.to_string()),
            ("vdom", defaults.vdom),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    /// Help text for every recognized key.
    pub fn config_help() -> ConfigMap {
        [
            ("hostname", "Hostname or IP to collect from"),
            ("user", "Username"),
            ("password", "Password"),
            ("https", "true or false: use https or http (http for eval)"),
            ("vdom", "Virtual domain whose resource usage is collected"),
            ("port", "Management port when not 443/80"),
            ("verify_tls", "Verify the device certificate (false for self-signed)"),
            ("api_token", "REST API token used instead of user/password login"),
            ("timeout_ms", "Per-request timeout in milliseconds"),
            ("poll_interval_secs", "Seconds between collections"),
            ("key_prefix", "Key expression prefix for published samples"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::Validation(
                "hostname cannot be empty".to_string(),
            ));
        }
        // The hostname becomes one key expression chunk.
        if self.hostname.contains(KEY_RESERVED) || self.hostname.contains('/') {
            return Err(ConfigError::Validation(format!(
                "hostname '{}' cannot be used in a key expression",
                self.hostname
            )));
        }
        if self.vdom.is_empty() {
            return Err(ConfigError::Validation("vdom cannot be empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        if let Some(reason) = key_prefix_problem(&self.key_prefix) {
            return Err(ConfigError::InvalidKeyPrefix {
                prefix: self.key_prefix.clone(),
                reason,
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Outer bound on a whole tick, slightly above the request timeout so
    /// the request's own error is the one reported.
    pub fn tick_timeout(&self) -> Duration {
        self.request_timeout() + Duration::from_secs(1)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Labels attached to every published sample.
    pub fn labels(&self) -> HashMap<String, String> {
        HashMap::from([("vdom".to_string(), self.vdom.clone())])
    }
}

impl fmt::Debug for FortigateSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FortigateSettings")
            .field("hostname", &self.hostname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("https", &self.https)
            .field("vdom", &self.vdom)
            .field("port", &self.port)
            .field("verify_tls", &self.verify_tls)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

/// Characters Zenoh reserves in key expressions.
const KEY_RESERVED: [char; 4] = ['*', '?', '#', '$'];

fn key_prefix_problem(prefix: &str) -> Option<&'static str> {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        Some("must not be empty")
    } else if trimmed.starts_with('/') {
        Some("must not start with '/'")
    } else if trimmed.contains(KEY_RESERVED) {
        Some("must not contain '*', '?', '#' or '$'")
    } else if trimmed.split('/').any(str::is_empty) {
        Some("must not contain empty chunks")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> ConfigMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{
            fortigate: { hostname: "fw1.example.com" }
        }"#;

        let config = FortigateCollectorConfig::parse(json).unwrap();
        let fgt = &config.fortigate;

        assert_eq!(fgt.hostname, "fw1.example.com");
        assert_eq!(fgt.user, "admin");
        assert_eq!(fgt.password, "");
        assert!(fgt.https);
        assert_eq!(fgt.vdom, "root");
        assert_eq!(fgt.timeout_ms, 5000);
        assert_eq!(fgt.poll_interval_secs, 60);
        assert_eq!(config.key_prefix(), "fortipoll/fortigate");
        assert_eq!(config.zenoh.mode, "peer");
        assert_eq!(config.serialization, Format::Json);
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            zenoh: { mode: "client", connect: ["tcp/10.0.0.5:7447"] },
            serialization: "cbor",
            logging: { level: "debug" },
            fortigate: {
                hostname: "10.1.1.1",
                user: "monitor",
                password: "secret",
                https: false,
                vdom: "dmz",
                port: 8080,
                verify_tls: false,
                timeout_ms: 2000,
                poll_interval_secs: 30,
                key_prefix: "lab/fgt",
            }
        }"#;

        let config = FortigateCollectorConfig::parse(json).unwrap();
        let fgt = &config.fortigate;

        assert_eq!(fgt.user, "monitor");
        assert!(!fgt.https);
        assert_eq!(fgt.vdom, "dmz");
        assert_eq!(fgt.port, Some(8080));
        assert!(!fgt.verify_tls);
        assert_eq!(fgt.request_timeout(), Duration::from_secs(2));
        assert_eq!(fgt.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.serialization, Format::Cbor);
        assert_eq!(config.key_prefix(), "lab/fgt");
    }

    #[test]
    fn test_https_accepts_strings() {
        let off = FortigateCollectorConfig::parse(
            r#"{ fortigate: { hostname: "fw", https: "false" } }"#,
        )
        .unwrap();
        assert!(!off.fortigate.https);

        let on = FortigateCollectorConfig::parse(
            r#"{ fortigate: { hostname: "fw", https: "true" } }"#,
        )
        .unwrap();
        assert!(on.fortigate.https);

        let other = FortigateCollectorConfig::parse(
            r#"{ fortigate: { hostname: "fw", https: "no" } }"#,
        )
        .unwrap();
        assert!(other.fortigate.https);
    }

    #[test]
    fn test_missing_hostname_is_rejected() {
        let result = FortigateCollectorConfig::parse(r#"{ fortigate: { user: "admin" } }"#);
        assert!(matches!(result, Err(FrameworkError::ConfigParse(_))));

        let result = FortigateCollectorConfig::parse(r#"{ fortigate: { hostname: "" } }"#);
        assert!(matches!(result, Err(FrameworkError::ConfigValidation(_))));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let result = FortigateCollectorConfig::parse(
            r#"{ fortigate: { hostname: "fw", poll_interval_secs: 0 } }"#,
        );
        assert!(matches!(result, Err(FrameworkError::ConfigValidation(_))));
    }

    #[test]
    fn test_default_config_mapping() {
        let defaults = FortigateSettings::default_config();

        assert_eq!(
            defaults,
            map(&[
                ("user", "admin"),
                ("https", "true"),
                ("vdom", "root"),
                ("password", ""),
            ])
        );
    }

    #[test]
    fn test_config_help_covers_base_keys() {
        let help = FortigateSettings::config_help();
        for key in ["hostname", "user", "password", "https", "vdom"] {
            assert!(help.contains_key(key), "missing help for {key}");
        }
    }

    #[test]
    fn test_default_config_matches_settings_defaults() {
        let defaults = FortigateSettings::default_config();
        let parsed = FortigateCollectorConfig::parse(r#"{ fortigate: { hostname: "fw" } }"#)
            .unwrap()
            .fortigate;

        assert_eq!(defaults["user"], parsed.user);
        assert_eq!(defaults["password"], parsed.password);
        assert_eq!(defaults["https"], parsed.https.to_string());
        assert_eq!(defaults["vdom"], parsed.vdom);

        let built = FortigateSettings::with_hostname("fw");
        assert_eq!(defaults["user"], built.user);
        assert_eq!(defaults["vdom"], built.vdom);
    }

    #[test]
    fn test_key_prefix_must_be_usable() {
        for prefix in ["/fortipoll", "lab/*/fgt", "lab/fgt?", "lab#", "$lab", "lab//fgt", "/"] {
            let mut settings = FortigateSettings::with_hostname("fw");
            settings.key_prefix = prefix.to_string();
            assert!(
                matches!(settings.validate(), Err(ConfigError::InvalidKeyPrefix { .. })),
                "prefix {prefix:?} should be rejected"
            );
        }

        let mut settings = FortigateSettings::with_hostname("fw");
        settings.key_prefix = "lab/fgt/".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_bad_key_prefix_rejected_at_load() {
        let result = FortigateCollectorConfig::parse(
            r#"{ fortigate: { hostname: "fw", key_prefix: "fortipoll/**" } }"#,
        );
        assert!(matches!(result, Err(FrameworkError::ConfigValidation(_))));
    }

    #[test]
    fn test_hostname_must_fit_one_key_chunk() {
        for hostname in ["fw/1", "fw*", "fw$1"] {
            assert!(FortigateSettings::with_hostname(hostname).validate().is_err());
        }
        assert!(FortigateSettings::with_hostname("fe80::1").validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut settings = FortigateSettings::with_hostname("fw");
        settings.password = "hunter2".to_string();
        settings.api_token = Some("tok-123".to_string());

        let debug = format!("{:?}", settings);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("tok-123"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_labels_carry_vdom() {
        let settings = FortigateSettings::with_hostname("fw");
        assert_eq!(settings.labels().get("vdom").map(String::as_str), Some("root"));
    }
}
