//! Configuration loading for collectors.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{FrameworkError, Result};
use crate::{LoggingConfig, ZenohConfig};

/// Trait for a collector's top-level configuration file.
///
/// # Example
///
/// ```ignore
/// use serde::Deserialize;
/// use fortipoll_framework::{CollectorConfig, FrameworkError, LoggingConfig, ZenohConfig};
///
/// #[derive(Debug, Deserialize)]
/// pub struct MyConfig {
///     #[serde(default)]
///     pub zenoh: ZenohConfig,
///     #[serde(default)]
///     pub logging: LoggingConfig,
///     pub device: MyDeviceSettings,
/// }
///
/// impl CollectorConfig for MyConfig {
///     fn zenoh(&self) -> &ZenohConfig { &self.zenoh }
///     fn logging(&self) -> &LoggingConfig { &self.logging }
///     fn key_prefix(&self) -> &str { &self.device.key_prefix }
///
///     fn validate(&self) -> fortipoll_framework::Result<()> {
///         if self.device.host.is_empty() {
///             return Err(FrameworkError::validation("host must not be empty"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait CollectorConfig: Sized + DeserializeOwned {
    fn zenoh(&self) -> &ZenohConfig;

    fn logging(&self) -> &LoggingConfig;

    /// Key expression prefix samples are published under.
    fn key_prefix(&self) -> &str;

    /// Called by [`load`](Self::load) and [`parse`](Self::parse) after deserializing.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Parse and validate a JSON5 document.
    fn parse(content: &str) -> Result<Self> {
        let config: Self = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON5 file.
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(FrameworkError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }
}
