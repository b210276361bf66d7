/// Root of every FortiPoll key expression.
pub const KEY_PREFIX: &str = "fortipoll";

/// Builder for FortiPoll key expressions.
///
/// Keys follow `<prefix>/<collector>/<source>/<metric>`.
#[derive(Debug, Clone)]
pub struct KeyExprBuilder {
    prefix: String,
}

impl KeyExprBuilder {
    /// Builder rooted at `fortipoll/<collector>`.
    pub fn new(collector: &str) -> Self {
        Self {
            prefix: format!("{}/{}", KEY_PREFIX, collector),
        }
    }

    /// Builder rooted at an explicit prefix (already including the collector).
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Key for one metric of one source.
    ///
    /// # Example
    /// ```
    /// use fortipoll_common::keyexpr::KeyExprBuilder;
    ///
    /// let builder = KeyExprBuilder::new("fortigate");
    /// assert_eq!(builder.build("fw1", "cpu"), "fortipoll/fortigate/fw1/cpu");
    /// ```
    pub fn build(&self, source: &str, metric: &str) -> String {
        format!("{}/{}/{}", self.prefix, source, metric)
    }

    /// Key for collector status messages.
    ///
    /// # Example
    /// ```
    /// use fortipoll_common::keyexpr::KeyExprBuilder;
    ///
    /// let builder = KeyExprBuilder::new("fortigate");
    /// assert_eq!(builder.status_key(), "fortipoll/fortigate/@/status");
    /// ```
    pub fn status_key(&self) -> String {
        format!("{}/@/status", self.prefix)
    }
}
