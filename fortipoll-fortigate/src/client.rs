//! FortiOS management API client.
//!
//! Only the three calls the collector needs: transport selection, login,
//! and monitor queries.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::FortigateSettings;

const LOGIN_PATH: &str = "logincheck";
const MONITOR_PATH: &str = "api/v2/monitor";

/// Errors from the FortiOS API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP/TLS backend could not be constructed.
    #[error("HTTP client backend unavailable: {0}")]
    Backend(String),

    #[error("Invalid device address '{address}': {message}")]
    InvalidAddress { address: String, message: String },

    #[error("{url}: request timed out")]
    Timeout { url: String },

    #[error("{url}: request failed: {message}")]
    Request { url: String, message: String },

    #[error("{url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Login rejected for user '{user}' on {host}")]
    LoginRejected { host: String, user: String },

    #[error("{url}: API returned status '{status}'")]
    Api { url: String, status: String },

    #[error("{url}: failed to decode response: {message}")]
    Decode { url: String, message: String },

    #[error("No session: login has not been performed")]
    NotLoggedIn,
}

impl ClientError {
    fn from_reqwest(url: &Url, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Request {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// The device API as seen by the collector.
///
/// `monitor` takes `&self`: once logged in, the session is only read.
pub trait FortiosApi: Send + Sync {
    /// Select `https://` (`true`) or `http://` (`false`) for subsequent calls.
    fn set_transport_mode(&mut self, https: bool);

    /// Authenticate against `host`, keeping the session for later calls.
    fn login(
        &mut self,
        host: &str,
        user: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Query `/api/v2/monitor/<category>/<endpoint>/<mkey>?vdom=<vdom>` and
    /// return the `results` member of the response.
    fn monitor(
        &self,
        category: &str,
        endpoint: &str,
        mkey: &str,
        vdom: &str,
    ) -> impl Future<Output = Result<serde_json::Value, ClientError>> + Send;
}

/// Options for building a [`FortiosClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub verify_tls: bool,
    pub port: Option<u16>,
    pub api_token: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            verify_tls: true,
            port: None,
            api_token: None,
        }
    }
}

/// Response envelope shared by every FortiOS REST endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<String>,
    results: serde_json::Value,
}

/// reqwest-backed FortiOS client with a cookie-held session.
pub struct FortiosClient {
    http: Client,
    https: bool,
    port: Option<u16>,
    api_token: Option<String>,
    base_url: Option<Url>,
}

impl FortiosClient {
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        let mut builder = Client::builder()
            .timeout(options.timeout)
            .cookie_store(true);

        if !options.verify_tls {
            // Fortigates ship with a self-signed certificate.
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| ClientError::Backend(e.to_string()))?;

        Ok(Self {
            http,
            https: true,
            port: options.port,
            api_token: options.api_token,
            base_url: None,
        })
    }

    pub fn from_settings(settings: &FortigateSettings) -> Result<Self, ClientError> {
        Self::new(ClientOptions {
            timeout: settings.request_timeout(),
            verify_tls: settings.verify_tls,
            port: settings.port,
            api_token: settings.api_token.clone(),
        })
    }

    /// Base URL of the logged-in device.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    fn device_url(&self, host: &str) -> Result<Url, ClientError> {
        let scheme = if self.https { "https" } else { "http" };
        let invalid = |message: String| ClientError::InvalidAddress {
            address: host.to_string(),
            message,
        };

        let mut url = Url::parse(&format!("{scheme}://{host}/")).map_err(|e| invalid(e.to_string()))?;
        if let Some(port) = self.port {
            url.set_port(Some(port))
                .map_err(|_| invalid(format!("cannot set port {port}")))?;
        }
        Ok(url)
    }
}

fn join(base: &Url, path: &str) -> Result<Url, ClientError> {
    base.join(path).map_err(|e| ClientError::InvalidAddress {
        address: base.to_string(),
        message: e.to_string(),
    })
}

/// Build the monitor URL for a query.
pub fn monitor_url(
    base: &Url,
    category: &str,
    endpoint: &str,
    mkey: &str,
    vdom: &str,
) -> Result<Url, ClientError> {
    let mut url = join(base, &format!("{MONITOR_PATH}/{category}/{endpoint}/{mkey}"))?;
    url.query_pairs_mut().append_pair("vdom", vdom);
    Ok(url)
}

impl FortiosApi for FortiosClient {
    fn set_transport_mode(&mut self, https: bool) {
        self.https = https;
    }

    async fn login(&mut self, host: &str, user: &str, password: &str) -> Result<(), ClientError> {
        let base = self.device_url(host)?;

        if self.api_token.is_some() {
            debug!(url = %base, "Using API token, skipping login form");
            self.base_url = Some(base);
            return Ok(());
        }

        let url = join(&base, LOGIN_PATH)?;
        let response = self
            .http
            .post(url.clone())
            .form(&[("username", user), ("secretkey", password), ("ajax", "1")])
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(&url, e))?;

        // FortiOS answers 200 either way; the body starts with "1" on success.
        if !body.trim_start().starts_with('1') {
            return Err(ClientError::LoginRejected {
                host: host.to_string(),
                user: user.to_string(),
            });
        }

        debug!(url = %base, user, "Login accepted");
        self.base_url = Some(base);
        Ok(())
    }

    async fn monitor(
        &self,
        category: &str,
        endpoint: &str,
        mkey: &str,
        vdom: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let base = self.base_url.as_ref().ok_or(ClientError::NotLoggedIn)?;
        let url = monitor_url(base, category, endpoint, mkey, vdom)?;

        let mut request = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let envelope: Envelope = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::from_reqwest(&url, e)
            } else {
                ClientError::Decode {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        match envelope.status.as_deref() {
            None | Some("success") => Ok(envelope.results),
            Some(other) => Err(ClientError::Api {
                url: url.to_string(),
                status: other.to_string(),
            }),
        }
    }
}
