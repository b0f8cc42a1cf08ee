//! Client-wide configuration: credentials and endpoint options.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::errors::{AuricleError, Result};
use crate::live::{DEFAULT_KEEPALIVE_INTERVAL, ReconnectPolicy};

/// Default REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.auricle.com";

/// Default WebSocket endpoint.
pub const DEFAULT_WS_URL: &str = "wss://api.auricle.com";

/// Default per-request timeout for REST calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default TCP/TLS connect timeout for REST calls.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Credentials
// =============================================================================

/// Authentication material for the Auricle API.
///
/// The live connection core is agnostic to which mechanism is used; the
/// credential is rendered into an opaque `Authorization` header value at
/// request/open time.
#[derive(Clone)]
pub enum Credentials {
    /// Long-lived project API key, sent as `Authorization: Token <key>`.
    ApiKey(String),
    /// Short-lived access token, sent as `Authorization: Bearer <token>`.
    AccessToken(String),
}

impl Credentials {
    /// Build credentials from a project API key.
    pub fn api_key(key: impl Into<String>) -> Self {
        Credentials::ApiKey(key.into())
    }

    /// Build credentials from a temporary access token.
    pub fn access_token(token: impl Into<String>) -> Self {
        Credentials::AccessToken(token.into())
    }

    /// Render the `Authorization` header value.
    pub(crate) fn header_value(&self) -> String {
        match self {
            Credentials::ApiKey(key) => format!("Token {key}"),
            Credentials::AccessToken(token) => format!("Bearer {token}"),
        }
    }
}

// Manual Debug so secrets never leak into logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ApiKey(_) => write!(f, "Credentials::ApiKey(****)"),
            Credentials::AccessToken(_) => write!(f, "Credentials::AccessToken(****)"),
        }
    }
}

// =============================================================================
// Client Options
// =============================================================================

/// Endpoint and timeout configuration for [`crate::AuricleClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL for REST calls.
    pub api_url: Url,
    /// Base URL for live WebSocket connections.
    pub ws_url: Url,
    /// Per-request timeout applied to REST calls. Live connections have no
    /// operation-level timeout; their lifetime is caller-controlled.
    pub request_timeout: Duration,
    /// Connect timeout applied to REST calls.
    pub connect_timeout: Duration,
    /// Reconnect policy applied to live connections created through the
    /// client.
    pub live_reconnect: ReconnectPolicy,
    /// Keepalive interval for live connections; `None` disables the timer.
    pub live_keepalive: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            ws_url: Url::parse(DEFAULT_WS_URL).expect("default WS URL is valid"),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            live_reconnect: ReconnectPolicy::default(),
            live_keepalive: Some(DEFAULT_KEEPALIVE_INTERVAL),
        }
    }
}

impl ClientOptions {
    /// Override the REST base URL (self-hosted or proxy deployments).
    pub fn with_api_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.api_url = parse_endpoint(url.as_ref())?;
        Ok(self)
    }

    /// Override the WebSocket base URL.
    pub fn with_ws_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.ws_url = parse_endpoint(url.as_ref())?;
        Ok(self)
    }

    /// Override the per-request timeout for REST calls.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Override the connect timeout for REST calls.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the reconnect policy for live connections.
    pub fn with_live_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.live_reconnect = policy;
        self
    }

    /// Override the keepalive interval for live connections; `None`
    /// disables the timer.
    pub fn with_live_keepalive(mut self, interval: Option<Duration>) -> Self {
        self.live_keepalive = interval;
        self
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url =
        Url::parse(raw).map_err(|e| AuricleError::Config(format!("invalid endpoint {raw}: {e}")))?;
    if url.host_str().is_none() {
        return Err(AuricleError::Config(format!(
            "endpoint {raw} has no host component"
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_header_value() {
        let creds = Credentials::api_key("abc123");
        assert_eq!(creds.header_value(), "Token abc123");
    }

    #[test]
    fn test_access_token_header_value() {
        let creds = Credentials::access_token("jwt-token");
        assert_eq!(creds.header_value(), "Bearer jwt-token");
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials::api_key("super-secret");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("****"));
    }

    #[test]
    fn test_default_options() {
        let options = ClientOptions::default();
        assert_eq!(options.api_url.as_str(), "https://api.auricle.com/");
        assert_eq!(options.ws_url.scheme(), "wss");
        assert_eq!(options.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_endpoint_overrides() {
        let options = ClientOptions::default()
            .with_api_url("https://proxy.example.com/auricle")
            .unwrap()
            .with_ws_url("ws://localhost:8080")
            .unwrap();

        assert_eq!(options.api_url.host_str(), Some("proxy.example.com"));
        assert_eq!(options.ws_url.port(), Some(8080));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let result = ClientOptions::default().with_api_url("not a url");
        assert!(matches!(result, Err(AuricleError::Config(_))));
    }
}
