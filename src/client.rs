//! Root client factory.

use std::sync::Arc;

use crate::errors::{AuricleError, Result};
use crate::http::RestClient;
use crate::listen::ListenClient;
use crate::options::{ClientOptions, Credentials};
use crate::read::ReadClient;
use crate::speak::SpeakClient;

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "AURICLE_API_KEY";
/// Environment variable overriding the REST endpoint.
pub const ENV_API_URL: &str = "AURICLE_API_URL";
/// Environment variable overriding the WebSocket endpoint.
pub const ENV_WS_URL: &str = "AURICLE_WS_URL";

pub(crate) struct ClientInner {
    pub(crate) credentials: Credentials,
    pub(crate) options: ClientOptions,
    pub(crate) rest: RestClient,
}

/// Entry point to the Auricle API.
///
/// Cheap to clone; all clones share one HTTP connection pool.
///
/// # Example
///
/// ```rust,no_run
/// use auricle::{AuricleClient, Credentials};
///
/// # fn main() -> auricle::Result<()> {
/// let client = AuricleClient::new(Credentials::api_key("your-api-key"))?;
/// let listen = client.listen();
/// let speak = client.speak();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuricleClient {
    inner: Arc<ClientInner>,
}

impl AuricleClient {
    /// Build a client with default endpoints and policies.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_options(credentials, ClientOptions::default())
    }

    /// Build a client with custom endpoint, timeout, and live-connection
    /// options.
    pub fn with_options(credentials: Credentials, options: ClientOptions) -> Result<Self> {
        let rest = RestClient::new(credentials.clone(), &options)?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                credentials,
                options,
                rest,
            }),
        })
    }

    /// Build a client from `AURICLE_API_KEY` and the optional
    /// `AURICLE_API_URL`/`AURICLE_WS_URL` overrides.
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(ENV_API_KEY)
            .map_err(|_| AuricleError::Config(format!("{ENV_API_KEY} is not set")))?;
        let mut options = ClientOptions::default();
        if let Ok(api_url) = std::env::var(ENV_API_URL) {
            options = options.with_api_url(&api_url)?;
        }
        if let Ok(ws_url) = std::env::var(ENV_WS_URL) {
            options = options.with_ws_url(&ws_url)?;
        }
        Self::with_options(Credentials::api_key(key), options)
    }

    /// The options this client was built with.
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// Speech-to-text APIs.
    pub fn listen(&self) -> ListenClient {
        ListenClient {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Text-to-speech APIs.
    pub fn speak(&self) -> SpeakClient {
        SpeakClient {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Text intelligence APIs.
    pub fn read(&self) -> ReadClient {
        ReadClient {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::ReconnectPolicy;

    #[test]
    fn test_client_construction() {
        let client = AuricleClient::new(Credentials::api_key("key")).unwrap();
        let _ = client.listen();
        let _ = client.speak();
    }

    #[test]
    fn test_live_policy_override() {
        let options = ClientOptions::default()
            .with_live_reconnect(ReconnectPolicy::disabled())
            .with_live_keepalive(None);
        let client = AuricleClient::with_options(Credentials::api_key("key"), options).unwrap();

        assert!(!client.options().live_reconnect.enabled);
        assert!(client.options().live_keepalive.is_none());
    }

    #[test]
    fn test_clones_share_inner() {
        let client = AuricleClient::new(Credentials::api_key("key")).unwrap();
        let clone = client.clone();
        assert!(Arc::ptr_eq(&client.inner, &clone.inner));
    }
}
