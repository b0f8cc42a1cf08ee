//! Thin authenticated wrapper around `reqwest` for the REST endpoints.

use bytes::Bytes;
use reqwest::Response;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::errors::{AuricleError, Result};
use crate::options::{ClientOptions, Credentials};

/// User-Agent header value for API requests.
const USER_AGENT: &str = concat!("auricle-rust/", env!("CARGO_PKG_VERSION"));

/// Maximum number of error-body bytes echoed into an error message.
const MAX_ERROR_BODY_LEN: usize = 512;

/// Shared REST client: one connection pool per [`crate::AuricleClient`].
#[derive(Clone)]
pub(crate) struct RestClient {
    http: reqwest::Client,
    credentials: Credentials,
}

impl RestClient {
    pub(crate) fn new(credentials: Credentials, options: &ClientOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .connect_timeout(options.connect_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, credentials })
    }

    /// POST a JSON body, expecting a JSON response.
    pub(crate) async fn post_json(&self, url: Url, body: &Value) -> Result<Value> {
        debug!("POST {}", url);
        let response = self
            .http
            .post(url)
            .header("Authorization", self.credentials.header_value())
            .json(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// POST a raw binary body, expecting a JSON response.
    pub(crate) async fn post_bytes(
        &self,
        url: Url,
        body: Bytes,
        content_type: &str,
    ) -> Result<Value> {
        debug!("POST {} ({} bytes)", url, body.len());
        let response = self
            .http
            .post(url)
            .header("Authorization", self.credentials.header_value())
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// POST a JSON body, returning the raw response for audio download or
    /// chunked streaming.
    pub(crate) async fn post_for_audio(&self, url: Url, body: &Value) -> Result<Response> {
        debug!("POST {}", url);
        let response = self
            .http
            .post(url)
            .header("Authorization", self.credentials.header_value())
            .json(body)
            .send()
            .await?;
        Self::check(response).await
    }

    /// Map non-success statuses into [`AuricleError::Api`] with whatever
    /// detail the body carries.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AuricleError::Api {
            status: status.as_u16(),
            message: extract_error_message(&body),
        })
    }
}

/// Pull a human-readable message out of an error body. The API answers with
/// `{"err_code": ..., "err_msg": ...}`; proxies may answer with anything.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["err_msg", "message", "error", "reason"] {
            if let Some(message) = value.get(key).and_then(Value::as_str) {
                return message.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no error detail provided".to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY_LEN).collect()
}
