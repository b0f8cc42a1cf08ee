//! Text intelligence client.

use std::sync::Arc;

use serde_json::{Value, json};
use url::Url;

use super::options::ReadOptions;
use crate::client::ClientInner;
use crate::errors::{AuricleError, Result};

/// REST path for text intelligence.
pub const READ_PATH: &str = "/v1/read";

/// Text intelligence entry point, obtained from
/// [`crate::AuricleClient::read`].
#[derive(Clone)]
pub struct ReadClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl ReadClient {
    /// Analyze raw text. At least one analysis must be selected in
    /// `options`.
    pub async fn analyze_text(
        &self,
        text: impl AsRef<str>,
        options: &ReadOptions,
    ) -> Result<Value> {
        let url = self.rest_url(options)?;
        self.inner
            .rest
            .post_json(url, &json!({ "text": text.as_ref() }))
            .await
    }

    /// Analyze text hosted at a URL.
    pub async fn analyze_url(
        &self,
        text_url: impl AsRef<str>,
        options: &ReadOptions,
    ) -> Result<Value> {
        let url = self.rest_url(options)?;
        self.inner
            .rest
            .post_json(url, &json!({ "url": text_url.as_ref() }))
            .await
    }

    fn rest_url(&self, options: &ReadOptions) -> Result<Url> {
        if options.is_empty() {
            return Err(AuricleError::Config(
                "at least one analysis must be enabled".to_string(),
            ));
        }
        let mut url = self
            .inner
            .options
            .api_url
            .join(READ_PATH)
            .map_err(|e| AuricleError::Config(format!("invalid read endpoint: {e}")))?;
        options.append_query(&mut url);
        Ok(url)
    }
}
