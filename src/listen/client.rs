//! Speech-to-text client: pre-recorded REST transcription and the live
//! streaming factory.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::{Value, json};
use tracing::info;
use url::Url;

use super::options::ListenOptions;
use crate::client::ClientInner;
use crate::errors::{AuricleError, Result};
use crate::live::{LiveBuilder, LiveConnection, StreamDirection};

/// REST and WebSocket path for transcription.
pub const LISTEN_PATH: &str = "/v1/listen";

/// Speech-to-text entry point, obtained from
/// [`crate::AuricleClient::listen`].
#[derive(Clone)]
pub struct ListenClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl ListenClient {
    /// Transcribe audio hosted at a URL.
    ///
    /// The response is returned as raw JSON; field layout follows the API
    /// documentation.
    pub async fn transcribe_url(
        &self,
        audio_url: impl AsRef<str>,
        options: &ListenOptions,
    ) -> Result<Value> {
        let url = self.rest_url(options)?;
        info!("transcribing hosted audio");
        self.inner
            .rest
            .post_json(url, &json!({ "url": audio_url.as_ref() }))
            .await
    }

    /// Transcribe a raw audio buffer.
    ///
    /// `content_type` describes the buffer (e.g. `audio/wav`).
    pub async fn transcribe_buffer(
        &self,
        audio: impl Into<Bytes>,
        content_type: &str,
        options: &ListenOptions,
    ) -> Result<Value> {
        let audio = audio.into();
        if audio.is_empty() {
            return Err(AuricleError::Config(
                "audio buffer must not be empty".to_string(),
            ));
        }
        let url = self.rest_url(options)?;
        self.inner.rest.post_bytes(url, audio, content_type).await
    }

    /// Open a live transcription connection.
    ///
    /// Returns immediately in the `Connecting` state; subscribe to
    /// [`crate::live::LiveEventKind::Open`] to learn when the socket is
    /// ready. Sends issued before then are queued.
    pub fn live(&self, options: &ListenOptions) -> Result<LiveConnection> {
        let mut url = self
            .inner
            .options
            .ws_url
            .join(LISTEN_PATH)
            .map_err(|e| AuricleError::Config(format!("invalid listen endpoint: {e}")))?;
        options.append_query(&mut url);

        Ok(LiveBuilder::new(url, StreamDirection::Listen)
            .auth_header(self.inner.credentials.header_value())
            .reconnect_policy(self.inner.options.live_reconnect.clone())
            .keepalive(self.inner.options.live_keepalive)
            .start())
    }

    fn rest_url(&self, options: &ListenOptions) -> Result<Url> {
        let mut url = self
            .inner
            .options
            .api_url
            .join(LISTEN_PATH)
            .map_err(|e| AuricleError::Config(format!("invalid listen endpoint: {e}")))?;
        options.append_query(&mut url);
        Ok(url)
    }
}
