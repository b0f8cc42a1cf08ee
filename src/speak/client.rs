//! Text-to-speech client: one-shot synthesis and the live streaming factory.

use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::json;
use tracing::info;
use url::Url;

use super::options::SpeakOptions;
use crate::client::ClientInner;
use crate::errors::{AuricleError, Result};
use crate::live::{LiveBuilder, LiveConnection, StreamDirection};

/// REST and WebSocket path for synthesis.
pub const SPEAK_PATH: &str = "/v1/speak";

/// Text-to-speech entry point, obtained from [`crate::AuricleClient::speak`].
#[derive(Clone)]
pub struct SpeakClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl SpeakClient {
    /// Synthesize text to a complete audio buffer.
    pub async fn synthesize(&self, text: impl AsRef<str>, options: &SpeakOptions) -> Result<Bytes> {
        let text = text.as_ref();
        validate_text(text)?;
        let url = self.rest_url(options)?;
        info!("synthesizing {} characters", text.len());
        let response = self
            .inner
            .rest
            .post_for_audio(url, &json!({ "text": text }))
            .await?;
        Ok(response.bytes().await?)
    }

    /// Synthesize text, yielding audio chunks as they arrive instead of
    /// buffering the whole response.
    pub async fn synthesize_stream(
        &self,
        text: &str,
        options: &SpeakOptions,
    ) -> Result<impl Stream<Item = Result<Bytes>> + use<>> {
        validate_text(text)?;
        let url = self.rest_url(options)?;
        let response = self
            .inner
            .rest
            .post_for_audio(url, &json!({ "text": text }))
            .await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(AuricleError::from)))
    }

    /// Open a live synthesis connection.
    ///
    /// Returns immediately in the `Connecting` state. Submit text with
    /// [`LiveConnection::send_text`], request early audio with
    /// [`LiveConnection::flush`], and end the stream with
    /// [`LiveConnection::finish`]; synthesized audio arrives as
    /// [`crate::live::LiveEventKind::Audio`] events.
    pub fn live(&self, options: &SpeakOptions) -> Result<LiveConnection> {
        let mut url = self
            .inner
            .options
            .ws_url
            .join(SPEAK_PATH)
            .map_err(|e| AuricleError::Config(format!("invalid speak endpoint: {e}")))?;
        options.append_query(&mut url);

        Ok(LiveBuilder::new(url, StreamDirection::Speak)
            .auth_header(self.inner.credentials.header_value())
            .reconnect_policy(self.inner.options.live_reconnect.clone())
            .keepalive(self.inner.options.live_keepalive)
            .start())
    }

    fn rest_url(&self, options: &SpeakOptions) -> Result<Url> {
        let mut url = self
            .inner
            .options
            .api_url
            .join(SPEAK_PATH)
            .map_err(|e| AuricleError::Config(format!("invalid speak endpoint: {e}")))?;
        options.append_query(&mut url);
        Ok(url)
    }
}

fn validate_text(text: &str) -> Result<()> {
    if text.is_empty() {
        return Err(AuricleError::Config(
            "synthesis text must not be empty".to_string(),
        ));
    }
    Ok(())
}
