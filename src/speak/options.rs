//! Synthesis options, serialized into the request query string.

use url::Url;

/// Options for synthesis requests, shared by the one-shot and live
/// endpoints. Unset fields are omitted so the server applies its own
/// defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeakOptions {
    /// Voice model to synthesize with (e.g. "aura-asteria-en").
    pub model: Option<String>,
    /// Output audio encoding (e.g. "linear16", "mp3").
    pub encoding: Option<String>,
    /// Output sample rate in Hz.
    pub sample_rate: Option<u32>,
    /// Container format for encodings that support one (e.g. "wav").
    pub container: Option<String>,
    /// Bit rate for compressed encodings, in bits per second.
    pub bit_rate: Option<u32>,
}

impl SpeakOptions {
    /// Set the voice model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the output encoding.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Set the output sample rate in Hz.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    /// Set the container format.
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Set the bit rate in bits per second.
    pub fn with_bit_rate(mut self, bit_rate: u32) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    /// Serialize the set options onto a request URL.
    pub(crate) fn append_query(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        if let Some(model) = &self.model {
            pairs.append_pair("model", model);
        }
        if let Some(encoding) = &self.encoding {
            pairs.append_pair("encoding", encoding);
        }
        if let Some(sample_rate) = self.sample_rate {
            pairs.append_pair("sample_rate", &sample_rate.to_string());
        }
        if let Some(container) = &self.container {
            pairs.append_pair("container", container);
        }
        if let Some(bit_rate) = self.bit_rate {
            pairs.append_pair("bit_rate", &bit_rate.to_string());
        }
    }
}
