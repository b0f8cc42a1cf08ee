//! Transcription options, serialized into the request query string.

use url::Url;

/// Options for transcription requests, shared by the pre-recorded and live
/// endpoints. Unset fields are omitted from the query string so the server
/// applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListenOptions {
    /// Model to transcribe with (e.g. "nova-3").
    pub model: Option<String>,
    /// BCP-47 language tag (e.g. "en-US").
    pub language: Option<String>,
    /// Audio encoding of the submitted stream (e.g. "linear16").
    pub encoding: Option<String>,
    /// Sample rate of the submitted audio in Hz.
    pub sample_rate: Option<u32>,
    /// Number of audio channels.
    pub channels: Option<u16>,
    /// Add punctuation and capitalization.
    pub punctuate: Option<bool>,
    /// Apply smart formatting to dates, numbers, and similar entities.
    pub smart_format: Option<bool>,
    /// Stream interim (non-final) results (live only).
    pub interim_results: Option<bool>,
    /// Label speakers in multi-speaker audio.
    pub diarize: Option<bool>,
    /// Silence duration in milliseconds that ends an utterance (live only).
    pub endpointing_ms: Option<u32>,
    /// Emit `SpeechStarted`/`UtteranceEnd` voice-activity events (live only).
    pub vad_events: Option<bool>,
}

impl ListenOptions {
    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the language tag.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the audio encoding.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Set the sample rate in Hz.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    /// Set the channel count.
    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Enable or disable punctuation.
    pub fn with_punctuate(mut self, punctuate: bool) -> Self {
        self.punctuate = Some(punctuate);
        self
    }

    /// Enable or disable smart formatting.
    pub fn with_smart_format(mut self, smart_format: bool) -> Self {
        self.smart_format = Some(smart_format);
        self
    }

    /// Enable or disable interim results (live only).
    pub fn with_interim_results(mut self, interim_results: bool) -> Self {
        self.interim_results = Some(interim_results);
        self
    }

    /// Enable or disable speaker diarization.
    pub fn with_diarize(mut self, diarize: bool) -> Self {
        self.diarize = Some(diarize);
        self
    }

    /// Set the endpointing silence threshold in milliseconds (live only).
    pub fn with_endpointing_ms(mut self, endpointing_ms: u32) -> Self {
        self.endpointing_ms = Some(endpointing_ms);
        self
    }

    /// Enable or disable voice-activity events (live only).
    pub fn with_vad_events(mut self, vad_events: bool) -> Self {
        self.vad_events = Some(vad_events);
        self
    }

    /// Serialize the set options onto a request URL.
    pub(crate) fn append_query(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        if let Some(model) = &self.model {
            pairs.append_pair("model", model);
        }
        if let Some(language) = &self.language {
            pairs.append_pair("language", language);
        }
        if let Some(encoding) = &self.encoding {
            pairs.append_pair("encoding", encoding);
        }
        if let Some(sample_rate) = self.sample_rate {
            pairs.append_pair("sample_rate", &sample_rate.to_string());
        }
        if let Some(channels) = self.channels {
            pairs.append_pair("channels", &channels.to_string());
        }
        if let Some(punctuate) = self.punctuate {
            pairs.append_pair("punctuate", bool_str(punctuate));
        }
        if let Some(smart_format) = self.smart_format {
            pairs.append_pair("smart_format", bool_str(smart_format));
        }
        if let Some(interim_results) = self.interim_results {
            pairs.append_pair("interim_results", bool_str(interim_results));
        }
        if let Some(diarize) = self.diarize {
            pairs.append_pair("diarize", bool_str(diarize));
        }
        if let Some(endpointing_ms) = self.endpointing_ms {
            pairs.append_pair("endpointing", &endpointing_ms.to_string());
        }
        if let Some(vad_events) = self.vad_events {
            pairs.append_pair("vad_events", bool_str(vad_events));
        }
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_of(options: &ListenOptions) -> String {
        let mut url = Url::parse("wss://api.auricle.com/v1/listen").unwrap();
        options.append_query(&mut url);
        url.query().unwrap_or_default().to_string()
    }

    #[test]
    fn test_default_options_add_no_query() {
        let options = ListenOptions::default();
        assert_eq!(query_of(&options), "");
    }

    #[test]
    fn test_full_query_serialization() {
        let options = ListenOptions::default()
            .with_model("nova-3")
            .with_language("en-US")
            .with_encoding("linear16")
            .with_sample_rate(16000)
            .with_channels(1)
            .with_punctuate(true)
            .with_interim_results(true)
            .with_endpointing_ms(300)
            .with_vad_events(true);

        let query = query_of(&options);
        assert!(query.contains("model=nova-3"));
        assert!(query.contains("language=en-US"));
        assert!(query.contains("encoding=linear16"));
        assert!(query.contains("sample_rate=16000"));
        assert!(query.contains("channels=1"));
        assert!(query.contains("punctuate=true"));
        assert!(query.contains("interim_results=true"));
        assert!(query.contains("endpointing=300"));
        assert!(query.contains("vad_events=true"));
    }

    #[test]
    fn test_false_flags_serialized_explicitly() {
        let options = ListenOptions::default().with_smart_format(false);
        assert_eq!(query_of(&options), "smart_format=false");
    }

    #[test]
    fn test_query_values_are_encoded() {
        let options = ListenOptions::default().with_model("custom model");
        assert_eq!(query_of(&options), "model=custom+model");
    }
}
