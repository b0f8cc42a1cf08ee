//! Wire-level message types for live connections.
//!
//! Outbound control frames are JSON objects with a `type` discriminator:
//!
//! - [`ControlMessage::KeepAlive`]: liveness signal, no payload
//! - [`ControlMessage::CloseStream`]: end-of-stream (speech-to-text)
//! - [`ControlMessage::Close`]: end-of-stream (text-to-speech)
//! - [`ControlMessage::Flush`]: emit buffered synthesized audio now
//! - [`ControlMessage::Speak`]: text submission for synthesis
//!
//! Inbound text frames carry the same `type` discriminator; classification
//! into event kinds lives in the frame codec.

use bytes::Bytes;
use serde::Serialize;

// =============================================================================
// Outbound Units
// =============================================================================

/// One item awaiting transmission on a live connection.
///
/// Exclusively owned by the send queue until drained onto the transport; a
/// unit is never handed to more than one socket handle.
#[derive(Debug, Clone)]
pub enum OutboundUnit {
    /// Raw audio bytes (speech-to-text input).
    Binary(Bytes),
    /// JSON control frame.
    Control(ControlMessage),
    /// Raw text payload.
    Text(String),
}

// =============================================================================
// Control Messages (Client to Server)
// =============================================================================

/// JSON control frames sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// Periodic liveness signal preventing idle-timeout disconnects.
    KeepAlive,
    /// End-of-input signal for a transcription stream. The server drains
    /// pending audio, sends final results, then closes the socket.
    CloseStream,
    /// End-of-input signal for a synthesis stream.
    Close,
    /// Ask the server to emit any buffered synthesized audio immediately,
    /// without ending the session. Acknowledged with a `Flushed` frame.
    Flush,
    /// Submit text for synthesis.
    Speak {
        /// The text to synthesize.
        text: String,
    },
}

impl ControlMessage {
    /// Serialize to the wire JSON string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Inbound Discriminators (Server to Client)
// =============================================================================

/// `type` value of transcription result frames.
pub const TYPE_RESULTS: &str = "Results";
/// `type` value of session metadata frames.
pub const TYPE_METADATA: &str = "Metadata";
/// `type` value of speech-onset frames.
pub const TYPE_SPEECH_STARTED: &str = "SpeechStarted";
/// `type` value of utterance-end frames.
pub const TYPE_UTTERANCE_END: &str = "UtteranceEnd";
/// `type` value of flush acknowledgements.
pub const TYPE_FLUSHED: &str = "Flushed";
/// `type` value of non-fatal warnings.
pub const TYPE_WARNING: &str = "Warning";
/// `type` value of server error frames.
pub const TYPE_ERROR: &str = "Error";
