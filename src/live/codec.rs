//! Frame codec: translation between domain units/events and wire frames.
//!
//! Outbound, the mapping is mechanical: binary chunks pass through untouched,
//! control messages become UTF-8 JSON text, text payloads become text frames.
//! Inbound, binary frames are audio; text frames are parsed as JSON and
//! dispatched on the `type` discriminator. Unknown discriminators surface as
//! `Unhandled` events and parse failures as `Error` events - nothing is
//! silently dropped and nothing is thrown back into the transport's read
//! path.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::event::{ErrorEvent, LiveEvent};
use super::messages::{
    ControlMessage, OutboundUnit, TYPE_ERROR, TYPE_FLUSHED, TYPE_METADATA, TYPE_RESULTS,
    TYPE_SPEECH_STARTED, TYPE_UTTERANCE_END, TYPE_WARNING,
};
use super::transport::WireFrame;
use crate::errors::{AuricleError, Result};

/// Result of classifying one inbound wire frame.
#[derive(Debug)]
pub(crate) enum DecodedFrame {
    /// A frame to publish to subscribers.
    Event(LiveEvent),
    /// A close frame; lifecycle handling belongs to the session.
    Close {
        /// WebSocket close code.
        code: u16,
        /// Close reason, possibly empty.
        reason: String,
    },
}

/// Stateless codec between [`OutboundUnit`]/[`LiveEvent`] and [`WireFrame`].
pub(crate) struct FrameCodec;

impl FrameCodec {
    /// Serialize one outbound unit to its wire representation.
    pub(crate) fn encode(unit: OutboundUnit) -> Result<WireFrame> {
        match unit {
            OutboundUnit::Binary(bytes) => Ok(WireFrame::Binary(bytes)),
            OutboundUnit::Control(message) => Ok(WireFrame::Text(message.to_json()?)),
            OutboundUnit::Text(text) => Ok(WireFrame::Text(text)),
        }
    }

    /// Convenience encoder for control frames.
    pub(crate) fn encode_control(message: ControlMessage) -> Result<WireFrame> {
        Self::encode(OutboundUnit::Control(message))
    }

    /// Classify one inbound frame.
    pub(crate) fn decode(frame: WireFrame) -> DecodedFrame {
        match frame {
            WireFrame::Binary(bytes) => DecodedFrame::Event(LiveEvent::Audio(bytes)),
            WireFrame::Close { code, reason } => DecodedFrame::Close { code, reason },
            WireFrame::Text(text) => DecodedFrame::Event(Self::decode_text(&text)),
        }
    }

    fn decode_text(text: &str) -> LiveEvent {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                warn!("malformed server frame: {}", e);
                return LiveEvent::Error(ErrorEvent::Client(Arc::new(AuricleError::Protocol(
                    format!("malformed server frame: {e}"),
                ))));
            }
        };

        let Some(event_type) = value.get("type").and_then(Value::as_str) else {
            return LiveEvent::Error(ErrorEvent::Client(Arc::new(AuricleError::Protocol(
                "server frame missing type discriminator".to_string(),
            ))));
        };

        match event_type {
            TYPE_RESULTS => LiveEvent::Transcript(value),
            TYPE_METADATA => LiveEvent::Metadata(value),
            TYPE_SPEECH_STARTED => LiveEvent::SpeechStarted(value),
            TYPE_UTTERANCE_END => LiveEvent::UtteranceEnd(value),
            TYPE_FLUSHED => LiveEvent::Flushed(value),
            TYPE_WARNING => LiveEvent::Warning(value),
            TYPE_ERROR => LiveEvent::Error(ErrorEvent::Server(value)),
            _ => LiveEvent::Unhandled(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::event::LiveEventKind;
    use bytes::Bytes;

    fn decode_event(frame: WireFrame) -> LiveEvent {
        match FrameCodec::decode(frame) {
            DecodedFrame::Event(event) => event,
            DecodedFrame::Close { .. } => panic!("expected event, got close"),
        }
    }

    #[test]
    fn test_encode_binary_passthrough() {
        let bytes = Bytes::from_static(&[0x01, 0x02, 0x03]);
        match FrameCodec::encode(OutboundUnit::Binary(bytes.clone())).unwrap() {
            WireFrame::Binary(out) => assert_eq!(out, bytes),
            other => panic!("expected binary frame, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_control_to_json_text() {
        match FrameCodec::encode_control(ControlMessage::KeepAlive).unwrap() {
            WireFrame::Text(text) => assert_eq!(text, r#"{"type":"KeepAlive"}"#),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_text_passthrough() {
        match FrameCodec::encode(OutboundUnit::Text("hello".to_string())).unwrap() {
            WireFrame::Text(text) => assert_eq!(text, "hello"),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_binary_as_audio() {
        let event = decode_event(WireFrame::Binary(Bytes::from_static(b"\xde\xad")));
        assert_eq!(event.kind(), LiveEventKind::Audio);
    }

    #[test]
    fn test_decode_results_as_transcript() {
        let event = decode_event(WireFrame::Text(
            r#"{"type":"Results","is_final":true}"#.to_string(),
        ));
        match event {
            LiveEvent::Transcript(value) => assert_eq!(value["is_final"], true),
            other => panic!("expected transcript, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_known_discriminators() {
        let cases = [
            (r#"{"type":"Metadata"}"#, LiveEventKind::Metadata),
            (r#"{"type":"SpeechStarted"}"#, LiveEventKind::SpeechStarted),
            (r#"{"type":"UtteranceEnd"}"#, LiveEventKind::UtteranceEnd),
            (r#"{"type":"Flushed"}"#, LiveEventKind::Flushed),
            (r#"{"type":"Warning"}"#, LiveEventKind::Warning),
        ];
        for (raw, kind) in cases {
            let event = decode_event(WireFrame::Text(raw.to_string()));
            assert_eq!(event.kind(), kind, "frame {raw}");
        }
    }

    #[test]
    fn test_decode_server_error_frame() {
        let event = decode_event(WireFrame::Text(
            r#"{"type":"Error","description":"bad request"}"#.to_string(),
        ));
        match event {
            LiveEvent::Error(ErrorEvent::Server(value)) => {
                assert_eq!(value["description"], "bad request");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_unknown_type_as_unhandled() {
        let event = decode_event(WireFrame::Text(
            r#"{"type":"FutureFeature","data":1}"#.to_string(),
        ));
        match event {
            LiveEvent::Unhandled(value) => assert_eq!(value["type"], "FutureFeature"),
            other => panic!("expected unhandled, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_malformed_json_as_error_event() {
        let event = decode_event(WireFrame::Text("{not json".to_string()));
        match event {
            LiveEvent::Error(ErrorEvent::Client(err)) => {
                assert!(matches!(*err, AuricleError::Protocol(_)));
            }
            other => panic!("expected client error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_missing_discriminator_as_error_event() {
        let event = decode_event(WireFrame::Text(r#"{"data":"x"}"#.to_string()));
        assert_eq!(event.kind(), LiveEventKind::Error);
    }

    #[test]
    fn test_decode_close_frame() {
        match FrameCodec::decode(WireFrame::Close {
            code: 1011,
            reason: "server restarting".to_string(),
        }) {
            DecodedFrame::Close { code, reason } => {
                assert_eq!(code, 1011);
                assert_eq!(reason, "server restarting");
            }
            DecodedFrame::Event(event) => panic!("expected close, got {event:?}"),
        }
    }
}
