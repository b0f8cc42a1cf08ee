//! Typed event surface for live connections.
//!
//! Inbound traffic is classified into a closed set of event kinds, each with
//! its own handler list. Handlers are invoked in registration order for every
//! matching event; a handler that performs async work never blocks delivery
//! to the other subscribers of the same event (fire-and-forget dispatch).

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;

use crate::errors::AuricleError;

// =============================================================================
// Event Kinds
// =============================================================================

/// The kinds of events a live connection can emit.
///
/// One handler list exists per kind; there are no stringly-typed event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiveEventKind {
    /// The socket finished its open handshake.
    Open,
    /// A `"Results"` transcription frame (speech-to-text direction).
    Transcript,
    /// A `"Metadata"` frame describing the session.
    Metadata,
    /// A `"SpeechStarted"` voice-activity frame.
    SpeechStarted,
    /// An `"UtteranceEnd"` voice-activity frame.
    UtteranceEnd,
    /// A `"Flushed"` acknowledgement (text-to-speech direction).
    Flushed,
    /// A `"Warning"` frame from the server.
    Warning,
    /// A binary frame carrying synthesized audio (text-to-speech direction).
    Audio,
    /// A JSON frame whose `type` discriminator is not recognized.
    Unhandled,
    /// A server `"Error"` frame or a client-side failure.
    Error,
    /// The connection reached its terminal closed state.
    Close,
}

impl fmt::Display for LiveEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LiveEventKind::Open => "Open",
            LiveEventKind::Transcript => "Transcript",
            LiveEventKind::Metadata => "Metadata",
            LiveEventKind::SpeechStarted => "SpeechStarted",
            LiveEventKind::UtteranceEnd => "UtteranceEnd",
            LiveEventKind::Flushed => "Flushed",
            LiveEventKind::Warning => "Warning",
            LiveEventKind::Audio => "Audio",
            LiveEventKind::Unhandled => "Unhandled",
            LiveEventKind::Error => "Error",
            LiveEventKind::Close => "Close",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// Events
// =============================================================================

/// Close details delivered with [`LiveEvent::Close`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent {
    /// WebSocket-style close code. 1000 for a normal closure; abnormal
    /// termination surfaces 1006 unless the server supplied its own code.
    pub code: u16,
    /// Human-readable close reason, possibly empty.
    pub reason: String,
}

/// Payload of an [`LiveEvent::Error`] event.
#[derive(Debug, Clone)]
pub enum ErrorEvent {
    /// An `{"type":"Error"}` frame sent by the server.
    Server(Value),
    /// A client-side failure: transport drop, protocol violation, or retry
    /// exhaustion.
    Client(Arc<AuricleError>),
}

impl ErrorEvent {
    /// Best-effort human-readable description.
    pub fn message(&self) -> String {
        match self {
            ErrorEvent::Server(value) => value
                .get("description")
                .or_else(|| value.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
            ErrorEvent::Client(err) => err.to_string(),
        }
    }
}

/// A classified inbound occurrence on a live connection.
///
/// Events are transient: consumed by all registered subscribers for their
/// kind, then discarded.
#[derive(Debug, Clone)]
pub enum LiveEvent {
    /// The connection transitioned to open.
    Open,
    /// Transcription results, as delivered by the server.
    Transcript(Value),
    /// Session metadata.
    Metadata(Value),
    /// Speech onset detected.
    SpeechStarted(Value),
    /// End of utterance detected.
    UtteranceEnd(Value),
    /// Buffered audio was flushed on request.
    Flushed(Value),
    /// Non-fatal server warning.
    Warning(Value),
    /// Raw synthesized audio bytes.
    Audio(Bytes),
    /// A frame with an unrecognized `type` discriminator, kept verbatim so
    /// callers can observe protocol evolution.
    Unhandled(Value),
    /// Server-reported or client-side error.
    Error(ErrorEvent),
    /// Terminal close with code and reason.
    Close(CloseEvent),
}

impl LiveEvent {
    /// The kind used to route this event to its handler list.
    pub fn kind(&self) -> LiveEventKind {
        match self {
            LiveEvent::Open => LiveEventKind::Open,
            LiveEvent::Transcript(_) => LiveEventKind::Transcript,
            LiveEvent::Metadata(_) => LiveEventKind::Metadata,
            LiveEvent::SpeechStarted(_) => LiveEventKind::SpeechStarted,
            LiveEvent::UtteranceEnd(_) => LiveEventKind::UtteranceEnd,
            LiveEvent::Flushed(_) => LiveEventKind::Flushed,
            LiveEvent::Warning(_) => LiveEventKind::Warning,
            LiveEvent::Audio(_) => LiveEventKind::Audio,
            LiveEvent::Unhandled(_) => LiveEventKind::Unhandled,
            LiveEvent::Error(_) => LiveEventKind::Error,
            LiveEvent::Close(_) => LiveEventKind::Close,
        }
    }
}

// =============================================================================
// Handlers and Registry
// =============================================================================

/// Type alias for the async event handler.
pub type EventHandler =
    Arc<dyn Fn(LiveEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Handle returned by [`crate::live::LiveConnection::on`]; pass it to
/// [`crate::live::LiveConnection::off`] to remove the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub(crate) kind: LiveEventKind,
    pub(crate) id: u64,
}

impl Subscription {
    /// Event kind this subscription is attached to.
    pub fn kind(&self) -> LiveEventKind {
        self.kind
    }
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    handlers: HashMap<LiveEventKind, Vec<(u64, EventHandler)>>,
}

/// Subscriber registry shared between the facade and the session task.
///
/// Mutation (subscribe/unsubscribe) is synchronous from the caller; emission
/// snapshots the handler list for the event's kind under the lock, then
/// spawns each handler in registration order without awaiting completion.
#[derive(Default)]
pub(crate) struct EventRegistry {
    inner: Mutex<RegistryInner>,
}

impl EventRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscribe(&self, kind: LiveEventKind, handler: EventHandler) -> Subscription {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.handlers.entry(kind).or_default().push((id, handler));
        Subscription { kind, id }
    }

    /// Remove a handler. Returns false when the subscription was already
    /// removed.
    pub(crate) fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut inner = self.inner.lock();
        if let Some(list) = inner.handlers.get_mut(&subscription.kind) {
            let before = list.len();
            list.retain(|(id, _)| *id != subscription.id);
            return list.len() != before;
        }
        false
    }

    /// Dispatch an event to every handler registered for its kind.
    pub(crate) fn emit(&self, event: &LiveEvent) {
        let handlers: Vec<EventHandler> = {
            let inner = self.inner.lock();
            match inner.handlers.get(&event.kind()) {
                Some(list) => list.iter().map(|(_, handler)| handler.clone()).collect(),
                None => return,
            }
        };

        for handler in handlers {
            tokio::spawn(handler(event.clone()));
        }
    }

    #[cfg(test)]
    fn handler_count(&self, kind: LiveEventKind) -> usize {
        self.inner
            .lock()
            .handlers
            .get(&kind)
            .map_or(0, |list| list.len())
    }
}
