//! Caller-facing live connection facade.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use super::event::{EventHandler, EventRegistry, LiveEvent, LiveEventKind, Subscription};
use super::messages::{ControlMessage, OutboundUnit};
use super::reconnect::ReconnectPolicy;
use super::session::{Command, LiveState, SessionTask, SharedState};
use super::transport::{CLOSE_CODE_NORMAL, OpenRequest, Transport, WsTransport};
use crate::errors::{AuricleError, Result};

/// Default keepalive interval while the connection is open.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);

// =============================================================================
// Direction
// =============================================================================

/// Which half of the speech API a live connection talks to. Determines the
/// end-of-stream control frame sent by [`LiveConnection::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDirection {
    /// Speech-to-text: binary audio out, transcription events in.
    Listen,
    /// Text-to-speech: text out, binary audio in.
    Speak,
}

impl StreamDirection {
    pub(crate) fn end_of_stream(&self) -> ControlMessage {
        match self {
            StreamDirection::Listen => ControlMessage::CloseStream,
            StreamDirection::Speak => ControlMessage::Close,
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for a [`LiveConnection`].
///
/// The transport is an injected capability: production code uses the default
/// [`WsTransport`], tests swap in an in-process double. Each connection owns
/// its own transport reference; there is no global socket constructor.
pub struct LiveBuilder {
    request: OpenRequest,
    direction: StreamDirection,
    transport: Arc<dyn Transport>,
    policy: ReconnectPolicy,
    keepalive: Option<Duration>,
}

impl LiveBuilder {
    /// Start building a connection to a fully-formed WebSocket URL.
    pub fn new(url: impl Into<String>, direction: StreamDirection) -> Self {
        Self {
            request: OpenRequest::new(url),
            direction,
            transport: Arc::new(WsTransport),
            policy: ReconnectPolicy::default(),
            keepalive: Some(DEFAULT_KEEPALIVE_INTERVAL),
        }
    }

    /// Set the `Authorization` header value used at open time.
    pub fn auth_header(mut self, value: impl Into<String>) -> Self {
        self.request.auth_header = Some(value.into());
        self
    }

    /// Add a requested subprotocol (token-embedding auth mechanism).
    pub fn subprotocol(mut self, protocol: impl Into<String>) -> Self {
        self.request.protocols.push(protocol.into());
        self
    }

    /// Replace the transport implementation.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Set the reconnect policy.
    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the keepalive interval, or disable the timer with `None`.
    pub fn keepalive(mut self, interval: Option<Duration>) -> Self {
        self.keepalive = interval;
        self
    }

    /// Spawn the session task and return the facade, immediately, in the
    /// `Connecting` state. Must be called within a tokio runtime.
    pub fn start(self) -> LiveConnection {
        let request_id = Uuid::new_v4().to_string();
        let registry = Arc::new(EventRegistry::new());
        let shared = Arc::new(SharedState::new());
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        debug!(request_id = %request_id, url = %self.request.url, "starting live connection");

        let task = SessionTask::new(
            self.transport,
            self.request,
            self.policy,
            self.keepalive,
            self.direction.end_of_stream(),
            Arc::clone(&registry),
            Arc::clone(&shared),
            cmd_rx,
            request_id.clone(),
        );
        tokio::spawn(task.run());

        LiveConnection {
            cmd_tx,
            shared,
            registry,
            request_id,
        }
    }
}

// =============================================================================
// Connection Facade
// =============================================================================

/// A live bidirectional streaming session.
///
/// Constructed through [`crate::listen::ListenClient::live`],
/// [`crate::speak::SpeakClient::live`], or [`LiveBuilder`] directly. Sends
/// issued while the socket is still connecting are queued and drained in
/// order once it opens; sends after [`LiveConnection::close`] fail with
/// [`AuricleError::ConnectionClosed`].
pub struct LiveConnection {
    cmd_tx: mpsc::UnboundedSender<Command>,
    shared: Arc<SharedState>,
    registry: Arc<EventRegistry>,
    request_id: String,
}

impl LiveConnection {
    /// Current lifecycle state.
    pub fn state(&self) -> LiveState {
        self.shared.state()
    }

    /// Correlation id identifying this logical connection across reconnects.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Send one chunk of binary audio (speech-to-text input).
    pub fn send(&self, audio: impl Into<Bytes>) -> Result<()> {
        self.dispatch(OutboundUnit::Binary(audio.into()))
    }

    /// Submit text for synthesis (text-to-speech input).
    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.dispatch(OutboundUnit::Control(ControlMessage::Speak {
            text: text.into(),
        }))
    }

    /// Send a keepalive frame now, independent of the interval timer.
    pub fn keep_alive(&self) -> Result<()> {
        self.dispatch(OutboundUnit::Control(ControlMessage::KeepAlive))
    }

    /// Ask the server to emit buffered synthesized audio immediately. The
    /// session stays open; subscribers receive a `Flushed` acknowledgement.
    pub fn flush(&self) -> Result<()> {
        self.dispatch(OutboundUnit::Control(ControlMessage::Flush))
    }

    /// Signal end-of-input. Sends the direction-appropriate end-of-stream
    /// frame and transitions to `Closing`; the server is expected to close
    /// the socket after draining.
    pub fn finish(&self) -> Result<()> {
        if !self.shared.accepts_sends() {
            return Err(AuricleError::ConnectionClosed);
        }
        self.shared.set(LiveState::Closing);
        self.cmd_tx
            .send(Command::Finish)
            .map_err(|_| AuricleError::ConnectionClosed)
    }

    /// Close the connection. Idempotent: later calls are no-ops and produce
    /// no further `Close` event. After this returns, sends fail with
    /// [`AuricleError::ConnectionClosed`]; an in-flight reconnect backoff is
    /// aborted.
    pub fn close(&self, code: Option<u16>, reason: Option<&str>) -> Result<()> {
        if matches!(self.shared.state(), LiveState::Closing | LiveState::Closed) {
            return Ok(());
        }
        self.shared.set(LiveState::Closing);
        let _ = self.cmd_tx.send(Command::Close {
            code: code.unwrap_or(CLOSE_CODE_NORMAL),
            reason: reason.unwrap_or_default().to_string(),
        });
        Ok(())
    }

    /// Register a handler for one event kind. Handlers fire in registration
    /// order for every matching event until removed with
    /// [`LiveConnection::off`] or the connection reaches its terminal state.
    pub fn on<F, Fut>(&self, kind: LiveEventKind, handler: F) -> Subscription
    where
        F: Fn(LiveEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: EventHandler = Arc::new(move |event| Box::pin(handler(event)));
        self.registry.subscribe(kind, handler)
    }

    /// Remove a previously registered handler. Returns false when the
    /// subscription was already removed.
    pub fn off(&self, subscription: Subscription) -> bool {
        self.registry.unsubscribe(subscription)
    }

    fn dispatch(&self, unit: OutboundUnit) -> Result<()> {
        if !self.shared.accepts_sends() {
            return Err(AuricleError::ConnectionClosed);
        }
        self.cmd_tx
            .send(Command::Send(unit))
            .map_err(|_| AuricleError::ConnectionClosed)
    }
}

impl Drop for LiveConnection {
    fn drop(&mut self) {
        if !matches!(self.shared.state(), LiveState::Closed) {
            self.shared.set(LiveState::Closing);
            let _ = self.cmd_tx.send(Command::Close {
                code: CLOSE_CODE_NORMAL,
                reason: "client dropped".to_string(),
            });
        }
    }
}
