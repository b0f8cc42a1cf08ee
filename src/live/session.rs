//! Session state machine for live connections.
//!
//! All lifecycle logic runs on a single spawned task: one `tokio::select!`
//! event loop owns the socket handle, the FIFO queue of units accepted
//! before the socket opened, the keepalive interval, and the bounded
//! reconnect loop. Between await points the loop runs to completion, so the
//! queue and the subscriber registry never need cross-task synchronization
//! beyond the atomic readiness state published for call-site gating.
//!
//! # State transitions
//!
//! ```text
//! Connecting --open--> Open --finish/close--> Closing --close frame--> Closed
//!      ^                 |
//!      +---backoff-------+   (unexpected closure, bounded retries)
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::codec::{DecodedFrame, FrameCodec};
use super::event::{CloseEvent, ErrorEvent, EventRegistry, LiveEvent};
use super::messages::{ControlMessage, OutboundUnit};
use super::reconnect::ReconnectPolicy;
use super::transport::{
    CLOSE_CODE_ABNORMAL, CLOSE_CODE_NORMAL, OpenRequest, SocketHandle, Transport,
};
use crate::errors::{AuricleError, Result};

/// How long to wait for the server's close frame after a caller-initiated
/// close before declaring the session finished anyway.
const CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(5);

// =============================================================================
// Connection State
// =============================================================================

/// Lifecycle state of a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LiveState {
    /// The open handshake is in flight (also re-entered during reconnect
    /// backoff). Sends are queued.
    Connecting = 0,
    /// The socket is open; sends transmit immediately.
    Open = 1,
    /// A caller-initiated shutdown is in progress. Sends are rejected.
    Closing = 2,
    /// Terminal. Sends are rejected; no reconnection is pending.
    Closed = 3,
}

impl LiveState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LiveState::Connecting,
            1 => LiveState::Open,
            2 => LiveState::Closing,
            _ => LiveState::Closed,
        }
    }
}

impl fmt::Display for LiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveState::Connecting => write!(f, "Connecting"),
            LiveState::Open => write!(f, "Open"),
            LiveState::Closing => write!(f, "Closing"),
            LiveState::Closed => write!(f, "Closed"),
        }
    }
}

/// Readiness state shared between the facade and the session task.
///
/// The facade reads it to gate `send` calls synchronously and writes
/// `Closing` when the caller initiates shutdown; the session task owns every
/// other transition. `Closing`/`Closed` are sticky: once the caller has
/// started a shutdown the task never transitions back to an earlier state.
pub(crate) struct SharedState {
    state: AtomicU8,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(LiveState::Connecting as u8),
        }
    }

    pub(crate) fn state(&self) -> LiveState {
        LiveState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, next: LiveState) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                let current = LiveState::from_u8(raw);
                if current >= LiveState::Closing && next < current {
                    None
                } else {
                    Some(next as u8)
                }
            });
    }

    /// True while `send`/`send_text`/`flush` calls are accepted.
    pub(crate) fn accepts_sends(&self) -> bool {
        matches!(self.state(), LiveState::Connecting | LiveState::Open)
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Requests from the facade to the session task.
#[derive(Debug)]
pub(crate) enum Command {
    /// Queue or transmit one outbound unit.
    Send(OutboundUnit),
    /// Send the direction-appropriate end-of-stream frame and transition to
    /// `Closing`; the server closes the socket after draining.
    Finish,
    /// Close the socket and terminate the session.
    Close {
        /// Close code to send and to report in the `Close` event.
        code: u16,
        /// Close reason.
        reason: String,
    },
}

// =============================================================================
// Session Task
// =============================================================================

enum ConnectOutcome {
    Opened(Box<dyn SocketHandle>),
    Failed(AuricleError),
    Cancelled { code: u16, reason: String },
}

enum SessionEnd {
    /// Caller-initiated shutdown completed.
    Local { code: u16, reason: String },
    /// The socket dropped or the server closed unexpectedly.
    Remote {
        cause: AuricleError,
        code: u16,
        reason: String,
    },
}

/// The event-loop task behind a [`super::LiveConnection`].
pub(crate) struct SessionTask {
    transport: Arc<dyn Transport>,
    request: OpenRequest,
    policy: ReconnectPolicy,
    keepalive: Option<Duration>,
    end_of_stream: ControlMessage,
    registry: Arc<EventRegistry>,
    shared: Arc<SharedState>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    queue: VecDeque<OutboundUnit>,
    finishing: bool,
    request_id: String,
}

impl SessionTask {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        request: OpenRequest,
        policy: ReconnectPolicy,
        keepalive: Option<Duration>,
        end_of_stream: ControlMessage,
        registry: Arc<EventRegistry>,
        shared: Arc<SharedState>,
        cmd_rx: mpsc::UnboundedReceiver<Command>,
        request_id: String,
    ) -> Self {
        Self {
            transport,
            request,
            policy,
            keepalive,
            end_of_stream,
            registry,
            shared,
            cmd_rx,
            queue: VecDeque::new(),
            finishing: false,
            request_id,
        }
    }

    /// Drive the session to completion. Emits exactly one `Close` event.
    pub(crate) async fn run(mut self) {
        let mut reopens: u32 = 0;
        loop {
            self.shared.set(LiveState::Connecting);
            let socket = match self.connect_phase().await {
                ConnectOutcome::Opened(socket) => socket,
                ConnectOutcome::Cancelled { code, reason } => {
                    self.terminate(code, reason);
                    return;
                }
                ConnectOutcome::Failed(cause) => {
                    warn!(request_id = %self.request_id, "connect failed: {}", cause);
                    if self.backoff_phase(&mut reopens, cause).await {
                        continue;
                    }
                    return;
                }
            };

            reopens = 0;
            self.shared.set(LiveState::Open);
            info!(request_id = %self.request_id, "live connection open");
            self.registry.emit(&LiveEvent::Open);

            match self.open_phase(socket).await {
                SessionEnd::Local { code, reason } => {
                    self.terminate(code, reason);
                    return;
                }
                SessionEnd::Remote {
                    cause,
                    code,
                    reason,
                } => {
                    warn!(
                        request_id = %self.request_id,
                        "connection lost ({}): {}", code, reason
                    );
                    if !self.backoff_phase(&mut reopens, cause).await {
                        return;
                    }
                }
            }
        }
    }

    /// Open the transport while continuing to accept commands. Sends issued
    /// here are queued for the drain that follows the `Open` transition.
    async fn connect_phase(&mut self) -> ConnectOutcome {
        let transport = Arc::clone(&self.transport);
        let open = transport.open(self.request.clone());
        tokio::pin!(open);
        loop {
            tokio::select! {
                result = &mut open => {
                    return match result {
                        Ok(socket) => ConnectOutcome::Opened(socket),
                        Err(e) => ConnectOutcome::Failed(e),
                    };
                }
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Send(unit)) => self.enqueue(unit),
                    Some(Command::Finish) => self.enqueue_finish(),
                    Some(Command::Close { code, reason }) => {
                        return ConnectOutcome::Cancelled { code, reason };
                    }
                    None => {
                        return ConnectOutcome::Cancelled {
                            code: CLOSE_CODE_NORMAL,
                            reason: String::new(),
                        };
                    }
                },
            }
        }
    }

    /// The main loop while a socket is active: drain the queue, then
    /// multiplex commands, inbound frames, and keepalive ticks.
    async fn open_phase(&mut self, mut socket: Box<dyn SocketHandle>) -> SessionEnd {
        // Drain units accepted before the socket opened, strict FIFO. A unit
        // popped here was handed to this socket handle and is never requeued.
        while let Some(unit) = self.queue.pop_front() {
            if let Err(cause) = Self::transmit(&mut socket, unit).await {
                return SessionEnd::Remote {
                    cause,
                    code: CLOSE_CODE_ABNORMAL,
                    reason: "send failed".to_string(),
                };
            }
        }
        if self.finishing {
            self.shared.set(LiveState::Closing);
        }

        let shared = Arc::clone(&self.shared);
        let mut keepalive = self.keepalive.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Send(unit)) => {
                        if self.finishing {
                            warn!("discarding send issued during shutdown");
                            continue;
                        }
                        if let Err(cause) = Self::transmit(&mut socket, unit).await {
                            return SessionEnd::Remote {
                                cause,
                                code: CLOSE_CODE_ABNORMAL,
                                reason: "send failed".to_string(),
                            };
                        }
                    }
                    Some(Command::Finish) => {
                        if self.finishing {
                            continue;
                        }
                        self.finishing = true;
                        let eos = OutboundUnit::Control(self.end_of_stream.clone());
                        if let Err(cause) = Self::transmit(&mut socket, eos).await {
                            return SessionEnd::Remote {
                                cause,
                                code: CLOSE_CODE_ABNORMAL,
                                reason: "send failed".to_string(),
                            };
                        }
                        debug!(request_id = %self.request_id, "end-of-stream sent");
                        self.shared.set(LiveState::Closing);
                    }
                    Some(Command::Close { code, reason }) => {
                        self.shared.set(LiveState::Closing);
                        if let Err(e) = socket.close(Some(code), Some(reason.clone())).await {
                            debug!("close handshake failed: {}", e);
                        }
                        return self.closing_phase(socket, code, reason).await;
                    }
                    None => {
                        // Facade dropped without an explicit close.
                        self.shared.set(LiveState::Closing);
                        if let Err(e) = socket.close(Some(CLOSE_CODE_NORMAL), None).await {
                            debug!("close handshake failed: {}", e);
                        }
                        return self
                            .closing_phase(socket, CLOSE_CODE_NORMAL, String::new())
                            .await;
                    }
                },
                frame = socket.next_frame() => match frame {
                    Some(Ok(frame)) => match FrameCodec::decode(frame) {
                        DecodedFrame::Event(event) => self.registry.emit(&event),
                        DecodedFrame::Close { code, reason } => {
                            if self.shared.state() == LiveState::Closing {
                                // Expected closure after an end-of-stream.
                                return SessionEnd::Local { code, reason };
                            }
                            return SessionEnd::Remote {
                                cause: AuricleError::Transport(format!(
                                    "server closed connection ({code}): {reason}"
                                )),
                                code,
                                reason,
                            };
                        }
                    },
                    Some(Err(cause)) => {
                        if self.shared.state() == LiveState::Closing {
                            return SessionEnd::Local {
                                code: CLOSE_CODE_NORMAL,
                                reason: String::new(),
                            };
                        }
                        return SessionEnd::Remote {
                            cause,
                            code: CLOSE_CODE_ABNORMAL,
                            reason: "transport error".to_string(),
                        };
                    }
                    None => {
                        if self.shared.state() == LiveState::Closing {
                            return SessionEnd::Local {
                                code: CLOSE_CODE_NORMAL,
                                reason: String::new(),
                            };
                        }
                        return SessionEnd::Remote {
                            cause: AuricleError::Transport(
                                "connection closed unexpectedly".to_string(),
                            ),
                            code: CLOSE_CODE_ABNORMAL,
                            reason: "stream ended".to_string(),
                        };
                    }
                },
                _ = Self::keepalive_tick(&mut keepalive),
                    if shared.state() == LiveState::Open =>
                {
                    debug!(request_id = %self.request_id, "keepalive tick");
                    let unit = OutboundUnit::Control(ControlMessage::KeepAlive);
                    if let Err(cause) = Self::transmit(&mut socket, unit).await {
                        return SessionEnd::Remote {
                            cause,
                            code: CLOSE_CODE_ABNORMAL,
                            reason: "send failed".to_string(),
                        };
                    }
                }
            }
        }
    }

    /// After a caller-initiated close: publish any frames still in flight
    /// and wait briefly for the server's close frame.
    async fn closing_phase(
        &mut self,
        mut socket: Box<dyn SocketHandle>,
        code: u16,
        reason: String,
    ) -> SessionEnd {
        let grace = tokio::time::sleep(CLOSE_GRACE_PERIOD);
        tokio::pin!(grace);
        loop {
            tokio::select! {
                _ = &mut grace => {
                    debug!("server close frame not received within grace period");
                    return SessionEnd::Local { code, reason };
                }
                frame = socket.next_frame() => match frame {
                    Some(Ok(frame)) => match FrameCodec::decode(frame) {
                        DecodedFrame::Event(event) => self.registry.emit(&event),
                        DecodedFrame::Close { .. } => {
                            return SessionEnd::Local { code, reason };
                        }
                    },
                    Some(Err(_)) | None => {
                        return SessionEnd::Local { code, reason };
                    }
                },
            }
        }
    }

    /// Wait out the backoff delay before the next reopen, still accepting
    /// commands. Returns false once the session has been terminated, either
    /// because retries are exhausted/disabled or because the caller closed
    /// during the delay.
    async fn backoff_phase(&mut self, reopens: &mut u32, cause: AuricleError) -> bool {
        self.shared.set(LiveState::Connecting);
        if !self.policy.should_retry(*reopens) {
            let error = if *reopens > 0 {
                AuricleError::RetryExhausted { attempts: *reopens }
            } else {
                cause
            };
            self.registry
                .emit(&LiveEvent::Error(ErrorEvent::Client(Arc::new(error))));
            self.terminate(CLOSE_CODE_ABNORMAL, "abnormal closure".to_string());
            return false;
        }

        *reopens += 1;
        let delay = self.policy.delay_for(*reopens);
        info!(
            request_id = %self.request_id,
            "reconnecting (attempt {}/{}) in {:?}",
            reopens,
            self.policy.max_attempts,
            delay
        );

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Send(unit)) => self.enqueue(unit),
                    Some(Command::Finish) => self.enqueue_finish(),
                    Some(Command::Close { code, reason }) => {
                        self.terminate(code, reason);
                        return false;
                    }
                    None => {
                        self.terminate(CLOSE_CODE_NORMAL, String::new());
                        return false;
                    }
                },
            }
        }
    }

    fn enqueue(&mut self, unit: OutboundUnit) {
        if self.finishing {
            warn!("discarding send issued during shutdown");
            return;
        }
        self.queue.push_back(unit);
    }

    fn enqueue_finish(&mut self) {
        if self.finishing {
            return;
        }
        self.finishing = true;
        self.queue
            .push_back(OutboundUnit::Control(self.end_of_stream.clone()));
    }

    /// Enter the terminal state and publish the single `Close` event.
    fn terminate(&mut self, code: u16, reason: String) {
        self.shared.set(LiveState::Closed);
        info!(
            request_id = %self.request_id,
            "live connection closed ({}): {}", code, reason
        );
        self.registry
            .emit(&LiveEvent::Close(CloseEvent { code, reason }));
    }

    async fn transmit(socket: &mut Box<dyn SocketHandle>, unit: OutboundUnit) -> Result<()> {
        let frame = FrameCodec::encode(unit)?;
        socket.send(frame).await
    }

    async fn keepalive_tick(interval: &mut Option<Interval>) {
        match interval {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(LiveState::Connecting.to_string(), "Connecting");
        assert_eq!(LiveState::Open.to_string(), "Open");
        assert_eq!(LiveState::Closing.to_string(), "Closing");
        assert_eq!(LiveState::Closed.to_string(), "Closed");
    }

    #[test]
    fn test_shared_state_transitions() {
        let shared = SharedState::new();
        assert_eq!(shared.state(), LiveState::Connecting);
        assert!(shared.accepts_sends());

        shared.set(LiveState::Open);
        assert_eq!(shared.state(), LiveState::Open);
        assert!(shared.accepts_sends());

        // Reconnect re-enters Connecting.
        shared.set(LiveState::Connecting);
        assert_eq!(shared.state(), LiveState::Connecting);
    }

    #[test]
    fn test_closing_is_sticky() {
        let shared = SharedState::new();
        shared.set(LiveState::Closing);
        assert!(!shared.accepts_sends());

        // The session task races an Open transition; the caller's shutdown
        // wins.
        shared.set(LiveState::Open);
        assert_eq!(shared.state(), LiveState::Closing);

        shared.set(LiveState::Closed);
        assert_eq!(shared.state(), LiveState::Closed);

        shared.set(LiveState::Connecting);
        assert_eq!(shared.state(), LiveState::Closed);
    }
}
