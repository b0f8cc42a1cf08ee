//! In-process transport double for live-session tests.
//!
//! The mock lets a test script every interaction the session has with the
//! network: when (and whether) each open attempt resolves, which frames
//! arrive, and how the socket dies. Sent frames and close calls are recorded
//! per socket handle so ordering assertions are exact.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use auricle::AuricleError;
use auricle::live::{OpenRequest, SocketHandle, Transport, WireFrame};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

type FrameResult = Result<WireFrame, AuricleError>;

/// How `open` calls resolve without manual scripting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Every open waits for a [`PendingOpen`] decision from the test.
    Manual,
    /// Every open succeeds immediately.
    AutoSucceed,
    /// Every open fails immediately.
    AutoFail,
}

enum OpenDecision {
    Succeed,
    Fail(String),
}

/// One unresolved open attempt, handed to the test in manual mode.
pub struct PendingOpen {
    decision_tx: oneshot::Sender<OpenDecision>,
}

impl PendingOpen {
    pub fn succeed(self) {
        let _ = self.decision_tx.send(OpenDecision::Succeed);
    }

    pub fn fail(self, message: impl Into<String>) {
        let _ = self.decision_tx.send(OpenDecision::Fail(message.into()));
    }
}

#[derive(Default)]
struct SocketRecord {
    sent: Vec<WireFrame>,
    closed: Option<(Option<u16>, Option<String>)>,
    fail_sends: bool,
}

struct MockShared {
    open_count: AtomicUsize,
    open_times: Mutex<Vec<Instant>>,
    last_request: Mutex<Option<OpenRequest>>,
    sockets: Mutex<Vec<SocketRecord>>,
    open_tx: mpsc::UnboundedSender<PendingOpen>,
    socket_tx: mpsc::UnboundedSender<SocketCtl>,
}

/// Test-side controller paired with a [`MockTransport`].
pub struct MockController {
    shared: Arc<MockShared>,
    open_rx: mpsc::UnboundedReceiver<PendingOpen>,
    socket_rx: mpsc::UnboundedReceiver<SocketCtl>,
}

impl MockController {
    /// Wait for the next open attempt (manual mode).
    pub async fn next_open(&mut self) -> PendingOpen {
        self.open_rx.recv().await.expect("transport dropped")
    }

    /// Wait for the next successfully opened socket.
    pub async fn next_socket(&mut self) -> SocketCtl {
        self.socket_rx.recv().await.expect("transport dropped")
    }

    pub fn open_count(&self) -> usize {
        self.shared.open_count.load(Ordering::SeqCst)
    }

    pub fn open_times(&self) -> Vec<Instant> {
        self.shared.open_times.lock().clone()
    }

    pub fn last_request(&self) -> Option<OpenRequest> {
        self.shared.last_request.lock().clone()
    }
}

/// Test-side handle to one opened socket.
pub struct SocketCtl {
    idx: usize,
    shared: Arc<MockShared>,
    inbound_tx: mpsc::UnboundedSender<FrameResult>,
}

impl SocketCtl {
    /// Deliver a text frame to the session.
    pub fn push_text(&self, text: impl Into<String>) {
        let _ = self.inbound_tx.send(Ok(WireFrame::Text(text.into())));
    }

    /// Deliver a binary frame to the session.
    pub fn push_binary(&self, bytes: &[u8]) {
        let _ = self
            .inbound_tx
            .send(Ok(WireFrame::Binary(bytes::Bytes::copy_from_slice(bytes))));
    }

    /// Deliver a close frame to the session.
    pub fn push_close(&self, code: u16, reason: impl Into<String>) {
        let _ = self.inbound_tx.send(Ok(WireFrame::Close {
            code,
            reason: reason.into(),
        }));
    }

    /// Deliver a transport error to the session.
    pub fn push_error(&self, message: impl Into<String>) {
        let _ = self
            .inbound_tx
            .send(Err(AuricleError::Transport(message.into())));
    }

    /// Frames the session transmitted on this socket, in order.
    pub fn sent_frames(&self) -> Vec<WireFrame> {
        self.shared.sockets.lock()[self.idx].sent.clone()
    }

    /// Close code/reason the session passed to `close`, if any.
    pub fn close_call(&self) -> Option<(Option<u16>, Option<String>)> {
        self.shared.sockets.lock()[self.idx].closed.clone()
    }

    /// Make every subsequent `send` on this socket fail.
    pub fn fail_sends(&self) {
        self.shared.sockets.lock()[self.idx].fail_sends = true;
    }
}

/// Scripted [`Transport`] implementation.
pub struct MockTransport {
    mode: OpenMode,
    shared: Arc<MockShared>,
}

impl MockTransport {
    pub fn new(mode: OpenMode) -> (Arc<Self>, MockController) {
        let (open_tx, open_rx) = mpsc::unbounded_channel();
        let (socket_tx, socket_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(MockShared {
            open_count: AtomicUsize::new(0),
            open_times: Mutex::new(Vec::new()),
            last_request: Mutex::new(None),
            sockets: Mutex::new(Vec::new()),
            open_tx,
            socket_tx,
        });
        let transport = Arc::new(Self {
            mode,
            shared: Arc::clone(&shared),
        });
        let controller = MockController {
            shared,
            open_rx,
            socket_rx,
        };
        (transport, controller)
    }

    fn make_socket(&self) -> Box<dyn SocketHandle> {
        let idx = {
            let mut sockets = self.shared.sockets.lock();
            sockets.push(SocketRecord::default());
            sockets.len() - 1
        };
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let _ = self.shared.socket_tx.send(SocketCtl {
            idx,
            shared: Arc::clone(&self.shared),
            inbound_tx,
        });
        Box::new(MockSocket {
            idx,
            shared: Arc::clone(&self.shared),
            inbound_rx,
        })
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self, request: OpenRequest) -> Result<Box<dyn SocketHandle>, AuricleError> {
        self.shared.open_count.fetch_add(1, Ordering::SeqCst);
        self.shared.open_times.lock().push(Instant::now());
        *self.shared.last_request.lock() = Some(request);

        match self.mode {
            OpenMode::AutoFail => Err(AuricleError::Transport("mock open failure".to_string())),
            OpenMode::AutoSucceed => Ok(self.make_socket()),
            OpenMode::Manual => {
                let (decision_tx, decision_rx) = oneshot::channel();
                let _ = self.shared.open_tx.send(PendingOpen { decision_tx });
                match decision_rx.await {
                    Ok(OpenDecision::Succeed) => Ok(self.make_socket()),
                    Ok(OpenDecision::Fail(message)) => Err(AuricleError::Transport(message)),
                    Err(_) => Err(AuricleError::Transport("open abandoned".to_string())),
                }
            }
        }
    }
}

struct MockSocket {
    idx: usize,
    shared: Arc<MockShared>,
    inbound_rx: mpsc::UnboundedReceiver<FrameResult>,
}

#[async_trait]
impl SocketHandle for MockSocket {
    async fn send(&mut self, frame: WireFrame) -> Result<(), AuricleError> {
        let mut sockets = self.shared.sockets.lock();
        let record = &mut sockets[self.idx];
        if record.fail_sends {
            return Err(AuricleError::Transport("mock send failure".to_string()));
        }
        record.sent.push(frame);
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<Result<WireFrame, AuricleError>> {
        self.inbound_rx.recv().await
    }

    async fn close(&mut self, code: Option<u16>, reason: Option<String>) -> Result<(), AuricleError> {
        self.shared.sockets.lock()[self.idx].closed = Some((code, reason));
        Ok(())
    }
}
