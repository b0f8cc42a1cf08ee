//! Socket transport abstraction and the tokio-tungstenite binding.
//!
//! The session state machine talks to a [`Transport`] capability injected at
//! connection-factory time, never to a global socket constructor. This keeps
//! the same session logic runnable against the production WebSocket stack or
//! an in-process test double.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::handshake::client::generate_key;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use crate::errors::{AuricleError, Result};

/// Close code reported when the peer vanished without a close frame.
pub const CLOSE_CODE_ABNORMAL: u16 = 1006;

/// Close code for a normal, caller-initiated closure.
pub const CLOSE_CODE_NORMAL: u16 = 1000;

// =============================================================================
// Wire Frames
// =============================================================================

/// One raw frame on the wire, in either direction.
#[derive(Debug, Clone)]
pub enum WireFrame {
    /// Binary payload: audio in, audio out.
    Binary(Bytes),
    /// Textual payload: JSON control/event frames and raw text.
    Text(String),
    /// Close frame with code and reason.
    Close {
        /// WebSocket close code.
        code: u16,
        /// Close reason, possibly empty.
        reason: String,
    },
}

/// Parameters for opening a socket.
///
/// The URL arrives fully formed (query string included); authentication is an
/// opaque header value or subprotocol list resolved by the caller.
#[derive(Debug, Clone)]
pub struct OpenRequest {
    /// Fully-formed WebSocket URL.
    pub url: String,
    /// `Authorization` header value, when header auth is in use.
    pub auth_header: Option<String>,
    /// Requested subprotocols (token-embedding auth mechanism).
    pub protocols: Vec<String>,
}

impl OpenRequest {
    /// Build a request with no authentication.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_header: None,
            protocols: Vec::new(),
        }
    }
}

// =============================================================================
// Transport Traits
// =============================================================================

/// An open bidirectional socket.
///
/// `close` is idempotent: closing an already-closed handle is a no-op. No
/// retry or reconnection logic lives at this layer.
#[async_trait]
pub trait SocketHandle: Send {
    /// Transmit one frame. Fails once the handle is closed.
    async fn send(&mut self, frame: WireFrame) -> Result<()>;

    /// Receive the next frame. `None` means the stream ended without a close
    /// frame.
    async fn next_frame(&mut self) -> Option<Result<WireFrame>>;

    /// Initiate closure with an optional code and reason.
    async fn close(&mut self, code: Option<u16>, reason: Option<String>) -> Result<()>;
}

/// Factory for opening sockets.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a socket. Resolves once the handshake completes; frames are only
    /// ever delivered on the returned handle.
    async fn open(&self, request: OpenRequest) -> Result<Box<dyn SocketHandle>>;
}

// =============================================================================
// tokio-tungstenite Binding
// =============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production [`Transport`] over tokio-tungstenite with rustls.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self, request: OpenRequest) -> Result<Box<dyn SocketHandle>> {
        let url = url::Url::parse(&request.url)
            .map_err(|e| AuricleError::Config(format!("invalid connect URL: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| AuricleError::Config("connect URL has no host".to_string()))?;
        let host_header = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let mut builder = http::Request::builder()
            .method("GET")
            .uri(&request.url)
            .header("Host", host_header)
            .header("Upgrade", "websocket")
            .header("Connection", "upgrade")
            .header("Sec-WebSocket-Key", generate_key())
            .header("Sec-WebSocket-Version", "13");
        if let Some(auth) = &request.auth_header {
            builder = builder.header("Authorization", auth);
        }
        if !request.protocols.is_empty() {
            builder = builder.header("Sec-WebSocket-Protocol", request.protocols.join(", "));
        }

        let handshake = builder
            .body(())
            .map_err(|e| AuricleError::Transport(format!("failed to build handshake: {e}")))?;

        let (stream, _response) = connect_async(handshake)
            .await
            .map_err(|e| AuricleError::Transport(format!("failed to connect: {e}")))?;

        debug!("WebSocket open: {}", request.url);

        let (sink, stream) = stream.split();
        Ok(Box::new(WsSocket {
            sink,
            stream,
            closed: false,
        }))
    }
}

struct WsSocket {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
    closed: bool,
}

#[async_trait]
impl SocketHandle for WsSocket {
    async fn send(&mut self, frame: WireFrame) -> Result<()> {
        if self.closed {
            return Err(AuricleError::Transport("socket is closed".to_string()));
        }
        let message = match frame {
            WireFrame::Binary(bytes) => Message::Binary(bytes),
            WireFrame::Text(text) => Message::Text(text.into()),
            WireFrame::Close { code, reason } => Message::Close(Some(CloseFrame {
                code: CloseCode::from(code),
                reason: reason.into(),
            })),
        };
        self.sink
            .send(message)
            .await
            .map_err(|e| AuricleError::Transport(format!("send failed: {e}")))
    }

    async fn next_frame(&mut self) -> Option<Result<WireFrame>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Binary(bytes)) => return Some(Ok(WireFrame::Binary(bytes))),
                Ok(Message::Text(text)) => return Some(Ok(WireFrame::Text(text.to_string()))),
                Ok(Message::Close(frame)) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.to_string()))
                        .unwrap_or((CLOSE_CODE_ABNORMAL, String::new()));
                    return Some(Ok(WireFrame::Close { code, reason }));
                }
                Ok(Message::Ping(payload)) => {
                    // tungstenite only queues the pong; flush it ourselves.
                    if let Err(e) = self.sink.send(Message::Pong(payload)).await {
                        debug!("failed to answer ping: {}", e);
                    }
                }
                Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Err(e) => {
                    return Some(Err(AuricleError::Transport(format!(
                        "websocket error: {e}"
                    ))));
                }
            }
        }
    }

    async fn close(&mut self, code: Option<u16>, reason: Option<String>) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let frame = CloseFrame {
            code: CloseCode::from(code.unwrap_or(CLOSE_CODE_NORMAL)),
            reason: reason.unwrap_or_default().into(),
        };
        // A peer that already dropped makes the close send fail; that is not
        // actionable for the caller.
        if let Err(e) = self.sink.send(Message::Close(Some(frame))).await {
            debug!("close frame not delivered: {}", e);
        }
        Ok(())
    }
}
