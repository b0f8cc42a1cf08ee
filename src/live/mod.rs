//! Live bidirectional streaming connections.
//!
//! This module is the core of the client: a persistent WebSocket session
//! (speech-to-text or text-to-speech) that multiplexes binary audio/text
//! frames outbound with structured event frames inbound. It handles the
//! connection lifecycle, queues sends issued before the socket is open,
//! schedules keepalives, recovers from unexpected closures with bounded
//! exponential backoff, and demultiplexes inbound traffic into a typed
//! event-emission surface.
//!
//! # Example
//!
//! ```rust,ignore
//! use auricle::{AuricleClient, Credentials};
//! use auricle::listen::ListenOptions;
//! use auricle::live::LiveEventKind;
//!
//! let client = AuricleClient::new(Credentials::api_key("..."))?;
//! let conn = client
//!     .listen()
//!     .live(ListenOptions::default().with_model("nova-3"))?;
//!
//! conn.on(LiveEventKind::Transcript, |event| async move {
//!     println!("{event:?}");
//! });
//!
//! conn.send(audio_chunk)?;
//! conn.finish()?;
//! ```

mod codec;
mod event;
mod messages;
mod reconnect;
mod session;
mod transport;

pub mod connection;

pub use connection::{
    DEFAULT_KEEPALIVE_INTERVAL, LiveBuilder, LiveConnection, StreamDirection,
};
pub use event::{
    CloseEvent, ErrorEvent, EventHandler, LiveEvent, LiveEventKind, Subscription,
};
pub use messages::{ControlMessage, OutboundUnit};
pub use reconnect::ReconnectPolicy;
pub use session::LiveState;
pub use transport::{
    CLOSE_CODE_ABNORMAL, CLOSE_CODE_NORMAL, OpenRequest, SocketHandle, Transport, WireFrame,
    WsTransport,
};
