//! Rust client for the Auricle speech AI platform.
//!
//! The crate covers three surfaces:
//!
//! - **Pre-recorded transcription** over REST ([`listen::ListenClient`])
//! - **One-shot text-to-speech** over REST ([`speak::SpeakClient`])
//! - **Text intelligence** over REST ([`read::ReadClient`])
//! - **Live bidirectional streaming** over WebSocket ([`live`]), for both
//!   streaming transcription and streaming synthesis, with send queueing,
//!   keepalive scheduling, and bounded reconnection built in.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use auricle::{AuricleClient, Credentials};
//! use auricle::listen::ListenOptions;
//!
//! #[tokio::main]
//! async fn main() -> auricle::Result<()> {
//!     let client = AuricleClient::from_env()?;
//!
//!     let response = client
//!         .listen()
//!         .transcribe_url(
//!             "https://example.com/interview.wav",
//!             &ListenOptions::default().with_model("nova-3"),
//!         )
//!         .await?;
//!
//!     println!("{response}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod errors;
mod http;
pub mod listen;
pub mod live;
pub mod options;
pub mod read;
pub mod speak;

// Re-export commonly used items for convenience
pub use client::AuricleClient;
pub use errors::{AuricleError, Result};
pub use listen::{ListenClient, ListenOptions};
pub use read::{ReadClient, ReadOptions};
pub use live::{
    LiveBuilder, LiveConnection, LiveEvent, LiveEventKind, LiveState, ReconnectPolicy,
    Subscription,
};
pub use options::{ClientOptions, Credentials};
pub use speak::{SpeakClient, SpeakOptions};
