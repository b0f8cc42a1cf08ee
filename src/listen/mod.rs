//! Speech-to-text: pre-recorded transcription and live streaming.

mod client;
mod options;

pub use client::{LISTEN_PATH, ListenClient};
pub use options::ListenOptions;
