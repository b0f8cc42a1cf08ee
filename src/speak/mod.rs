//! Text-to-speech: one-shot synthesis and live streaming.

mod client;
mod options;

pub use client::{SPEAK_PATH, SpeakClient};
pub use options::SpeakOptions;
