//! Text intelligence: summarization, topics, intents, and sentiment.

mod client;
mod options;

pub use client::{READ_PATH, ReadClient};
pub use options::ReadOptions;
