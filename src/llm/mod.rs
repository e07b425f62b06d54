//! Chat-completion access for summaries and cross-article synthesis

pub mod client;
pub mod prompts;

pub use client::ChatClient;
