//! OpenAI provider implementation
//!
//! This module provides an adapter for OpenAI-compatible chat-completions
//! APIs, translating between EduGenie's protocol and the wire format.

mod client;
pub mod converter;
mod streaming;
pub mod types;

pub use client::OpenAIProvider;
pub use streaming::parse_stream;
pub use types::{OpenAIRequest, OpenAIResponse, OpenAIStreamChunk};
