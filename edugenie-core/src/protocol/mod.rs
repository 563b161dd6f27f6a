//! Protocol module for completion request/response structures
//!
//! This module defines the canonical data models shared by every caller of
//! the completion service. These structures are:
//! - Provider-agnostic
//! - Request-scoped (never persisted)
//! - Serializable for logging and tests

pub mod types;

pub use types::{
    CompletionRequest, CompletionResult, ConversationTurn, Role, FINISH_REASON_LENGTH,
    FINISH_REASON_STOP,
};
