//! HTTP handlers, one module per feature

pub mod chat;
pub mod health;
pub mod notes;
pub mod otp;
pub mod quiz;
pub mod schedule;

use uuid::Uuid;

/// Correlates the log lines of one request
pub fn request_id() -> Uuid {
    Uuid::new_v4()
}
