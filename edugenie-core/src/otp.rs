//! One-time verification codes
//!
//! Codes live in a process-local store: a second server instance does not
//! see codes issued by the first. [`OtpStore`] is the seam for a shared
//! store; [`CodeDelivery`] is the seam for email.

use crate::config::ValidationError;
use async_trait::async_trait;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpError {
    #[error("a valid email address is required")]
    InvalidEmail,

    #[error("invalid or expired code")]
    InvalidCode,

    #[error("failed to deliver code: {0}")]
    Delivery(String),
}

fn default_ttl_secs() -> u64 {
    300
}
fn default_code_length() -> usize {
    6
}
fn default_max_attempts() -> u32 {
    5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtpSettings {
    /// Seconds a code stays valid
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Digits per code
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Wrong guesses allowed before a code is revoked
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            code_length: default_code_length(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl OtpSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.ttl_secs == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.ttl_secs", path),
                "Must be greater than 0",
            ));
        }
        if !(4..=10).contains(&self.code_length) {
            return Err(ValidationError::out_of_range(
                format!("{}.code_length", path),
                "Must be between 4 and 10",
            ));
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_attempts", path),
                "Must be greater than 0",
            ));
        }
        Ok(())
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"))
}

/// Trim and lowercase an address, rejecting anything that is not shaped like one
pub fn normalize_email(email: &str) -> Result<String, OtpError> {
    let email = email.trim().to_lowercase();
    if email_pattern().is_match(&email) {
        Ok(email)
    } else {
        Err(OtpError::InvalidEmail)
    }
}

/// `j***@example.com`
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}

/// Random zero-padded numeric code
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Storage for issued codes
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Store a fresh code for `email`, replacing any earlier one
    async fn issue(&self, email: &str) -> String;

    /// Consume the code if it matches and has not expired.
    ///
    /// Too many wrong guesses revoke the code.
    async fn verify(&self, email: &str, code: &str) -> Result<(), OtpError>;
}

#[derive(Debug, Clone)]
struct OtpEntry {
    code: String,
    expires_at: Instant,
    failed_attempts: u32,
}

/// In-process store; expired entries are swept on every access
pub struct MemoryOtpStore {
    entries: Mutex<HashMap<String, OtpEntry>>,
    ttl: Duration,
    code_length: usize,
    max_attempts: u32,
}

impl MemoryOtpStore {
    pub fn new(settings: &OtpSettings) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: settings.ttl(),
            code_length: settings.code_length,
            max_attempts: settings.max_attempts,
        }
    }

    fn sweep(entries: &mut HashMap<String, OtpEntry>, now: Instant) {
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let swept = before - entries.len();
        if swept > 0 {
            debug!("Swept {} expired code(s)", swept);
        }
    }

    /// Codes currently held, expired ones included until the next access
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn issue(&self, email: &str) -> String {
        let now = Instant::now();
        let code = generate_code(self.code_length);

        let mut entries = self.entries.lock().await;
        Self::sweep(&mut entries, now);
        entries.insert(
            email.to_string(),
            OtpEntry {
                code: code.clone(),
                expires_at: now + self.ttl,
                failed_attempts: 0,
            },
        );
        code
    }

    async fn verify(&self, email: &str, code: &str) -> Result<(), OtpError> {
        let mut entries = self.entries.lock().await;
        Self::sweep(&mut entries, Instant::now());

        let Some(entry) = entries.get_mut(email) else {
            return Err(OtpError::InvalidCode);
        };

        if entry.code == code.trim() {
            entries.remove(email);
            return Ok(());
        }

        entry.failed_attempts += 1;
        if entry.failed_attempts >= self.max_attempts {
            entries.remove(email);
            warn!(
                "Revoked code for {} after {} failed attempts",
                mask_email(email),
                self.max_attempts
            );
        }
        Err(OtpError::InvalidCode)
    }
}

/// Sends an issued code to its owner
#[async_trait]
pub trait CodeDelivery: Send + Sync {
    async fn deliver(&self, email: &str, code: &str, ttl: Duration) -> Result<(), OtpError>;
}

/// Delivery that only logs; the code itself is logged at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDelivery;

#[async_trait]
impl CodeDelivery for LogDelivery {
    async fn deliver(&self, email: &str, code: &str, ttl: Duration) -> Result<(), OtpError> {
        info!(
            "Issued verification code for {} (valid {}s)",
            mask_email(email),
            ttl.as_secs()
        );
        debug!("Verification code for {}: {}", email, code);
        Ok(())
    }
}

/// Issue and verify codes for email addresses
#[derive(Clone)]
pub struct OtpService {
    store: Arc<dyn OtpStore>,
    delivery: Arc<dyn CodeDelivery>,
    ttl: Duration,
}

impl OtpService {
    pub fn new(store: Arc<dyn OtpStore>, delivery: Arc<dyn CodeDelivery>, ttl: Duration) -> Self {
        Self { store, delivery, ttl }
    }

    /// In-memory store with log delivery
    pub fn in_memory(settings: &OtpSettings) -> Self {
        Self::new(
            Arc::new(MemoryOtpStore::new(settings)),
            Arc::new(LogDelivery),
            settings.ttl(),
        )
    }

    pub async fn send(&self, email: &str) -> Result<(), OtpError> {
        let email = normalize_email(email)?;
        let code = self.store.issue(&email).await;
        self.delivery.deliver(&email, &code, self.ttl).await
    }

    pub async fn verify(&self, email: &str, code: &str) -> Result<(), OtpError> {
        let email = normalize_email(email)?;
        self.store.verify(&email, code).await
    }
}
