//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use super::secrets::SecretString;
use crate::continuation::ChatProfile;
use crate::otp::OtpSettings;
use crate::quiz::QuizSettings;
use crate::schedule::ScheduleSettings;
use serde::{Deserialize, Serialize};

/// Schema version this build understands
pub const CONFIG_VERSION: &str = "0.1";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_PORT: u16 = 5000;

/// Root configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EduGenieConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Completion service connection
    pub provider: ProviderSettings,

    #[serde(default)]
    pub server: ServerConfig,

    /// Continuation constants per chat route
    #[serde(default)]
    pub profiles: ProfilesConfig,

    /// Streamed notes generation
    #[serde(default = "GenerationSettings::notes")]
    pub notes: GenerationSettings,

    #[serde(default)]
    pub quiz: QuizSettings,

    #[serde(default)]
    pub schedule: ScheduleSettings,

    #[serde(default)]
    pub otp: OtpSettings,
}

impl EduGenieConfig {
    /// Defaults around a provider connection
    pub fn with_provider(provider: ProviderSettings) -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            provider,
            server: ServerConfig::default(),
            profiles: ProfilesConfig::default(),
            notes: GenerationSettings::notes(),
            quiz: QuizSettings::default(),
            schedule: ScheduleSettings::default(),
            otp: OtpSettings::default(),
        }
    }

    /// Structural validation of every section
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version != CONFIG_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::InvalidVersion {
                    expected: CONFIG_VERSION.to_string(),
                    actual: self.version.clone(),
                },
            ));
        }

        self.provider.validate("provider")?;
        self.server.validate("server")?;
        self.profiles.general_chat.validate("profiles.general_chat")?;
        self.profiles.pdf_chat.validate("profiles.pdf_chat")?;
        self.profiles.tutor.validate("profiles.tutor")?;
        self.notes.validate("notes")?;
        self.quiz.validate("quiz")?;
        self.schedule.validate("schedule")?;
        self.otp.validate("otp")?;
        Ok(())
    }
}

/// OpenAI-compatible completion service settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    /// API key (supports `${VAR}` interpolation)
    pub api_key: SecretString,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub organization_id: Option<String>,

    #[serde(default)]
    pub connection: ConnectionConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl ProviderSettings {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            model: default_model(),
            organization_id: None,
            connection: ConnectionConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::required(format!("{}.api_key", path)));
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.model", path)));
        }
        if self.base_url.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.base_url", path)));
        }
        self.connection.validate(&format!("{}.connection", path))
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Upper bound on a non-streamed provider call. Streamed replies may run
    /// longer; for them this bounds the wait between reads.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,

    /// Idle pooled connections are dropped after this long
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,
}

fn default_connect_timeout() -> u64 {
    10_000
}
fn default_request_timeout() -> u64 {
    60_000
}
fn default_max_idle() -> usize {
    10
}
fn default_keepalive() -> u64 {
    90
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_idle_per_host: default_max_idle(),
            keepalive_secs: default_keepalive(),
        }
    }
}

impl ConnectionConfig {
    fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.connect_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.connect_timeout_ms", path),
                "Must be greater than 0",
            ));
        }
        if self.request_timeout_ms < self.connect_timeout_ms {
            return Err(ValidationError::out_of_range(
                format!("{}.request_timeout_ms", path),
                "Must not be shorter than connect_timeout_ms",
            ));
        }
        Ok(())
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS origins; empty allows any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Address string suitable for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::required(format!("{}.host", path)));
        }
        Ok(())
    }
}

/// Chat profiles, one per chat route
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilesConfig {
    #[serde(default = "ChatProfile::general_chat")]
    pub general_chat: ChatProfile,

    #[serde(default = "ChatProfile::pdf_chat")]
    pub pdf_chat: ChatProfile,

    #[serde(default = "ChatProfile::tutor")]
    pub tutor: ChatProfile,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            general_chat: ChatProfile::general_chat(),
            pdf_chat: ChatProfile::pdf_chat(),
            tutor: ChatProfile::tutor(),
        }
    }
}

/// Output ceiling and temperature for single-shot generation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationSettings {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl GenerationSettings {
    pub fn notes() -> Self {
        Self {
            max_output_tokens: 2000,
            temperature: 0.5,
        }
    }

    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.max_output_tokens == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_output_tokens", path),
                "Must be greater than 0",
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::out_of_range(
                format!("{}.temperature", path),
                "Must be between 0.0 and 2.0",
            ));
        }
        Ok(())
    }
}
