//! Configuration loading
//!
//! Configuration comes from a YAML file with `${VAR}` interpolation, or
//! from environment variables alone when no file is given.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use env::{
    config_from_lookup, interpolate_env_vars, interpolate_with, API_KEY_VAR, BASE_URL_VAR,
    HOST_VAR, MODEL_VAR, PORT_VAR,
};
pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{
    ConnectionConfig, EduGenieConfig, GenerationSettings, ProfilesConfig, ProviderSettings,
    ServerConfig, CONFIG_VERSION, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_PORT,
};
pub use secrets::SecretString;
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;

/// Parse YAML configuration text; `source` names it in errors
pub fn parse_yaml(content: &str, source: &str) -> ConfigResult<EduGenieConfig> {
    let interpolated = env::interpolate_env_vars(content)?;

    let config: EduGenieConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: source.to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    ConfigValidator::new().validate(&config)?;
    Ok(config)
}

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<EduGenieConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;

    parse_yaml(&content, &path.to_string_lossy())
}

/// Load a configuration from the process environment
pub fn from_env() -> ConfigResult<EduGenieConfig> {
    let config = env::config_from_lookup(|var| std::env::var(var).ok())?;
    ConfigValidator::new().validate(&config)?;
    Ok(config)
}
