//! Environment variable interpolation and environment-only configuration

use super::error::ConfigError;
use super::schema::{EduGenieConfig, ProviderSettings};
use regex::Regex;
use std::env;
use std::sync::OnceLock;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_VAR: &str = "EDUGENIE_MODEL";
pub const BASE_URL_VAR: &str = "EDUGENIE_BASE_URL";
pub const HOST_VAR: &str = "EDUGENIE_HOST";
pub const PORT_VAR: &str = "EDUGENIE_PORT";

pub(crate) fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is valid"))
}

/// Replace `${VAR}` references using `lookup`; the first missing variable is an error
pub fn interpolate_with<F>(content: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let pattern = env_var_pattern();
    let mut result = String::with_capacity(content.len());
    let mut last = 0;

    for cap in pattern.captures_iter(content) {
        let Some(whole) = cap.get(0) else { continue };
        let var = &cap[1];
        let value = lookup(var).ok_or_else(|| ConfigError::EnvVarNotFound {
            var: var.to_string(),
        })?;
        result.push_str(&content[last..whole.start()]);
        result.push_str(&value);
        last = whole.end();
    }
    result.push_str(&content[last..]);

    Ok(result)
}

/// Interpolate from the process environment
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    interpolate_with(content, |var| env::var(var).ok())
}

/// Build configuration from variables alone, using `lookup` to read them
pub fn config_from_lookup<F>(lookup: F) -> Result<EduGenieConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = lookup(API_KEY_VAR)
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| ConfigError::EnvVarNotFound {
            var: API_KEY_VAR.to_string(),
        })?;

    let mut provider = ProviderSettings::new(api_key);
    if let Some(model) = lookup(MODEL_VAR) {
        provider = provider.with_model(model);
    }
    if let Some(base_url) = lookup(BASE_URL_VAR) {
        provider = provider.with_base_url(base_url);
    }

    let mut config = EduGenieConfig::with_provider(provider);
    if let Some(host) = lookup(HOST_VAR) {
        config.server.host = host;
    }
    if let Some(port) = lookup(PORT_VAR) {
        config.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnvVar {
            var: PORT_VAR.to_string(),
            message: format!("'{}' is not a valid port", port),
        })?;
    }

    Ok(config)
}
