//! Configuration validation beyond the structural checks in the schema

use super::env::env_var_pattern;
use super::error::ValidationError;
use super::schema::EduGenieConfig;
use url::Url;

/// Runs schema validation plus URL and placeholder checks
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, config: &EduGenieConfig) -> Result<(), ValidationError> {
        config.validate()?;

        self.validate_placeholders(config)?;
        self.validate_base_url(&config.provider.base_url, "provider.base_url")?;
        for (i, origin) in config.server.allowed_origins.iter().enumerate() {
            self.validate_base_url(origin, &format!("server.allowed_origins[{}]", i))?;
        }

        Ok(())
    }

    /// A `${VAR}` left in place means interpolation never ran
    fn validate_placeholders(&self, config: &EduGenieConfig) -> Result<(), ValidationError> {
        if let Some(var) = self.extract_env_vars(config.provider.api_key.expose_secret()).first() {
            return Err(ValidationError::invalid_format(
                "provider.api_key",
                format!("unresolved environment variable '{}'", var),
            ));
        }
        Ok(())
    }

    fn validate_base_url(&self, value: &str, path: &str) -> Result<(), ValidationError> {
        let url = Url::parse(value).map_err(|e| ValidationError::invalid_url(path, e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ValidationError::invalid_url(
                path,
                format!("unsupported scheme '{}'", other),
            )),
        }
    }

    /// Variable names referenced as `${VAR}` in `text`
    pub fn extract_env_vars(&self, text: &str) -> Vec<String> {
        env_var_pattern()
            .captures_iter(text)
            .map(|cap| cap[1].to_string())
            .collect()
    }
}
