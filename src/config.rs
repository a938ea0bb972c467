//! Interceptor configuration.
//!
//! Controls how [`ScopeLayer`](crate::ScopeLayer) reports a failed request
//! scope. Values come from code, from the environment, or (with the `config`
//! feature) from JSON or YAML documents.

use std::env;

use axum::http::StatusCode;
#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Environment variable holding the failure status code.
pub const FAILURE_STATUS_ENV: &str = "LOCATOR_FAILURE_STATUS";
/// Environment variable toggling error details in failure responses.
pub const EXPOSE_ERROR_DETAILS_ENV: &str = "LOCATOR_EXPOSE_ERROR_DETAILS";

const DEFAULT_FAILURE_STATUS: u16 = 500;

/// Settings for the request-scoping interceptor
///
/// # Examples
///
/// ```
/// use ferrous_locator::InterceptorConfig;
///
/// let config = InterceptorConfig::default();
/// assert_eq!(config.failure_status, 500);
/// assert!(!config.expose_error_details);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct InterceptorConfig {
    /// Status code returned when the request scope cannot be built. Must be 5xx.
    pub failure_status: u16,
    /// Include the error message in the response body instead of a generic one.
    pub expose_error_details: bool,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            failure_status: DEFAULT_FAILURE_STATUS,
            expose_error_details: false,
        }
    }
}

impl InterceptorConfig {
    /// Checks that `failure_status` is a server-error status.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match StatusCode::from_u16(self.failure_status) {
            Ok(status) if status.is_server_error() => Ok(()),
            _ => Err(ConfigError::InvalidStatus(self.failure_status)),
        }
    }

    /// The failure status as a `StatusCode`, falling back to 500 if invalid.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.failure_status)
            .ok()
            .filter(StatusCode::is_server_error)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Reads overrides from the environment on top of the defaults.
    ///
    /// Unset variables keep their default; malformed ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = env::var(FAILURE_STATUS_ENV) {
            config.failure_status = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: FAILURE_STATUS_ENV,
                value: raw.clone(),
            })?;
        }

        if let Ok(raw) = env::var(EXPOSE_ERROR_DETAILS_ENV) {
            config.expose_error_details = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: EXPOSE_ERROR_DETAILS_ENV,
                        value: raw,
                    })
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document. Missing fields take their defaults.
    #[cfg(feature = "config")]
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a YAML document. Missing fields take their defaults.
    #[cfg(feature = "config")]
    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failure status {0} is not a 5xx status code")]
    InvalidStatus(u16),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[cfg(feature = "config")]
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "config")]
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
