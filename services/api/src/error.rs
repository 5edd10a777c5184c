//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn load_with_bad_origin() -> Result<Config, ApiError> {
        let config = Config::from_lookup(|name| (name == "CORS_ORIGIN").then(|| "*".to_string()))?;
        Ok(config)
    }

    #[test]
    fn startup_config_errors_name_the_variable() {
        let err = load_with_bad_origin().unwrap_err();
        assert!(matches!(err, ApiError::Config(ConfigError::InvalidValue(ref name, _)) if name == "CORS_ORIGIN"));
        assert!(err.to_string().starts_with("Configuration error: "));
    }
}
