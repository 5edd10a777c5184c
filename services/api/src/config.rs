//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    /// When absent, every generation call answers `CollaboratorUnavailable`.
    pub gemini_api_key: Option<String>,
    pub generation_api_base: String,
    pub text_model: String,
    pub vision_model: String,
    /// Number of exchanges kept per chat session.
    pub chat_max_history: usize,
    pub chat_session_ttl: Duration,
    pub cors_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8000)),
            log_level: Level::INFO,
            gemini_api_key: None,
            generation_api_base: DEFAULT_API_BASE.to_string(),
            text_model: DEFAULT_MODEL.to_string(),
            vision_model: DEFAULT_MODEL.to_string(),
            chat_max_history: 10,
            chat_session_ttl: Duration::from_secs(86_400),
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Server Settings ---
        let bind_address = match lookup("BIND_ADDRESS") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            None => defaults.bind_address,
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin);
        if cors_origin.trim() == "*" {
            return Err(ConfigError::InvalidValue(
                "CORS_ORIGIN".to_string(),
                "a wildcard origin cannot be combined with credentials".to_string(),
            ));
        }

        // --- Generation Settings ---
        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|key| !key.trim().is_empty());
        let generation_api_base =
            lookup("GENERATION_API_BASE").unwrap_or(defaults.generation_api_base);
        let text_model = lookup("TEXT_MODEL").unwrap_or(defaults.text_model);
        let vision_model = lookup("VISION_MODEL").unwrap_or(defaults.vision_model);

        // --- Chat Settings ---
        let chat_max_history = match lookup("CHAT_MAX_HISTORY") {
            Some(raw) => parse_number("CHAT_MAX_HISTORY", &raw)? as usize,
            None => defaults.chat_max_history,
        };
        let chat_session_ttl = match lookup("CHAT_SESSION_TTL_SECS") {
            Some(raw) => Duration::from_secs(parse_number("CHAT_SESSION_TTL_SECS", &raw)?),
            None => defaults.chat_session_ttl,
        };

        Ok(Self {
            bind_address,
            log_level,
            gemini_api_key,
            generation_api_base,
            text_model,
            vision_model,
            chat_max_history,
            chat_session_ttl,
            cors_origin,
        })
    }
}

fn parse_number(name: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue(
            name.to_string(),
            "must be greater than zero".to_string(),
        )),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address.to_string(), "0.0.0.0:8000");
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.text_model, "gemini-2.5-flash");
        assert_eq!(config.chat_max_history, 10);
        assert_eq!(config.chat_session_ttl, Duration::from_secs(86_400));
    }

    #[test]
    fn overrides_are_read() {
        let config = load(&[
            ("BIND_ADDRESS", "127.0.0.1:9000"),
            ("RUST_LOG", "debug"),
            ("GEMINI_API_KEY", "secret"),
            ("VISION_MODEL", "gemini-2.5-pro"),
            ("CHAT_MAX_HISTORY", "4"),
            ("CHAT_SESSION_TTL_SECS", "60"),
        ])
        .unwrap();
        assert_eq!(config.bind_address.port(), 9000);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.vision_model, "gemini-2.5-pro");
        assert_eq!(config.chat_max_history, 4);
        assert_eq!(config.chat_session_ttl, Duration::from_secs(60));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = load(&[("GEMINI_API_KEY", "  ")]).unwrap();
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            load(&[("BIND_ADDRESS", "nowhere")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "BIND_ADDRESS"
        ));
        assert!(matches!(
            load(&[("RUST_LOG", "chatty")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "RUST_LOG"
        ));
        assert!(matches!(
            load(&[("CHAT_MAX_HISTORY", "0")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "CHAT_MAX_HISTORY"
        ));
    }

    #[test]
    fn wildcard_cors_origin_is_rejected() {
        assert!(matches!(
            load(&[("CORS_ORIGIN", "*")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "CORS_ORIGIN"
        ));
        let config = load(&[("CORS_ORIGIN", "https://shop.example")]).unwrap();
        assert_eq!(config.cors_origin, "https://shop.example");
    }
}
