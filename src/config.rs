//! Runtime configuration loaded from the environment (and an optional `.env` file).

use crate::analysis::Palette;
use crate::api::{RetryPolicy, DEFAULT_AIR_QUALITY_URL};
use crate::error::{AppError, Result};
use rand::Rng;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

const DEFAULT_STATE_FILE: &str = ".nefes_location.json";

/// Deployment environment. Controls default log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(AppError::Config(format!(
                "NEFES_ENV must be 'development' or 'production', got '{}'",
                other
            ))),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub air_quality_url: String,
    pub palette: Palette,
    pub state_file: PathBuf,
    pub session: String,
    pub log_dir: Option<PathBuf>,
    pub air_quality_retry: RetryPolicy,
    pub city_retry: RetryPolicy,
}

impl Config {
    /// Builds the configuration from `NEFES_*` environment variables.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let environment = match env::var("NEFES_ENV") {
            Ok(value) => value.parse()?,
            Err(_) => Environment::Production,
        };

        let palette = match env::var("NEFES_PALETTE") {
            Ok(value) => value.parse()?,
            Err(_) => Palette::Bright,
        };

        let air_quality_url =
            env::var("NEFES_AIR_QUALITY_URL").unwrap_or_else(|_| DEFAULT_AIR_QUALITY_URL.to_string());

        let state_file = env::var("NEFES_STATE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_FILE));

        let session = env::var("NEFES_SESSION").unwrap_or_else(|_| new_session_marker());

        let log_dir = env::var("NEFES_LOG_DIR").ok().map(PathBuf::from);

        let config = Self {
            environment,
            air_quality_url,
            palette,
            state_file,
            session,
            log_dir,
            air_quality_retry: RetryPolicy::air_quality(),
            city_retry: RetryPolicy::cities(),
        };
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }
}

/// A random marker identifying this process as one session.
pub fn new_session_marker() -> String {
    let value: u64 = rand::thread_rng().gen();
    format!("{:016x}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "NEFES_ENV",
            "NEFES_PALETTE",
            "NEFES_AIR_QUALITY_URL",
            "NEFES_STATE_FILE",
            "NEFES_SESSION",
            "NEFES_LOG_DIR",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.palette, Palette::Bright);
        assert_eq!(config.air_quality_url, DEFAULT_AIR_QUALITY_URL);
        assert_eq!(config.state_file, PathBuf::from(DEFAULT_STATE_FILE));
        assert_eq!(config.session.len(), 16);
        assert!(config.log_dir.is_none());
        assert_eq!(config.air_quality_retry.max_attempts, 3);
        assert_eq!(config.city_retry.max_attempts, 2);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        env::set_var("NEFES_ENV", "development");
        env::set_var("NEFES_PALETTE", "muted");
        env::set_var("NEFES_SESSION", "abc");
        env::set_var("NEFES_AIR_QUALITY_URL", "http://localhost:9999/v1/air-quality");
        let config = Config::from_env().unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.palette, Palette::Muted);
        assert_eq!(config.session, "abc");
        assert_eq!(config.air_quality_url, "http://localhost:9999/v1/air-quality");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_environment_is_rejected() {
        clear_env();
        env::set_var("NEFES_ENV", "staging");
        let result = Config::from_env();
        assert!(matches!(result, Err(AppError::Config(_))));
        clear_env();
    }

    #[test]
    fn test_session_markers_differ() {
        assert_ne!(new_session_marker(), new_session_marker());
    }
}
