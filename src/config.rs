//! Configuration management for EduConnect
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{EduConnectError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for EduConnect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Session persistence settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Chat presentation settings
    #[serde(default)]
    pub chat: ChatConfig,
    /// Logging output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the EduConnect service; endpoints live under `/user/...`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://bitbasher-educonnect.hf.space".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl ApiConfig {
    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Where the session survives between process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackendKind {
    /// JSON file in the per-user data directory
    #[default]
    File,
    /// OS native credential store
    Keyring,
    /// Process memory only; nothing survives a restart
    Memory,
}

impl std::str::FromStr for SessionBackendKind {
    type Err = EduConnectError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            other => Err(EduConnectError::Config(format!(
                "Invalid session backend: {}. Must be one of: file, keyring, memory",
                other
            ))),
        }
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Storage backend for the persisted session
    #[serde(default)]
    pub backend: SessionBackendKind,

    /// Override for the session file location (file backend only)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Storage namespace; each profile holds an independent login
    #[serde(default = "default_profile")]
    pub profile: String,
}

fn default_profile() -> String {
    "default".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackendKind::default(),
            path: None,
            profile: default_profile(),
        }
    }
}

/// Chat presentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Label shown on assistant messages
    #[serde(default = "default_assistant_label")]
    pub assistant_label: String,

    /// Label used for the user when the login response carried no name
    #[serde(default = "default_user_label_fallback")]
    pub user_label_fallback: String,
}

fn default_assistant_label() -> String {
    "EduConnect".to_string()
}

fn default_user_label_fallback() -> String {
    "You".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            assistant_label: default_assistant_label(),
            user_label_fallback: default_user_label_fallback(),
        }
    }
}

/// Logging output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON-formatted log lines instead of human-readable ones
    #[serde(default)]
    pub json: bool,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed, or if
    /// an environment override has an invalid value
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        // A missing file means defaults; the binary reports it once logging is up.
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        config.apply_env_vars()?;
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EduConnectError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| EduConnectError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) -> Result<()> {
        if let Ok(base_url) = std::env::var("EDUCONNECT_API_BASE") {
            self.api.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("EDUCONNECT_TIMEOUT_SECONDS") {
            self.api.timeout_seconds = timeout.parse().map_err(|_| {
                EduConnectError::Config(format!(
                    "EDUCONNECT_TIMEOUT_SECONDS must be a number, got: {}",
                    timeout
                ))
            })?;
        }

        if let Ok(backend) = std::env::var("EDUCONNECT_SESSION_BACKEND") {
            self.session.backend = backend.parse()?;
        }

        if let Ok(path) = std::env::var("EDUCONNECT_SESSION_PATH") {
            self.session.path = Some(PathBuf::from(path));
        }

        if let Ok(profile) = std::env::var("EDUCONNECT_PROFILE") {
            self.session.profile = profile;
        }

        Ok(())
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.api_base {
            tracing::debug!("Using API base override from CLI: {}", base_url);
            self.api.base_url = base_url.clone();
        }

        if let Some(profile) = &cli.profile {
            self.session.profile = profile.clone();
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges
    /// and that required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(EduConnectError::Config("api.base_url cannot be empty".to_string()).into());
        }

        let base = url::Url::parse(&self.api.base_url).map_err(|e| {
            EduConnectError::Config(format!(
                "api.base_url is not a valid URL ({}): {}",
                self.api.base_url, e
            ))
        })?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(EduConnectError::Config(format!(
                "api.base_url must use http or https, got: {}",
                base.scheme()
            ))
            .into());
        }

        if self.api.timeout_seconds == 0 {
            return Err(EduConnectError::Config(
                "api.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.api.timeout_seconds > 300 {
            return Err(EduConnectError::Config(
                "api.timeout_seconds must be less than or equal to 300".to_string(),
            )
            .into());
        }

        if self.session.profile.trim().is_empty() {
            return Err(
                EduConnectError::Config("session.profile cannot be empty".to_string()).into(),
            );
        }

        if self.chat.assistant_label.trim().is_empty()
            || self.chat.user_label_fallback.trim().is_empty()
        {
            return Err(
                EduConnectError::Config("chat labels cannot be empty".to_string()).into(),
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            chat: ChatConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
