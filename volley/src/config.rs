//! Service configuration.
//!
//! Every section is optional: a missing file or empty table yields the
//! built-in defaults, so the service runs unconfigured. An explicit
//! `VOLLEY_CONFIG` pointing at a missing file is still an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use volley_dispatch::DispatchPolicy;
use volley_relay::RelayTimeouts;

/// Configuration file locations, in precedence order after the
/// `VOLLEY_CONFIG` environment variable.
const DEFAULT_PATHS: &[&str] = &["./volley.config.toml", "/etc/volley/volley.config.toml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("VOLLEY_CONFIG points to non-existent file: {}", .0.display())]
    MissingEnvFile(PathBuf),

    #[error("failed to read config from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the dispatch API binds to.
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Relay connection settings shared by every batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Refuse to submit over plaintext when the relay lacks STARTTLS.
    pub require_tls: bool,
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub policy: DispatchPolicy,
    pub timeouts: RelayTimeouts,
}

impl Config {
    /// Loads configuration using the standard precedence:
    /// `VOLLEY_CONFIG` → `./volley.config.toml` →
    /// `/etc/volley/volley.config.toml` → built-in defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when a located file cannot be read or parsed,
    /// or when `VOLLEY_CONFIG` names a missing file.
    pub fn load() -> Result<Self, ConfigError> {
        match find_config_file()? {
            Some(path) => Self::from_file(&path),
            None => {
                tracing::info!("no configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reads and parses one specific file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

fn find_config_file() -> Result<Option<PathBuf>, ConfigError> {
    if let Ok(env_path) = std::env::var("VOLLEY_CONFIG") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::MissingEnvFile(path));
    }

    Ok(DEFAULT_PATHS
        .iter()
        .copied()
        .map(PathBuf::from)
        .find(|path| path.exists()))
}
