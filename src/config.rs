//! # Application Configuration
//!
//! Read-only TOML configuration for the connect panel. The file is optional: a
//! missing file means defaults, a malformed file is an error. The application
//! never writes it, so credentials placed here stay under the operator's control.
//!
//! ```toml
//! [server]
//! host = "192.168.1.5"
//! port = "1883"
//!
//! [connection]
//! timeout_ms = 1000
//! keep_alive_secs = 5
//! client_id_prefix = "panel"
//! username = ""
//! password = ""
//! ```
//!
//! Lookup order: `$MQTTCONNECT_CONFIG`, then `<config dir>/mqttconnect/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::mqtt::config::{ConnectionSettings, Credentials, DEFAULT_CONNECT_TIMEOUT, DEFAULT_KEEP_ALIVE};

/// Environment variable overriding the configuration path.
pub const CONFIG_PATH_ENV: &str = "MQTTCONNECT_CONFIG";

const APP_DIR: &str = "mqttconnect";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub connection: ConnectionConfig,
}

/// Values the panel's input fields start with.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: "1883".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    pub timeout_ms: u64,
    pub keep_alive_secs: u64,
    pub client_id_prefix: Option<String>,
    pub username: String,
    pub password: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            keep_alive_secs: DEFAULT_KEEP_ALIVE.as_secs(),
            client_id_prefix: None,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("timeout_ms", &self.timeout_ms)
            .field("keep_alive_secs", &self.keep_alive_secs)
            .field("client_id_prefix", &self.client_id_prefix)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AppConfig {
    /// Path the configuration is read from, if one can be determined.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads from [`AppConfig::default_path`], falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                info!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        let connection = &self.connection;
        ConnectionSettings {
            connect_timeout: Duration::from_millis(connection.timeout_ms),
            keep_alive: Duration::from_secs(connection.keep_alive_secs),
            credentials: Credentials::new(
                connection.username.clone(),
                connection.password.clone(),
            ),
            client_id_prefix: connection.client_id_prefix.clone(),
        }
    }
}
