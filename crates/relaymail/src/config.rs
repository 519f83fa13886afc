//! Relay configuration file.
//!
//! The file is a JSON object with `Sender`, `Host`, `Port`, `Username` and
//! `Password`. Missing fields are left empty (or `0` for the port); unknown
//! fields are ignored.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::session::Relay;

/// Directory under `~/.config` holding the default configuration.
pub const APP_DIR: &str = "relaymail";

/// File name of the default configuration.
pub const CONFIG_FILE: &str = "config.json";

/// Errors while locating or reading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No home directory to derive the default path from.
    #[error("failed to find the user's configuration file: home directory is unknown")]
    NoHomeDir,

    /// The file could not be read.
    #[error("failed to open configuration file at `{}`", path.display())]
    Open {
        /// Path that was tried.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid configuration object.
    #[error("failed to read configuration file at `{}`", path.display())]
    Parse {
        /// Path that was read.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Relay account settings.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct Config {
    /// Envelope sender address.
    #[serde(alias = "sender")]
    pub sender: String,
    /// Relay hostname, also the TLS server name.
    #[serde(alias = "host")]
    pub host: String,
    /// Relay submission port.
    #[serde(alias = "port")]
    pub port: u16,
    /// Login name.
    #[serde(alias = "username")]
    pub username: String,
    /// Login password.
    #[serde(alias = "password")]
    pub password: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("sender", &self.sender)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Loads the configuration from `path`, or from [`default_path`] if none is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the default path cannot be resolved, the file
    /// cannot be read, or it does not decode.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => default_path()?,
        };

        let contents = tokio::fs::read(&path)
            .await
            .map_err(|source| ConfigError::Open {
                path: path.clone(),
                source,
            })?;

        let config: Self = serde_json::from_slice(&contents)
            .map_err(|source| ConfigError::Parse { path: path.clone(), source })?;

        debug!(path = %path.display(), host = %config.host, port = config.port, "configuration loaded");
        Ok(config)
    }

    /// The relay endpoint described by this configuration.
    #[must_use]
    pub fn relay(&self) -> Relay {
        Relay {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

/// `${HOME}/.config/relaymail/config.json`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] if the home directory is unknown.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_DIR).join(CONFIG_FILE))
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "Sender": "alice@example.com",
        "Host": "smtp.example.com",
        "Port": 587,
        "Username": "alice",
        "Password": "secret1"
    }"#;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn loads_all_fields() {
        let file = write_config(SAMPLE);
        let config = Config::load(Some(file.path())).await.unwrap();
        assert_eq!(
            config,
            Config {
                sender: "alice@example.com".into(),
                host: "smtp.example.com".into(),
                port: 587,
                username: "alice".into(),
                password: "secret1".into(),
            }
        );
        assert_eq!(config.relay().to_string(), "smtp.example.com:587");
    }

    #[tokio::test]
    async fn missing_fields_take_zero_values() {
        let file = write_config(r#"{"host": "relay.internal", "Extra": true}"#);
        let config = Config::load(Some(file.path())).await.unwrap();
        assert_eq!(config.host, "relay.internal");
        assert_eq!(config.port, 0);
        assert!(config.sender.is_empty());
        assert!(config.password.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let file = write_config("{ \"Host\": ");
        let err = Config::load(Some(file.path())).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
        assert!(err.to_string().starts_with("failed to read configuration file"));
    }

    #[tokio::test]
    async fn missing_file_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = Config::load(Some(&path)).await.unwrap_err();
        assert!(matches!(err, ConfigError::Open { .. }), "got {err:?}");
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn default_path_layout() {
        if let Ok(path) = default_path() {
            assert!(path.ends_with(".config/relaymail/config.json"));
        }
    }

    #[test]
    fn debug_redacts_password() {
        let config: Config = serde_json::from_str(SAMPLE).unwrap();
        let rendered = format!("{config:?}");
        assert!(rendered.contains("smtp.example.com"));
        assert!(!rendered.contains("secret1"));
    }
}
