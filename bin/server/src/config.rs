//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server, loaded
//! via the `config` crate from an optional file layered under environment
//! variables (`DISCOPOWER__SESSION__COOKIE_NAME=...`).
//!
//! See [`DiscoConfig`] for the discovery service options.

use discopower_disco::DiscoConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File read when no configuration path is given.
const DEFAULT_CONFIG_FILE: &str = "discopower";

/// Prefix of configuration environment variables.
const ENV_PREFIX: &str = "DISCOPOWER";

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// JSON file holding the metadata sets.
    pub metadata_path: PathBuf,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Discovery service configuration.
    #[serde(default)]
    pub disco: DiscoConfig,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Session duration in minutes.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_cookie_name() -> String {
    "discopower_session".to_string()
}

fn default_session_duration_minutes() -> i64 {
    60
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            duration_minutes: default_session_duration_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a file and environment variables.
    ///
    /// Without `path`, `discopower.{toml,json,yaml,...}` in the working
    /// directory is read if it exists. Environment variables override the
    /// file.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid, or
    /// if an explicitly given file cannot be read.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discopower_disco::ScoreMode;
    use std::io::Write;

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "discopower_session");
        assert_eq!(config.duration_minutes, 60);
        assert_eq!(config.cleanup_interval_seconds, 300);
        assert!(config.secure_cookies);
    }

    #[test]
    fn loads_toml_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            r#"
metadata_path = "/srv/discopower/metadata.json"

[session]
secure_cookies = false

[disco]
tab_order = ["norway", "misc"]
score = "suggest"
cdc_domain = "example.org"
"#
        )
        .expect("write config");

        let config = ServerConfig::load(Some(file.path())).expect("valid config");
        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert_eq!(
            config.metadata_path,
            PathBuf::from("/srv/discopower/metadata.json")
        );
        assert!(!config.session.secure_cookies);
        assert_eq!(config.session.duration_minutes, 60);
        assert_eq!(config.disco.tab_order, vec!["norway", "misc"]);
        assert_eq!(config.disco.score, ScoreMode::Suggest);
        assert_eq!(config.disco.default_weight, 100);
        assert_eq!(config.disco.cdc_settings().domain(), Some(".example.org"));
    }

    #[test]
    fn missing_metadata_path_is_an_error() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(file, "bind_address = \"0.0.0.0:8080\"").expect("write config");

        assert!(ServerConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.toml");
        assert!(ServerConfig::load(Some(&path)).is_err());
    }
}
