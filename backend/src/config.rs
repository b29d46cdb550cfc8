//! Application configuration.
//!
//! Settings come from a TOML file (`giftech.toml`) with environment
//! overrides for the bind address and the access-grant credentials. Every
//! section is optional; a missing file yields the defaults.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! body_limit_mb = 2
//!
//! [repository]
//! type = "local"
//!
//! [session]
//! ttl_minutes = 20
//!
//! [access_grant]
//! base_url = "https://www.tradingview.com"
//! script_id = "PUB;abc123"
//! timeout_secs = 20
//! ```
//!
//! The access-grant username and password are only read from
//! `ACCESS_GRANT_USER` and `ACCESS_GRANT_PASSWORD`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub access_grant: AccessGrantSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body, in megabytes
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_mb: default_body_limit_mb(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
        }
    }
}

/// Third-party access-grant session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// How long a signed-in session is reused before logging in again
    #[serde(default = "default_session_ttl_minutes")]
    pub ttl_minutes: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_minutes: default_session_ttl_minutes(),
        }
    }
}

impl SessionSettings {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.ttl_minutes)
    }
}

/// External access-grant service.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessGrantSettings {
    #[serde(default = "default_access_grant_url")]
    pub base_url: String,
    /// Script users are granted access to
    #[serde(default)]
    pub script_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default = "default_access_grant_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AccessGrantSettings {
    fn default() -> Self {
        Self {
            base_url: default_access_grant_url(),
            script_id: None,
            username: None,
            password: None,
            timeout_secs: default_access_grant_timeout_secs(),
        }
    }
}

impl AccessGrantSettings {
    /// Credentials and script id are all present.
    pub fn is_configured(&self) -> bool {
        self.username.is_some() && self.password.is_some() && self.script_id.is_some()
    }
}

impl fmt::Debug for AccessGrantSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGrantSettings")
            .field("base_url", &self.base_url)
            .field("script_id", &self.script_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit_mb() -> usize {
    2
}

fn default_repo_type() -> String {
    "local".to_string()
}

fn default_session_ttl_minutes() -> i64 {
    20
}

fn default_access_grant_url() -> String {
    "https://www.tradingview.com".to_string()
}

fn default_access_grant_timeout_secs() -> u64 {
    20
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Search the standard locations for `giftech.toml`.
    ///
    /// `GIFTECH_CONFIG` takes precedence when set. Returns defaults when no
    /// file exists.
    pub fn from_default_location() -> Result<Self, ConfigError> {
        if let Ok(explicit) = std::env::var("GIFTECH_CONFIG") {
            return Self::from_file(explicit);
        }

        let search_paths = [
            PathBuf::from("giftech.toml"),
            PathBuf::from("backend/giftech.toml"),
            PathBuf::from("../giftech.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "session.ttl_minutes",
                reason: format!("must be positive, got {}", self.session.ttl_minutes),
            });
        }
        if self.server.body_limit_mb == 0 {
            return Err(ConfigError::Invalid {
                key: "server.body_limit_mb",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.access_grant.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "access_grant.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Apply `HOST`, `PORT` and `ACCESS_GRANT_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        let mut config = self.with_overrides(std::env::var("HOST").ok(), std::env::var("PORT").ok())?;
        if let Ok(username) = std::env::var("ACCESS_GRANT_USER") {
            config.access_grant.username = Some(username);
        }
        if let Ok(password) = std::env::var("ACCESS_GRANT_PASSWORD") {
            config.access_grant.password = Some(password);
        }
        if let Ok(script_id) = std::env::var("ACCESS_GRANT_SCRIPT_ID") {
            config.access_grant.script_id = Some(script_id);
        }
        Ok(config)
    }

    fn with_overrides(mut self, host: Option<String>, port: Option<String>) -> Result<Self, ConfigError> {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { key: "PORT", value: port })?;
        }
        Ok(self)
    }

    /// Resolve the full configuration: file (or defaults), then environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::from_default_location()?.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.repository.repo_type, "local");
        assert_eq!(config.session.ttl(), chrono::Duration::minutes(20));
        assert_eq!(config.server.body_limit_bytes(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
body_limit_mb = 8

[repository]
type = "memory"

[session]
ttl_minutes = 5
"#;

        let config = AppConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.server.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.server.body_limit_mb, 8);
        assert_eq!(config.repository.repo_type, "memory");
        assert_eq!(config.session.ttl_minutes, 5);
    }

    #[test]
    fn test_partial_section_keeps_field_defaults() {
        let config = AppConfig::from_toml_str("[server]\nport = 3000\n").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let config = AppConfig::default()
            .with_overrides(Some("localhost".to_string()), Some("7070".to_string()))
            .unwrap();
        assert_eq!(config.server.bind_address(), "localhost:7070");
    }

    #[test]
    fn test_invalid_port_override_is_rejected() {
        let err = AppConfig::default()
            .with_overrides(None, Some("eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "PORT", .. }));
    }

    #[test]
    fn test_non_positive_session_ttl_is_rejected() {
        for ttl in ["0", "-5"] {
            let config = AppConfig::from_toml_str(&format!("[session]\nttl_minutes = {}\n", ttl)).unwrap();
            let err = config.validate().unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: "session.ttl_minutes", .. }));
        }
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_body_limit_saturates_instead_of_overflowing() {
        let server = ServerSettings {
            body_limit_mb: usize::MAX / 2,
            ..ServerSettings::default()
        };
        assert_eq!(server.body_limit_bytes(), usize::MAX);

        let config = AppConfig::from_toml_str("[server]\nbody_limit_mb = 0\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "server.body_limit_mb", .. })
        ));
    }

    #[test]
    fn test_access_grant_needs_all_credentials() {
        let config = AppConfig::from_toml_str("[access_grant]\nscript_id = \"PUB;1\"\nusername = \"ops\"\n").unwrap();
        assert_eq!(config.access_grant.base_url, "https://www.tradingview.com");
        assert!(!config.access_grant.is_configured());

        let mut settings = config.access_grant;
        settings.password = Some("hunter2".to_string());
        assert!(settings.is_configured());
        assert!(!format!("{:?}", settings).contains("hunter2"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = AppConfig::from_file("/nonexistent/giftech.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/giftech.toml"));
    }
}
