//! Configuration loading from files and the environment.

use std::io::Write;

use giftech_admin::config::{AppConfig, ConfigError};
use giftech_admin::db::RepositoryFactory;

mod support;

use support::with_scoped_env;

fn write_config(name: &str, content: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("giftech-{}-{}.toml", name, std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn test_explicit_config_path_is_used() {
    let path = write_config("explicit", "[server]\nport = 9100\n\n[session]\nttl_minutes = 5\n");
    let config = with_scoped_env(
        &[
            ("GIFTECH_CONFIG", Some(path.to_str().unwrap())),
            ("HOST", None),
            ("PORT", None),
        ],
        AppConfig::load,
    )
    .unwrap();

    assert_eq!(config.server.port, 9100);
    assert_eq!(config.session.ttl(), chrono::Duration::minutes(5));
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_env_overrides_file_values() {
    let path = write_config("override", "[server]\nhost = \"10.0.0.1\"\nport = 9100\n");
    let config = with_scoped_env(
        &[
            ("GIFTECH_CONFIG", Some(path.to_str().unwrap())),
            ("HOST", Some("127.0.0.1")),
            ("PORT", Some("9200")),
        ],
        AppConfig::load,
    )
    .unwrap();

    assert_eq!(config.server.bind_address(), "127.0.0.1:9200");
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_malformed_file_reports_parse_error() {
    let path = write_config("broken", "[server\nport = ");
    let err = with_scoped_env(&[("GIFTECH_CONFIG", Some(path.to_str().unwrap()))], AppConfig::load).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_invalid_port_env_is_rejected() {
    let err = with_scoped_env(&[("PORT", Some("http"))], || AppConfig::default().with_env_overrides()).unwrap_err();
    assert!(err.to_string().contains("PORT"));
}

#[tokio::test]
async fn test_repository_from_loaded_config() {
    let config = AppConfig::from_toml_str("[repository]\ntype = \"in-memory\"\n").unwrap();
    let repo = RepositoryFactory::from_settings(&config.repository).unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[test]
fn test_zero_session_ttl_in_file_is_rejected() {
    let path = write_config("zero-ttl", "[session]\nttl_minutes = 0\n");
    let err = with_scoped_env(&[("GIFTECH_CONFIG", Some(path.to_str().unwrap()))], AppConfig::load).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "session.ttl_minutes", .. }));
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_access_grant_credentials_come_from_env() {
    let path = write_config("access", "[access_grant]\nscript_id = \"PUB;42\"\n");
    let config = with_scoped_env(
        &[
            ("GIFTECH_CONFIG", Some(path.to_str().unwrap())),
            ("ACCESS_GRANT_USER", Some("ops@giftech.example")),
            ("ACCESS_GRANT_PASSWORD", Some("s3cret")),
            ("ACCESS_GRANT_SCRIPT_ID", None),
            ("HOST", None),
            ("PORT", None),
        ],
        AppConfig::load,
    )
    .unwrap();

    assert!(config.access_grant.is_configured());
    assert_eq!(config.access_grant.script_id.as_deref(), Some("PUB;42"));
    assert_eq!(config.access_grant.username.as_deref(), Some("ops@giftech.example"));
    let _ = std::fs::remove_file(path);
}
