//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::store::StoreConfig;
use super::validation::ValidationError;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {}", join(.0))]
    Invalid(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Backing store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Log output configuration.
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        super::validate(&config).map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

/// Log output configuration.
///
/// `RUST_LOG` takes precedence over `filter` when set.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive (default: "info").
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;
    use crate::store::MemberIdentity;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.store.backend, Backend::Redis);
        assert_eq!(config.store.address, "127.0.0.1:6379");
        assert_eq!(config.store.password, "");
        assert_eq!(config.store.member_identity, MemberIdentity::Payload);
        assert_eq!(config.log.filter, "info");
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn parses_full_file() {
        let config = Config::parse(
            r#"
            [store]
            backend = "redb"
            path = "data/rooms.redb"
            member-identity = "entry"
            key-prefix = "chat:"

            [log]
            filter = "roomlog=debug"
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.backend, Backend::Redb);
        assert_eq!(config.store.path, "data/rooms.redb");
        assert_eq!(config.store.member_identity, MemberIdentity::Entry);
        assert_eq!(config.store.key_prefix, "chat:");
        assert_eq!(config.log.filter, "roomlog=debug");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn unknown_backend_is_a_parse_error() {
        let err = Config::parse("[store]\nbackend = \"mongo\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_combination_is_reported() {
        let err = Config::parse("[store]\nbackend = \"redis\"\nmember-identity = \"entry\"\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref errors) if errors.len() == 1));
        assert!(err.to_string().starts_with("invalid config:"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roomlog.toml");
        std::fs::write(&path, "[store]\nbackend = \"memory\"\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.store.backend, Backend::Memory);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Config::load("/nonexistent/roomlog.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
