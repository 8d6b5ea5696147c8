//! Server configuration.
//!
//! Loaded from an optional TOML file; CLI flags override individual fields.
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:8050"
//! journal = "crossings.jsonl"
//!
//! [arbiter]
//! resting_period = "5s"
//! heartbeat_timeout = "10s"
//! tick_interval = "250ms"
//!
//! [arbiter.fairness]
//! max_consecutive = 3
//! max_head_wait = "30s"
//! ```

use onelane_arbiter::ArbiterConfig;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default listen address, the port the original bridge clients dial.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8050";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// The `[server]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Address the HTTP API binds to.
    pub listen: SocketAddr,

    /// Append-only crossing journal. No journal when absent.
    pub journal: Option<PathBuf>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8050)),
            journal: None,
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ListenConfig,
    pub arbiter: ArbiterConfig,
}

impl ServerConfig {
    /// Parse a TOML document. Missing tables and fields take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.server.listen = listen;
        self
    }

    pub fn with_journal(mut self, journal: PathBuf) -> Self {
        self.server.journal = Some(journal);
        self
    }

    /// Reject settings the runner cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let arbiter = &self.arbiter;
        let periods = [
            ("tick_interval", arbiter.tick_interval),
            ("liveness_interval", arbiter.liveness_interval),
            ("heartbeat_timeout", arbiter.heartbeat_timeout),
        ];
        for (name, value) in periods {
            if value == Duration::ZERO {
                return Err(ConfigError::Invalid(format!("{} must be non-zero", name)));
            }
        }
        if arbiter.heartbeat_timeout <= arbiter.liveness_interval {
            return Err(ConfigError::Invalid(
                "heartbeat_timeout must exceed liveness_interval".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.server.listen.to_string(), DEFAULT_LISTEN);
        assert_eq!(config.arbiter.resting_period, Duration::from_secs(5));
    }

    #[test]
    fn test_humantime_durations() {
        let config = ServerConfig::from_toml_str(
            r#"
            [server]
            listen = "127.0.0.1:9000"
            journal = "/tmp/crossings.jsonl"

            [arbiter]
            resting_period = "2s"
            tick_interval = "100ms"

            [arbiter.fairness]
            max_consecutive = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen.port(), 9000);
        assert_eq!(
            config.server.journal.as_deref(),
            Some(Path::new("/tmp/crossings.jsonl"))
        );
        assert_eq!(config.arbiter.resting_period, Duration::from_secs(2));
        assert_eq!(config.arbiter.tick_interval, Duration::from_millis(100));
        assert_eq!(config.arbiter.fairness.max_consecutive, 5);
        assert_eq!(config.arbiter.fairness.max_head_wait, Duration::from_secs(30));
    }

    #[test]
    fn test_rejects_zero_tick() {
        let err = ServerConfig::from_toml_str("[arbiter]\ntick_interval = \"0s\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_duration() {
        let err = ServerConfig::from_toml_str("[arbiter]\nresting_period = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::default()
            .with_listen("127.0.0.1:1234".parse().unwrap())
            .with_journal(PathBuf::from("j.jsonl"));
        assert_eq!(config.server.listen.port(), 1234);
        assert_eq!(config.server.journal, Some(PathBuf::from("j.jsonl")));
    }
}
