//! Import configuration.
//!
//! Layering: built-in defaults, then an optional TOML file, then
//! `T3MONITORING_*` environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_DATABASE: &str = "T3MONITORING_DATABASE";
pub const ENV_HTTP_TIMEOUT: &str = "T3MONITORING_HTTP_TIMEOUT";
pub const ENV_LOG_LEVEL: &str = "T3MONITORING_LOG_LEVEL";
pub const ENV_USER_MATCHING: &str = "T3MONITORING_USER_MATCHING";

/// How reported backend users are matched against existing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserMatching {
    /// Only users already associated with the client are candidates.
    #[default]
    Client,
    /// Any backend user row with the same user name is a candidate.
    Global,
}

impl UserMatching {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "client" => Some(UserMatching::Client),
            "global" => Some(UserMatching::Global),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Path and fixed query appended to the normalized client domain.
    pub endpoint: String,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            endpoint: "index.php?eID=t3monitoring".to_string(),
            user_agent: concat!("t3monitoring-core/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub database_path: PathBuf,
    pub log_level: String,
    pub http: HttpConfig,
    pub backend_user_matching: UserMatching,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("t3monitoring.sqlite"),
            log_level: "info".to_string(),
            http: HttpConfig::default(),
            backend_user_matching: UserMatching::Client,
        }
    }
}

impl ImportConfig {
    /// Load from an optional file, then apply process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply overrides from a key lookup (the environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        if let Some(raw) = get(ENV_DATABASE) {
            self.database_path = PathBuf::from(raw);
        }

        if let Some(raw) = get(ENV_HTTP_TIMEOUT) {
            self.http.timeout_secs = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_HTTP_TIMEOUT,
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = get(ENV_LOG_LEVEL) {
            self.log_level = raw;
        }

        if let Some(raw) = get(ENV_USER_MATCHING) {
            self.backend_user_matching =
                UserMatching::parse(&raw).ok_or(ConfigError::InvalidValue {
                    key: ENV_USER_MATCHING,
                    value: raw,
                })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "http.timeout_secs",
                value: "0".to_string(),
            });
        }
        if self.http.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "http.connect_timeout_secs",
                value: "0".to_string(),
            });
        }
        self.log_filter()?;
        Ok(())
    }

    pub fn log_filter(&self) -> Result<log::LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "log_level",
                value: self.log_level.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.endpoint, "index.php?eID=t3monitoring");
        assert_eq!(config.backend_user_matching, UserMatching::Client);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
database_path = "/var/lib/t3monitoring/db.sqlite"
backend_user_matching = "global"

[http]
timeout_secs = 5
"#
        )
        .unwrap();

        let config = ImportConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config.database_path,
            PathBuf::from("/var/lib/t3monitoring/db.sqlite")
        );
        assert_eq!(config.backend_user_matching, UserMatching::Global);
        assert_eq!(config.http.timeout_secs, 5);
        // Unset keys keep their defaults
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_from_file_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "http = 12").unwrap();

        let err = ImportConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DATABASE, "/tmp/other.sqlite"),
            (ENV_HTTP_TIMEOUT, " 7 "),
            (ENV_USER_MATCHING, "GLOBAL"),
            (ENV_LOG_LEVEL, ""),
        ]);

        let mut config = ImportConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/other.sqlite"));
        assert_eq!(config.http.timeout_secs, 7);
        assert_eq!(config.backend_user_matching, UserMatching::Global);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_invalid_override() {
        let mut config = ImportConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_HTTP_TIMEOUT).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: ENV_HTTP_TIMEOUT,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ImportConfig::default();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ImportConfig::default();
        config.log_level = "chatty".to_string();
        assert!(config.validate().is_err());
    }
}
