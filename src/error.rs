//! Error types.
//!
//! `ImportError` is what a single client's unit of work can fail with. Its
//! `Display` output is the exact text persisted into the client's
//! `error_message` column, so variants carry human-readable messages.

use thiserror::Error;

/// Failure of the relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{table} row {id} not found")]
    MissingRow { table: &'static str, id: i64 },
}

/// Failure of one client's fetch + decode + reconcile unit.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Unreachable host, timeout, invalid URL or non-OK HTTP status.
    #[error("{0}")]
    Transport(String),

    /// `client` is the client's title.
    #[error("Empty response from client {client}")]
    EmptyResponse { client: String },

    /// Payload is not JSON or lacks a required section.
    #[error("Invalid report payload: {0}")]
    Decode(String),

    /// Store write failure while upserting or relinking.
    #[error("Reconciliation failed: {0}")]
    Reconciliation(#[from] StoreError),
}

impl ImportError {
    /// Short label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            ImportError::Transport(_) => "transport",
            ImportError::EmptyResponse { .. } => "empty_response",
            ImportError::Decode(_) => "decode",
            ImportError::Reconciliation(_) => "reconciliation",
        }
    }
}

/// Failure to load `ImportConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_persistable() {
        let err = ImportError::EmptyResponse {
            client: "Shop".to_string(),
        };
        assert_eq!(err.to_string(), "Empty response from client Shop");

        let err = ImportError::Transport("HTTP 500 Internal Server Error".to_string());
        assert_eq!(err.to_string(), "HTTP 500 Internal Server Error");
        assert_eq!(err.kind(), "transport");
    }

    #[test]
    fn test_store_error_converts_to_reconciliation() {
        let err: ImportError = StoreError::MissingRow {
            table: "client",
            id: 7,
        }
        .into();
        assert_eq!(err.kind(), "reconciliation");
        assert_eq!(err.to_string(), "Reconciliation failed: client row 7 not found");
    }
}
