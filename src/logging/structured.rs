//! Structured logging utilities.
//!
//! Provides context-aware logging with run_id and client_id included
//! in every log message.

use std::fmt;

/// Logging context for an import run.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub client_id: Option<i64>,
}

impl LogContext {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            client_id: None,
        }
    }

    pub fn with_client(&self, client_id: i64) -> Self {
        Self {
            run_id: self.run_id.clone(),
            client_id: Some(client_id),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.client_id {
            Some(cid) => write!(f, "[run={}] [client={}]", self.run_id, cid),
            None => write!(f, "[run={}]", self.run_id),
        }
    }
}

/// Initialize the process logger.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger(level: log::LevelFilter) {
    let _ = env_logger::builder()
        .filter_level(level)
        .format_timestamp_millis()
        .try_init();
}
