//! Pipeline context management.
//!
//! Provides run context for logging and the run-wide timestamp.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;

/// Context for one import run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    /// Written as `tstamp` on every row the run touches.
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            run_id: format!("run-{}", &Uuid::new_v4().to_string()[..8]),
            started_at: Utc::now(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.run_id)
    }

    /// Create a log context for one client of this run.
    pub fn client_context(&self, client_id: i64) -> LogContext {
        self.log_context().with_client(client_id)
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
