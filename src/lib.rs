//! t3monitoring Core - Client report import and reconciliation
//!
//! This crate fetches a status report from every registered client host
//! and merges it into the local relational store. The implementation
//! prioritizes:
//!
//! 1. **Isolation** - One client's failure never affects another client
//! 2. **Consistency** - Each client is reconciled inside one transaction
//! 3. **Logging** - Every decision point logged with run and client context
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - Import orchestrator, run context, integrity hook
//! - `fetch` - Domain normalization and HTTP transport
//! - `report` - Typed report and decoder
//! - `reconcile` - Core version, extension and backend user reconciliation
//! - `storage` - Store traits, SQL text and the SQLite store
//! - `config` - Layered configuration
//! - `logging` - Structured logging with run context

pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod storage;

use anyhow::Context;

pub use config::{ImportConfig, UserMatching};
pub use error::{ConfigError, ImportError, StoreError};
pub use logging::init_logger;
pub use pipeline::{ClientImport, DataIntegrity, ImportOutcome, NoopIntegrity};

use fetch::{HttpTransport, RemoteFetcher};
use storage::SqliteStore;

/// Run a client import against the configured SQLite database.
///
/// This is the main entry point. It handles:
/// - Opening (and bootstrapping) the store
/// - Building the HTTP transport with the configured timeouts
/// - Importing every eligible client, or only `client_id`
///
/// # Returns
/// The success/error tally of the run
pub fn run_client_import(
    config: &ImportConfig,
    client_id: Option<i64>,
) -> anyhow::Result<ImportOutcome> {
    let store = SqliteStore::open(&config.database_path).with_context(|| {
        format!(
            "failed to open database {}",
            config.database_path.display()
        )
    })?;
    let transport = HttpTransport::new(&config.http)?;
    let fetcher = RemoteFetcher::new(transport, &config.http.endpoint);

    let mut import =
        ClientImport::new(store, fetcher).with_user_matching(config.backend_user_matching);

    let outcome = import.run(client_id).context("client import run failed")?;
    Ok(outcome)
}
