//! Client import orchestrator.
//!
//! Coordinates the full import of every eligible client:
//! 1. Fetch the client's report
//! 2. Decode it
//! 3. Resolve the core version, reconcile extensions and backend users
//! 4. Update the client row, all inside one store transaction
//! 5. On any failure, persist the error message and move on
//!
//! After the loop the data-integrity collaborator is notified and the
//! completion time of the client import is recorded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::UserMatching;
use crate::error::{ImportError, StoreError};
use crate::fetch::{RemoteFetcher, Transport};
use crate::logging::structured::LogContext;
use crate::reconcile::{reconcile_backend_users, reconcile_extensions, CoreVersionRegistry};
use crate::report::{decode, Bucket, Report};
use crate::storage::{ClientRow, ClientUpdate, Store, StoreTransaction};

use super::context::RunContext;
use super::integrity::{DataIntegrity, NoopIntegrity};

/// Name under which the completion time of client imports is recorded.
pub const IMPORT_CLASS_CLIENT: &str = "client";

/// Tally of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub success_count: usize,
    pub error_count: usize,
    /// The run stopped early on an external cancellation signal.
    pub cancelled: bool,
}

pub struct ClientImport<S, T> {
    store: S,
    fetcher: RemoteFetcher<T>,
    integrity: Box<dyn DataIntegrity>,
    user_matching: UserMatching,
    cancel: Option<Arc<AtomicBool>>,
    response_count: ImportOutcome,
}

impl<S: Store, T: Transport> ClientImport<S, T> {
    pub fn new(store: S, fetcher: RemoteFetcher<T>) -> Self {
        Self {
            store,
            fetcher,
            integrity: Box::new(NoopIntegrity),
            user_matching: UserMatching::default(),
            cancel: None,
            response_count: ImportOutcome::default(),
        }
    }

    pub fn with_integrity(mut self, integrity: Box<dyn DataIntegrity>) -> Self {
        self.integrity = integrity;
        self
    }

    pub fn with_user_matching(mut self, user_matching: UserMatching) -> Self {
        self.user_matching = user_matching;
        self
    }

    /// Stop between clients once `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Tally of the most recent run.
    pub fn response_count(&self) -> &ImportOutcome {
        &self.response_count
    }

    /// Import every eligible client, or only `target` if given.
    ///
    /// The core version cache is seeded from the store here and dropped
    /// when the run ends. Per-client failures are recorded on the client
    /// and counted; only a failure to load versions, list clients or
    /// record the import time aborts the run.
    pub fn run(&mut self, target: Option<i64>) -> Result<ImportOutcome, StoreError> {
        let run = RunContext::new();
        let ctx = run.log_context();

        let registry = CoreVersionRegistry::from_rows(self.store.core_versions()?);
        log::debug!(
            "{} CORE_VERSION_CACHE_LOADED versions={}",
            ctx,
            registry.cached_count()
        );

        let clients = self.store.eligible_clients(target)?;
        log::info!(
            "{} IMPORT_RUN_START clients={} target={:?}",
            ctx,
            clients.len(),
            target
        );

        let mut outcome = ImportOutcome::default();

        for client in &clients {
            if self.is_cancelled() {
                log::warn!(
                    "{} IMPORT_RUN_CANCELLED processed={}",
                    ctx,
                    outcome.success_count + outcome.error_count
                );
                outcome.cancelled = true;
                break;
            }

            let client_ctx = run.client_context(client.id);
            match self.import_single_client(&registry, client, run.started_at, &client_ctx) {
                Ok(update) => {
                    outcome.success_count += 1;
                    log::info!(
                        "{} CLIENT_IMPORT_COMPLETE core={} extensions={} backend_users={}",
                        client_ctx,
                        update.core,
                        update.extensions,
                        update.backend_users
                    );
                }
                Err(err) => {
                    outcome.error_count += 1;
                    self.handle_error(client, &err, &client_ctx);
                }
            }
        }

        if !outcome.cancelled {
            if let Err(e) = self.integrity.after_client_import(&outcome) {
                log::warn!("{} DATA_INTEGRITY_FAILED error={:#}", ctx, e);
            }
            self.store.set_import_time(IMPORT_CLASS_CLIENT, Utc::now())?;
        }

        log::info!(
            "{} IMPORT_RUN_COMPLETE success={} error={} cancelled={}",
            ctx,
            outcome.success_count,
            outcome.error_count,
            outcome.cancelled
        );

        self.response_count = outcome.clone();
        Ok(outcome)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// One client's unit of work.
    fn import_single_client(
        &mut self,
        registry: &CoreVersionRegistry,
        client: &ClientRow,
        at: DateTime<Utc>,
        ctx: &LogContext,
    ) -> Result<ClientUpdate, ImportError> {
        log::debug!("{} CLIENT_IMPORT_START title={}", ctx, client.title);

        let raw = self
            .fetcher
            .fetch(&client.title, &client.domain, &client.secret, ctx)?;
        let report = decode(&raw, ctx)?;

        match self.apply_report(registry, client.id, &report, at, ctx) {
            Ok(update) => {
                registry.confirm();
                Ok(update)
            }
            Err(e) => {
                registry.discard();
                Err(e.into())
            }
        }
    }

    /// Reconcile `report` and update the client row in one transaction.
    fn apply_report(
        &mut self,
        registry: &CoreVersionRegistry,
        client_id: i64,
        report: &Report,
        at: DateTime<Utc>,
        ctx: &LogContext,
    ) -> Result<ClientUpdate, StoreError> {
        let tx = self.store.begin()?;

        let core = registry.resolve(&tx, &report.core.typo3_version, at, ctx)?;
        let extensions = reconcile_extensions(&tx, client_id, &report.extensions, at, ctx)?;
        let backend_users = reconcile_backend_users(
            &tx,
            client_id,
            &report.users.backend,
            self.user_matching,
            at,
            ctx,
        )?;

        let update = ClientUpdate {
            php_version: report.core.php_version.clone(),
            mysql_version: report.core.mysql_client_version.clone(),
            core,
            extensions: extensions as i64,
            backend_users: backend_users as i64,
            extra_info: report.extra.stored_form(Bucket::Info),
            extra_warning: report.extra.stored_form(Bucket::Warning),
            extra_danger: report.extra.stored_form(Bucket::Danger),
        };
        tx.update_client(client_id, &update, at)?;
        tx.commit()?;

        Ok(update)
    }

    fn handle_error(&mut self, client: &ClientRow, error: &ImportError, ctx: &LogContext) {
        log::warn!(
            "{} CLIENT_IMPORT_FAILED kind={} error={}",
            ctx,
            error.kind(),
            error
        );

        if let Err(e) = self.store.record_client_error(client.id, &error.to_string()) {
            log::error!("{} CLIENT_ERROR_NOT_RECORDED error={}", ctx, e);
        }
    }
}
