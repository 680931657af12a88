//! Core version registry.
//!
//! Deduplicates core version strings into row ids. The cache is seeded
//! from the store when a run starts and lives only as long as that run.
//! The store's uniqueness constraint on the version string is the
//! authoritative guard; the cache only saves round trips.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::logging::structured::LogContext;
use crate::storage::{CoreVersionRow, NewCoreVersion, StoreTransaction};

use super::version_number::version_to_integer;

#[derive(Debug, Default)]
pub struct CoreVersionRegistry {
    /// Versions whose rows are committed.
    known: RwLock<HashMap<String, i64>>,
    /// Versions inserted inside the current, not yet committed, unit.
    staged: RwLock<HashMap<String, i64>>,
}

impl CoreVersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the cache from existing rows.
    pub fn from_rows(rows: Vec<CoreVersionRow>) -> Self {
        let known = rows.into_iter().map(|row| (row.version, row.id)).collect();
        Self {
            known: RwLock::new(known),
            staged: RwLock::new(HashMap::new()),
        }
    }

    /// Number of committed versions in the cache.
    pub fn cached_count(&self) -> usize {
        self.known.read().len()
    }

    pub fn cached(&self, version: &str) -> Option<i64> {
        self.known.read().get(version).copied()
    }

    /// Resolve a version string to its row id, inserting a row on first
    /// sight. New rows are non-official and insecure.
    pub fn resolve<T: StoreTransaction>(
        &self,
        tx: &T,
        version: &str,
        at: DateTime<Utc>,
        ctx: &LogContext,
    ) -> Result<i64, StoreError> {
        if let Some(id) = self.cached(version) {
            return Ok(id);
        }
        if let Some(id) = self.staged.read().get(version).copied() {
            return Ok(id);
        }

        let (id, inserted) = tx.insert_core_version(
            &NewCoreVersion {
                version: version.to_string(),
                version_integer: version_to_integer(version),
                is_official: false,
                insecure: true,
            },
            at,
        )?;
        self.staged.write().insert(version.to_string(), id);

        if inserted {
            log::info!("{} CORE_VERSION_CREATED version={} id={}", ctx, version, id);
        } else {
            log::debug!("{} CORE_VERSION_REUSED version={} id={}", ctx, version, id);
        }
        Ok(id)
    }

    /// Publish versions staged by the unit that just committed.
    pub fn confirm(&self) {
        let staged: Vec<(String, i64)> = self.staged.write().drain().collect();
        self.known.write().extend(staged);
    }

    /// Forget versions staged by a unit that rolled back.
    pub fn discard(&self) {
        self.staged.write().clear();
    }
}
