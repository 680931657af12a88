//! Data-integrity collaborator.
//!
//! Notified once after every completed client import run so downstream
//! consistency checks can run against the freshly imported data.

use super::orchestrator::ImportOutcome;

pub trait DataIntegrity {
    fn after_client_import(&self, outcome: &ImportOutcome) -> anyhow::Result<()>;
}

/// Integrity hook that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIntegrity;

impl DataIntegrity for NoopIntegrity {
    fn after_client_import(&self, _outcome: &ImportOutcome) -> anyhow::Result<()> {
        Ok(())
    }
}
