//! Report decoding.

use sha2::{Digest, Sha256};

use crate::error::ImportError;
use crate::logging::structured::LogContext;

use super::model::Report;

/// Parse raw bytes into a `Report`.
///
/// Fails with `ImportError::Decode` if the bytes are not JSON, if a
/// required section (`core`, `extensions`, `users.backend`) is missing, or
/// if the core version is empty.
pub fn decode(raw: &[u8], ctx: &LogContext) -> Result<Report, ImportError> {
    let report: Report = serde_json::from_slice(raw).map_err(|e| {
        log::warn!(
            "{} REPORT_DECODE_FAILED bytes={} content_hash={} error={}",
            ctx,
            raw.len(),
            compute_hash(raw),
            e
        );
        ImportError::Decode(e.to_string())
    })?;

    if report.core.typo3_version.trim().is_empty() {
        log::warn!("{} REPORT_DECODE_FAILED reason=empty_core_version", ctx);
        return Err(ImportError::Decode("core version is empty".to_string()));
    }

    log::debug!(
        "{} REPORT_DECODED core={} extensions={} backend_users={}",
        ctx,
        report.core.typo3_version,
        report.extensions.len(),
        report.users.backend.len()
    );

    Ok(report)
}

/// Compute SHA256 hash of content.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    hex::encode(result)
}
