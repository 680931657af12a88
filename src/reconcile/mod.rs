//! Reconciliation module.
//!
//! Merges a decoded report into persisted entities and associations:
//! - Core version deduplication (run-scoped cache)
//! - Extension upsert and client↔extension relinking
//! - Backend user upsert and client↔user relinking

pub mod backend_users;
pub mod core_version;
pub mod extensions;
pub mod version_number;

pub use backend_users::*;
pub use core_version::*;
pub use extensions::*;
pub use version_number::*;
