//! Remote fetch module.
//!
//! Retrieves the raw status report of one client:
//! - Domain normalization and import URL construction
//! - A `Transport` seam over the HTTP client
//! - Empty-body detection

pub mod domain;
pub mod fetcher;
pub mod transport;

pub use domain::*;
pub use fetcher::*;
pub use transport::*;
