//! Pipeline orchestration module.
//!
//! Client import run that coordinates, per client:
//! - Remote fetch
//! - Report decoding
//! - Core version, extension and backend user reconciliation
//! - Client row update or error recording

pub mod context;
pub mod integrity;
pub mod orchestrator;

pub use context::*;
pub use integrity::*;
pub use orchestrator::*;
