//! Structured logging with run context.
//!
//! Every log line of an import run carries the run id, and the client id
//! once a client is being processed, for easy correlation.

pub mod structured;

pub use structured::*;
