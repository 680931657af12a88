//! Client report module.
//!
//! Typed representation of the JSON status report a client returns, and
//! the decoder that produces it from raw bytes.

pub mod decode;
pub mod model;
pub mod values;

pub use decode::*;
pub use model::*;
pub use values::*;
