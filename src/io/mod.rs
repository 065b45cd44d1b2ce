//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - per-member group exports (CSV) (`export`)
//! - roster JSON read/write (`roster`)

pub mod export;
pub mod ingest;
pub mod roster;

pub use export::*;
pub use ingest::*;
pub use roster::*;
