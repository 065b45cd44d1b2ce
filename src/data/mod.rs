//! Input data sources besides CSV files.
//!
//! - seeded synthetic cohorts for `fsg demo` and tests (`sample`)

pub mod sample;

pub use sample::*;
