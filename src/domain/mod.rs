//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the closed `Role` enumeration and per-role containers (`RoleScores`, `RoleMap`)
//! - ingested score records and classified students
//! - the placement table, groups and the full `Allocation` of a run
//! - run configuration (`AllocConfig`, `IngestConfig`, `RunConfig`)
//! - presentation cards and the saved roster file

pub mod types;

pub use types::*;
