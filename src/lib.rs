//! `foursight-groups` library crate.
//!
//! The binary (`fsg`) is a thin wrapper around this library so that:
//!
//! - the allocation core is testable without spawning processes
//! - ingest, reporting and the TUI stay separate from the algorithms

pub mod alloc;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod report;
pub mod tui;
