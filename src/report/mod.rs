//! Reporting utilities: role counters, group blocks, integrator and anomaly lists.
//!
//! Formatters work on `GroupCard`/`MemberCard` values so a fresh allocation and a
//! saved roster render identically.

pub mod format;

pub use format::*;

/// What ingestion saw, for the run summary header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub source: String,
    pub rows_read: usize,
    pub rows_used: usize,
    pub rows_ignored: usize,
}
