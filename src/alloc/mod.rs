//! Role allocation pipeline stages.
//!
//! Responsibilities:
//!
//! - rank each student's roles and measure preference confidence (`classify`)
//! - flag near-tied students as flexible integrators (`integrators`)
//! - balance role buckets toward a quota (`balance`)
//! - choose the group count and sizes (`sizing`)
//! - interleave role buckets across groups (`assemble`)
//!
//! Every stage is a pure function over in-memory data; orchestration lives in
//! `app::pipeline`.

use thiserror::Error;

pub mod assemble;
pub mod balance;
pub mod classify;
pub mod integrators;
pub mod sizing;

pub use assemble::*;
pub use balance::*;
pub use classify::*;
pub use integrators::*;
pub use sizing::*;

/// Errors raised by the allocation core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocError {
    #[error("no students to allocate")]
    EmptyCohort,

    /// The group plan does not cover every student. Indicates a sizing bug,
    /// not bad input.
    #[error("no group has room for student #{student} (plan capacity is smaller than the cohort)")]
    NoCapacity { student: usize },

    #[error("invalid allocation settings: {0}")]
    InvalidConfig(String),
}
