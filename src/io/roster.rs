//! Read/write roster JSON files.
//!
//! A roster is the portable, human-readable record of one allocation:
//! - run settings (quota, tie threshold, group plan)
//! - every group with its members' cards
//! - the integrator list
//!
//! `fsg show` re-renders a roster without re-running the pipeline. The schema
//! is defined by `domain::RosterFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{Allocation, RosterFile};
use crate::error::AppError;

const TOOL_NAME: &str = "fsg";

/// Build the roster for an allocation.
pub fn roster_from_allocation(allocation: &Allocation, source: Option<&Path>) -> RosterFile {
    RosterFile {
        tool: TOOL_NAME.to_string(),
        generated_at: Utc::now(),
        source: source.map(|p| p.display().to_string()),
        quota: allocation.quota,
        tie_threshold: allocation.tie_threshold,
        plan: allocation.plan.clone(),
        groups: allocation.group_cards(),
        integrators: allocation.integrator_cards(),
    }
}

/// Write a roster JSON file.
pub fn write_roster_json(path: &Path, roster: &RosterFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create roster JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, roster)
        .map_err(|e| AppError::internal(format!("Failed to write roster JSON: {e}")))?;
    Ok(())
}

/// Read a roster JSON file.
pub fn read_roster_json(path: &Path) -> Result<RosterFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::usage(format!("Failed to open roster JSON '{}': {e}", path.display())))?;
    let roster: RosterFile =
        serde_json::from_reader(file).map_err(|e| AppError::usage(format!("Invalid roster JSON: {e}")))?;
    Ok(roster)
}
