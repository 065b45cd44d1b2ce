//! Shared allocation pipeline used by the CLI, the demo command and the TUI.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! classify -> integrators -> group plan -> quota -> balance -> assemble
//!
//! The front-ends only decide where records come from and how results are shown.

use tracing::{debug, info, warn};

use crate::alloc::{
    assemble_groups, balance_roles, classify, detect_integrators, plan_groups, AllocError,
};
use crate::domain::{AllocConfig, Allocation, GroupPlan, ScoreRecord};

/// Run every allocation stage over `records`.
///
/// Records must already be validated (non-empty names, four finite scores).
pub fn run_allocation(records: &[ScoreRecord], config: &AllocConfig) -> Result<Allocation, AllocError> {
    config.validate()?;
    if records.is_empty() {
        return Err(AllocError::EmptyCohort);
    }
    let n = records.len();

    // 1) Rank roles and flag near-ties.
    let mut students = classify(records);
    let integrators = detect_integrators(&mut students, config.tie_threshold);
    debug!(students = n, integrators = integrators.len(), "classified cohort");

    // 2) Plan the groups first: the per-role quota may depend on the group count.
    let plan = plan_groups(n, &config.sizing).unwrap_or_else(|| {
        warn!(students = n, "no group count satisfies the size bounds; using a single group");
        GroupPlan::single(n)
    });
    let quota = config.quota.resolve(plan.num_groups());
    debug!(groups = plan.num_groups(), sizes = ?plan.sizes, quota, "planned groups");

    // 3) Balance roles toward the quota.
    let balance = balance_roles(&students, &integrators, quota);

    // 4) Deal role buckets across the groups.
    let groups = assemble_groups(&balance.placements, &plan)?;

    info!(
        students = n,
        groups = groups.len(),
        overflowed = balance.overflowed.len(),
        filled = balance.filled.len(),
        "allocation complete"
    );

    Ok(Allocation {
        students,
        placements: balance.placements,
        groups,
        integrators,
        plan,
        quota,
        tie_threshold: config.tie_threshold,
        overflowed: balance.overflowed,
        filled: balance.filled,
        shortfalls: balance.shortfalls,
    })
}
