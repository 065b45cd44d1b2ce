//! Preference classification.
//!
//! Each score record becomes a `ClassifiedStudent` carrying its roles ranked by
//! score and the gap between the top two scores (`delta`). Equal scores keep the
//! fixed `Role::ALL` precedence so the ranking is a pure function of the scores.

use std::cmp::Ordering;

use crate::domain::{ClassifiedStudent, RoleMap, ScoreRecord};

/// Classify every record, preserving input order.
pub fn classify(records: &[ScoreRecord]) -> Vec<ClassifiedStudent> {
    records.iter().map(classify_one).collect()
}

/// Rank one record's roles and compute its delta.
pub fn classify_one(record: &ScoreRecord) -> ClassifiedStudent {
    let mut pairs = record.scores.pairs();
    // `sort_by` is stable: ties stay in `Role::ALL` order.
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let delta = (pairs[0].1 - pairs[1].1).max(0.0);

    ClassifiedStudent {
        record: record.clone(),
        ranking: pairs.map(|(role, _)| role),
        delta,
        is_integrator: false,
    }
}

/// Student indices grouped by primary role, each list in input order.
pub fn by_primary(students: &[ClassifiedStudent]) -> RoleMap<Vec<usize>> {
    let mut buckets: RoleMap<Vec<usize>> = RoleMap::default();
    for (idx, student) in students.iter().enumerate() {
        buckets[student.primary()].push(idx);
    }
    buckets
}
