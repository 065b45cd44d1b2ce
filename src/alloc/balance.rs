//! Quota-based role balancing.
//!
//! Rules, applied per role in `Role::ALL` order:
//! 1. A role whose primary-preference count fits the quota keeps everyone.
//! 2. An oversubscribed role keeps the `quota` students with the largest delta
//!    (stable on ties) and moves the rest to their secondary role.
//! 3. Roles still below quota pull integrators that were not retained in their
//!    primary role, in integrator-list order.
//!
//! The pass is single-shot: a role pushed over quota by incoming overflow is not
//! balanced again.

use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::alloc::classify::by_primary;
use crate::domain::{ClassifiedStudent, Placement, PreferenceLevel, Role, RoleMap};

/// Output of the balancer.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleBalance {
    /// Final placement per student, indexed like the input.
    pub placements: Vec<Placement>,
    /// Students moved to their secondary role by overflow.
    pub overflowed: Vec<usize>,
    /// Integrators pulled into an under-quota role.
    pub filled: Vec<usize>,
    /// Roles left below quota, with their final count.
    pub shortfalls: Vec<(Role, usize)>,
}

impl RoleBalance {
    /// Current bucket sizes.
    pub fn counts(&self) -> RoleMap<usize> {
        count_roles(&self.placements)
    }
}

/// Balance students across roles toward `quota` members each.
pub fn balance_roles(students: &[ClassifiedStudent], integrators: &[usize], quota: usize) -> RoleBalance {
    let mut placements: Vec<Placement> = students.iter().map(Placement::primary).collect();
    let mut retained = vec![false; students.len()];
    let mut overflowed = Vec::new();

    let buckets = by_primary(students);
    for role in Role::ALL {
        let mut bucket = buckets[role].clone();
        if bucket.len() <= quota {
            for &idx in &bucket {
                retained[idx] = true;
            }
            continue;
        }

        // Most confident students keep the slot.
        bucket.sort_by(|&a, &b| {
            students[b]
                .delta
                .partial_cmp(&students[a].delta)
                .unwrap_or(Ordering::Equal)
        });

        let (kept, overflow) = bucket.split_at(quota);
        for &idx in kept {
            retained[idx] = true;
        }
        for &idx in overflow {
            placements[idx] = Placement {
                role: students[idx].secondary(),
                level: PreferenceLevel::Secondary,
            };
            overflowed.push(idx);
        }
        debug!(
            role = %role,
            primary = bucket.len(),
            overflow = overflow.len(),
            "role oversubscribed"
        );
    }

    let mut pulled = vec![false; students.len()];
    let mut filled = Vec::new();
    let mut counts = count_roles(&placements);

    for role in Role::ALL {
        while counts[role] < quota {
            let candidate = integrators
                .iter()
                .copied()
                .find(|&idx| !retained[idx] && !pulled[idx] && placements[idx].role != role);
            let Some(idx) = candidate else {
                break;
            };

            counts[placements[idx].role] -= 1;
            counts[role] += 1;
            placements[idx] = Placement {
                role,
                level: PreferenceLevel::Secondary,
            };
            pulled[idx] = true;
            filled.push(idx);
        }
    }

    let shortfalls: Vec<(Role, usize)> = Role::ALL
        .into_iter()
        .filter(|&role| counts[role] < quota)
        .map(|role| (role, counts[role]))
        .collect();
    for (role, count) in &shortfalls {
        warn!(role = %role, count, quota, "role remains under quota after integrator fill");
    }

    RoleBalance {
        placements,
        overflowed,
        filled,
        shortfalls,
    }
}

fn count_roles(placements: &[Placement]) -> RoleMap<usize> {
    let mut counts = RoleMap::default();
    for p in placements {
        counts[p.role] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::{classify, detect_integrators};
    use crate::domain::{RoleScores, ScoreRecord, DEFAULT_TARGET_PER_ROLE, DEFAULT_TIE_THRESHOLD};

    fn prepare(records: &[ScoreRecord]) -> (Vec<ClassifiedStudent>, Vec<usize>) {
        let mut students = classify(records);
        let integrators = detect_integrators(&mut students, DEFAULT_TIE_THRESHOLD);
        (students, integrators)
    }

    fn dominant(role: Role, name: &str) -> ScoreRecord {
        let mut s = [5.0; 4];
        s[role.index()] = 15.0;
        ScoreRecord::new(name, RoleScores::new(s[0], s[1], s[2], s[3]))
    }

    #[test]
    fn roles_within_quota_are_untouched() {
        let records: Vec<ScoreRecord> = Role::ALL
            .iter()
            .flat_map(|&role| (0..3).map(move |i| dominant(role, &format!("{role}-{i}"))))
            .collect();
        let (students, integrators) = prepare(&records);
        let balance = balance_roles(&students, &integrators, DEFAULT_TARGET_PER_ROLE);

        assert!(balance.overflowed.is_empty());
        assert!(balance.filled.is_empty());
        for (idx, p) in balance.placements.iter().enumerate() {
            assert_eq!(p.role, students[idx].primary());
            assert_eq!(p.level, PreferenceLevel::Primary);
        }
        // Three per role, nobody flexible: every role stays short.
        assert_eq!(balance.shortfalls.len(), 4);
    }

    #[test]
    fn overflow_moves_lowest_delta_to_secondary() {
        // Ten Clarifiers; the secondary score shrinks the delta as i grows.
        let records: Vec<ScoreRecord> = (0..10)
            .map(|i| {
                let second = 2.0 + i as f64;
                let secondary_role = Role::ALL[1 + i % 3];
                let mut s = [1.0; 4];
                s[0] = 20.0;
                s[secondary_role.index()] = second;
                ScoreRecord::new(format!("S{i}"), RoleScores::new(s[0], s[1], s[2], s[3]))
            })
            .collect();
        let (students, integrators) = prepare(&records);
        assert!(integrators.is_empty());

        let balance = balance_roles(&students, &integrators, 6);

        assert_eq!(balance.overflowed, vec![6, 7, 8, 9]);
        for idx in 0..6 {
            assert_eq!(balance.placements[idx].role, Role::Clarifier);
        }
        for idx in 6..10 {
            assert_eq!(balance.placements[idx].role, students[idx].secondary());
            assert_eq!(balance.placements[idx].level, PreferenceLevel::Secondary);
        }
        assert_eq!(balance.counts()[Role::Clarifier], 6);
    }

    #[test]
    fn equal_deltas_keep_input_order() {
        let records: Vec<ScoreRecord> = (0..4).map(|i| dominant(Role::Developer, &format!("D{i}"))).collect();
        let (students, integrators) = prepare(&records);
        let balance = balance_roles(&students, &integrators, 2);

        assert_eq!(balance.overflowed, vec![2, 3]);
        assert_eq!(balance.placements[0].role, Role::Developer);
        assert_eq!(balance.placements[1].role, Role::Developer);
    }

    #[test]
    fn overflowed_integrators_fill_short_roles() {
        // Three Ideators, quota 2. The two weakest are near-tied with Developer.
        let records = vec![
            ScoreRecord::new("strong", RoleScores::new(1.0, 20.0, 5.0, 1.0)),
            ScoreRecord::new("tie-a", RoleScores::new(1.0, 12.0, 11.0, 1.0)),
            ScoreRecord::new("tie-b", RoleScores::new(1.0, 12.0, 11.0, 1.0)),
            ScoreRecord::new("dev", RoleScores::new(1.0, 2.0, 18.0, 1.0)),
        ];
        let (students, integrators) = prepare(&records);
        assert_eq!(integrators, vec![1, 2]);

        let balance = balance_roles(&students, &integrators, 2);

        // tie-b overflows to Developer, then is pulled into Clarifier.
        assert_eq!(balance.overflowed, vec![2]);
        assert_eq!(balance.filled, vec![2]);
        assert_eq!(balance.placements[2].role, Role::Clarifier);
        assert_eq!(balance.placements[2].level, PreferenceLevel::Secondary);
        // Retained integrators are never pulled.
        assert_eq!(balance.placements[1].role, Role::Ideator);
        assert_eq!(balance.placements[1].level, PreferenceLevel::Primary);
    }

    #[test]
    fn overflow_can_push_a_role_past_quota() {
        // Ten Clarifiers whose runner-up is always Ideator, plus six Ideators.
        let mut records: Vec<ScoreRecord> = (0..10)
            .map(|i| ScoreRecord::new(format!("C{i}"), RoleScores::new(20.0, 5.0 + i as f64, 1.0, 1.0)))
            .collect();
        records.extend((0..6).map(|i| dominant(Role::Ideator, &format!("I{i}"))));
        let (students, integrators) = prepare(&records);
        assert!(integrators.is_empty());

        let balance = balance_roles(&students, &integrators, 6);

        assert_eq!(balance.overflowed, vec![6, 7, 8, 9]);
        let counts = balance.counts();
        assert_eq!(counts[Role::Clarifier], 6);
        // Single pass: Ideator is not rebalanced after absorbing the overflow.
        assert_eq!(counts[Role::Ideator], 10);
        for idx in 10..16 {
            assert_eq!(balance.placements[idx].role, Role::Ideator);
            assert_eq!(balance.placements[idx].level, PreferenceLevel::Primary);
        }
        assert_eq!(balance.shortfalls, vec![(Role::Developer, 0), (Role::Implementer, 0)]);
    }

    #[test]
    fn fill_skips_integrators_on_the_target_role_and_drains_the_donor() {
        let records = vec![
            ScoreRecord::new("ide-1", RoleScores::new(1.0, 20.0, 1.0, 1.0)),
            ScoreRecord::new("ide-2", RoleScores::new(1.0, 19.0, 1.0, 1.0)),
            ScoreRecord::new("tie-dev", RoleScores::new(1.0, 12.0, 11.0, 1.0)),
            ScoreRecord::new("tie-imp", RoleScores::new(1.0, 12.0, 1.0, 11.0)),
            dominant(Role::Clarifier, "clar-1"),
            dominant(Role::Clarifier, "clar-2"),
            dominant(Role::Implementer, "imp-1"),
        ];
        let (students, integrators) = prepare(&records);
        assert_eq!(integrators, vec![2, 3]);

        let balance = balance_roles(&students, &integrators, 2);

        // After overflow: tie-dev sits on Developer, tie-imp on Implementer.
        assert_eq!(balance.overflowed, vec![2, 3]);
        // Developer skips tie-dev (already there) and pulls tie-imp, which
        // leaves Implementer short; Implementer then pulls tie-dev back out.
        assert_eq!(balance.filled, vec![3, 2]);
        assert_eq!(balance.placements[3].role, Role::Developer);
        assert_eq!(balance.placements[2].role, Role::Implementer);
        assert_eq!(balance.placements[2].level, PreferenceLevel::Secondary);

        let counts = balance.counts();
        assert_eq!(counts[Role::Developer], 1);
        assert_eq!(counts[Role::Implementer], 2);
        assert_eq!(balance.shortfalls, vec![(Role::Developer, 1)]);
    }

    #[test]
    fn shortfall_is_reported_not_fatal() {
        let records = vec![dominant(Role::Implementer, "only")];
        let (students, integrators) = prepare(&records);
        let balance = balance_roles(&students, &integrators, 1);

        assert_eq!(
            balance.shortfalls,
            vec![(Role::Clarifier, 0), (Role::Ideator, 0), (Role::Developer, 0)]
        );
        assert_eq!(balance.placements[0].role, Role::Implementer);
    }
}
