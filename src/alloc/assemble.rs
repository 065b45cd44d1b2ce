//! Group assembly.
//!
//! Role buckets are dealt round-robin across the planned groups, one role at a
//! time in `Role::ALL` order, so every group receives roughly one member of each
//! role before any group receives a second. Round-robin ignores target sizes;
//! anyone it did not place goes to the first group with room.

use tracing::debug;

use crate::alloc::AllocError;
use crate::domain::{Group, GroupPlan, Placement, Role};

/// Build the groups for `placements` according to `plan`.
pub fn assemble_groups(placements: &[Placement], plan: &GroupPlan) -> Result<Vec<Group>, AllocError> {
    let mut groups = empty_groups(plan);
    let num_groups = groups.len();
    let mut placed = vec![false; placements.len()];

    if num_groups > 0 {
        for role in Role::ALL {
            let bucket = placements
                .iter()
                .enumerate()
                .filter(|(_, p)| p.role == role)
                .map(|(idx, _)| idx);
            for (i, idx) in bucket.enumerate() {
                groups[i % num_groups].members.push(idx);
                placed[idx] = true;
            }
        }
    }

    let leftovers: Vec<usize> = (0..placements.len()).filter(|&idx| !placed[idx]).collect();
    if !leftovers.is_empty() {
        debug!(count = leftovers.len(), "placing students missed by round-robin");
    }
    place_leftovers(&mut groups, &leftovers)?;

    Ok(groups)
}

fn empty_groups(plan: &GroupPlan) -> Vec<Group> {
    plan.sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| Group {
            id: i + 1,
            target_size: size,
            members: Vec::new(),
        })
        .collect()
}

/// First-fit placement into groups still below their target size.
fn place_leftovers(groups: &mut [Group], leftovers: &[usize]) -> Result<(), AllocError> {
    for &student in leftovers {
        let group = groups
            .iter_mut()
            .find(|g| g.members.len() < g.target_size)
            .ok_or(AllocError::NoCapacity { student })?;
        group.members.push(student);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PreferenceLevel;

    fn at(role: Role) -> Placement {
        Placement {
            role,
            level: PreferenceLevel::Primary,
        }
    }

    #[test]
    fn deals_each_role_across_groups() {
        let mut placements = Vec::new();
        for role in Role::ALL {
            for _ in 0..3 {
                placements.push(at(role));
            }
        }
        let plan = GroupPlan { sizes: vec![4, 4, 4] };
        let groups = assemble_groups(&placements, &plan).unwrap();

        assert_eq!(groups.len(), 3);
        for (g, group) in groups.iter().enumerate() {
            assert_eq!(group.id, g + 1);
            assert_eq!(group.members.len(), 4);
            let roles: Vec<Role> = group.members.iter().map(|&m| placements[m].role).collect();
            assert_eq!(roles, Role::ALL.to_vec());
        }
    }

    #[test]
    fn round_robin_can_exceed_targets() {
        let placements = vec![at(Role::Clarifier); 5];
        let plan = GroupPlan { sizes: vec![3, 2] };
        let groups = assemble_groups(&placements, &plan).unwrap();
        assert_eq!(groups[0].members, vec![0, 2, 4]);
        assert_eq!(groups[1].members, vec![1, 3]);

        // Target 1, but round-robin still hands the second group two members.
        let uneven = GroupPlan { sizes: vec![4, 1] };
        let groups = assemble_groups(&placements, &uneven).unwrap();
        assert_eq!(groups[1].members.len(), 2);
    }

    #[test]
    fn leftovers_go_to_first_group_with_room() {
        let mut groups = empty_groups(&GroupPlan { sizes: vec![1, 2] });
        groups[0].members.push(0);
        place_leftovers(&mut groups, &[1, 2]).unwrap();
        assert_eq!(groups[0].members, vec![0]);
        assert_eq!(groups[1].members, vec![1, 2]);
    }

    #[test]
    fn full_groups_are_a_capacity_error() {
        let mut groups = empty_groups(&GroupPlan { sizes: vec![1] });
        groups[0].members.push(0);
        assert_eq!(
            place_leftovers(&mut groups, &[7]),
            Err(AllocError::NoCapacity { student: 7 })
        );
    }

    #[test]
    fn empty_plan_with_students_fails() {
        let placements = vec![at(Role::Ideator)];
        let plan = GroupPlan { sizes: Vec::new() };
        assert_eq!(
            assemble_groups(&placements, &plan),
            Err(AllocError::NoCapacity { student: 0 })
        );
    }
}
