//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the allocation code stays free of presentation concerns
//! - output changes are localized (the TUI reuses the same labels)

use crate::domain::{card_role_counts, Allocation, GroupCard, MemberCard, Role, RoleMap, RosterFile};
use crate::io::ingest::Anomaly;
use crate::report::IngestSummary;

const NAME_WIDTH: usize = 24;

/// Format the run summary (input stats + plan + balancing diagnostics).
pub fn format_run_summary(ingest: &IngestSummary, allocation: &Allocation) -> String {
    let mut out = String::new();

    out.push_str("=== fsg - FourSight group assignment ===\n");
    out.push_str(&format!("Input: {}\n", ingest.source));
    out.push_str(&format!(
        "Rows: read={} | used={} | ignored={}\n",
        ingest.rows_read, ingest.rows_used, ingest.rows_ignored
    ));
    out.push_str(&format!(
        "Groups: {} | sizes={}\n",
        allocation.groups.len(),
        fmt_sizes(&allocation.plan.sizes)
    ));
    out.push_str(&format!(
        "Quota per role: {} | tie threshold: {:.1}\n",
        allocation.quota, allocation.tie_threshold
    ));
    out.push_str(&format!(
        "Reassigned: overflow={} | integrator fill={} | integrators={}\n",
        allocation.overflowed.len(),
        allocation.filled.len(),
        allocation.integrators.len()
    ));
    for (role, count) in &allocation.shortfalls {
        out.push_str(&format!(
            "  (under quota) {}: {count} of {}\n",
            role.plural(),
            allocation.quota
        ));
    }
    out.push('\n');

    out
}

/// Per-role counts across all groups.
pub fn format_role_counts(counts: &RoleMap<usize>) -> String {
    let parts: Vec<String> = counts
        .iter()
        .map(|(role, count)| format!("{}: {count}", role.plural()))
        .collect();
    format!("Roles: {}\n", parts.join(" | "))
}

/// One block per group, one line per member.
pub fn format_groups(groups: &[GroupCard]) -> String {
    let mut out = String::new();
    for group in groups {
        out.push_str(&format!(
            "Group {} ({} members, target {})\n",
            group.id,
            group.members.len(),
            group.target_size
        ));
        out.push_str(&format!(
            "{:-<w$} {:-<12} {:-<10} {:-<6} {:-<10}\n",
            "",
            "",
            "",
            "",
            "",
            w = NAME_WIDTH
        ));
        for member in &group.members {
            out.push_str(format_member(member).trim_end());
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

/// Integrators with their deltas. Empty when there are none.
pub fn format_integrators(integrators: &[MemberCard]) -> String {
    if integrators.is_empty() {
        return String::new();
    }
    let mut out = String::from("Integrators (near-tied top roles):\n");
    for m in integrators {
        out.push_str(&format!(
            "- {} ({} / {}, Δ {:.1})\n",
            m.name,
            m.primary,
            m.secondary,
            m.delta
        ));
    }
    out
}

/// Ignored rows, as shown before asking whether to continue.
pub fn format_anomalies(anomalies: &[Anomaly], valid: usize) -> String {
    let mut out = String::from("The following rows have problems:\n\n");
    for a in anomalies {
        match &a.name {
            Some(name) => out.push_str(&format!("- Row {} ({name}): {}\n", a.line, a.reason)),
            None => out.push_str(&format!("- Row {}: {}\n", a.line, a.reason)),
        }
    }
    out.push_str(&format!("\n{valid} valid student(s) found.\n"));
    out
}

/// Full report for a saved roster.
pub fn format_roster(roster: &RosterFile) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} roster ({}) ===\n", roster.tool, roster.generated_at.format("%Y-%m-%d %H:%M UTC")));
    if let Some(source) = &roster.source {
        out.push_str(&format!("Input: {source}\n"));
    }
    out.push_str(&format!(
        "Groups: {} | sizes={} | quota per role: {} | tie threshold: {:.1}\n\n",
        roster.groups.len(),
        fmt_sizes(&roster.plan.sizes),
        roster.quota,
        roster.tie_threshold
    ));
    out.push_str(&format_role_counts(&card_role_counts(&roster.groups)));
    out.push('\n');
    out.push_str(&format_groups(&roster.groups));
    out.push_str(&format_integrators(&roster.integrators));
    out
}

/// Text report for a fresh allocation: counters, groups, integrators.
pub fn format_allocation(allocation: &Allocation) -> String {
    let mut out = String::new();
    out.push_str(&format_role_counts(&allocation.role_counts()));
    out.push('\n');
    out.push_str(&format_groups(&allocation.group_cards()));
    out.push_str(&format_integrators(&allocation.integrator_cards()));
    out
}

/// Short role tag used in tables.
pub fn role_tag(role: Role) -> &'static str {
    match role {
        Role::Clarifier => "CLR",
        Role::Ideator => "IDE",
        Role::Developer => "DEV",
        Role::Implementer => "IMP",
    }
}

fn format_member(m: &MemberCard) -> String {
    format!(
        "{:<w$} {:<12} {:<10} Δ{:<5.1} {}",
        truncate(&m.name, NAME_WIDTH),
        m.assigned_role.display_name(),
        m.preference_level.label(),
        m.delta,
        if m.is_integrator { "integrator" } else { "" },
        w = NAME_WIDTH
    )
}

fn fmt_sizes(sizes: &[usize]) -> String {
    let parts: Vec<String> = sizes.iter().map(|s| s.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
