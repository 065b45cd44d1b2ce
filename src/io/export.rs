//! Export group assignments to CSV.
//!
//! One row per member, meant to be easy to open in a spreadsheet or feed to
//! downstream scripts. The generated cohort of `fsg demo` is written here too, in
//! the same schema `io::ingest` reads.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{Allocation, Role, ScoreRecord};
use crate::error::AppError;

const GROUP_HEADER: [&str; 14] = [
    "group",
    "target_size",
    "name",
    "assigned_role",
    "preference_level",
    "delta",
    "integrator",
    "primary",
    "secondary",
    "tertiary",
    "clarifier",
    "ideator",
    "developer",
    "implementer",
];

/// Write every group member to a CSV file.
pub fn write_groups_csv(path: &Path, allocation: &Allocation) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_groups(file, allocation)
}

/// Write every group member as CSV to `sink`.
pub fn write_groups<W: Write>(sink: W, allocation: &Allocation) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(sink);
    writer
        .write_record(GROUP_HEADER)
        .map_err(|e| AppError::usage(format!("Failed to write export CSV header: {e}")))?;

    for group in &allocation.groups {
        for member in allocation.members(group) {
            let s = member.student;
            let mut row = vec![
                group.id.to_string(),
                group.target_size.to_string(),
                s.name().to_string(),
                member.placement.role.to_string(),
                member.placement.level.rank().to_string(),
                format!("{:.1}", s.delta),
                s.is_integrator.to_string(),
                s.primary().to_string(),
                s.secondary().to_string(),
                s.tertiary().to_string(),
            ];
            row.extend(Role::ALL.iter().map(|&role| fmt_score(s.scores().get(role))));
            writer
                .write_record(&row)
                .map_err(|e| AppError::usage(format!("Failed to write export CSV row: {e}")))?;
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::usage(format!("Failed to flush export CSV: {e}")))
}

/// Write score records in the ingest schema (`name` + one column per role).
pub fn write_scores_csv(path: &Path, records: &[ScoreRecord]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create scores CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = vec!["name"];
    header.extend(Role::ALL.iter().map(|r| r.header_aliases()[1]));
    writer
        .write_record(&header)
        .map_err(|e| AppError::usage(format!("Failed to write scores CSV header: {e}")))?;

    for record in records {
        let mut row = vec![record.name.clone()];
        row.extend(Role::ALL.iter().map(|&role| fmt_score(record.scores.get(role))));
        writer
            .write_record(&row)
            .map_err(|e| AppError::usage(format!("Failed to write scores CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::usage(format!("Failed to flush scores CSV: {e}")))
}

fn fmt_score(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_allocation;
    use crate::domain::{AllocConfig, RoleScores, DEFAULT_MIN_SCORE};
    use crate::io::ingest::read_score_table;

    fn records() -> Vec<ScoreRecord> {
        vec![
            ScoreRecord::new("Ana, M.", RoleScores::new(14.0, 8.0, 10.0, 3.0)),
            ScoreRecord::new("Bo", RoleScores::new(4.0, 15.5, 2.0, 1.0)),
            ScoreRecord::new("Cy", RoleScores::new(4.0, 5.0, 12.0, 11.0)),
        ]
    }

    #[test]
    fn group_rows_cover_every_member() {
        let alloc = run_allocation(&records(), &AllocConfig::default()).unwrap();
        let mut buf = Vec::new();
        write_groups(&mut buf, &alloc).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("group,target_size,name,assigned_role"));
        assert!(text.contains("\"Ana, M.\""));
        assert!(text.contains("1,3,Cy,Developer,1,1.0,true,Developer,Implementer"));
    }

    #[test]
    fn scores_csv_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cohort.csv");
        write_scores_csv(&path, &records()).unwrap();

        let file = File::open(&path).unwrap();
        let report = read_score_table(file, DEFAULT_MIN_SCORE).unwrap();
        assert!(report.anomalies.is_empty());
        assert_eq!(report.records, records());
    }
}
