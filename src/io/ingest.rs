//! CSV ingest and validation of questionnaire score tables.
//!
//! This module turns a loosely formatted score sheet into validated
//! `ScoreRecord`s, and reports every row it had to ignore.
//!
//! Design goals:
//! - **Forgiving headers**: columns are matched by substring, case-insensitively,
//!   in English or Spanish (`Nombre del estudiante`, `Clarificador (puntaje)`, ...)
//! - **Row-level validation** (skip bad rows, but report what happened and where)
//! - **No prompting here**: whether ignored rows are acceptable is decided by the
//!   caller through `IngestReport::outcome`

use std::fmt;
use std::fs::File;
use std::io::Read;

use csv::StringRecord;
use tracing::{debug, warn};

use crate::domain::{IngestConfig, Role, RoleMap, RoleScores, ScoreRecord};
use crate::error::AppError;

/// Header fragments that identify the student name column.
const NAME_ALIASES: [&str; 4] = ["nombre", "estudiante", "name", "student"];

/// Why a row was ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum AnomalyReason {
    /// Missing name, or a missing/non-numeric score.
    Incomplete { detail: String },
    /// Every score is below the configured minimum.
    BelowMinimum { max_score: f64, min_score: f64 },
}

impl fmt::Display for AnomalyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyReason::Incomplete { detail } => write!(f, "incomplete data ({detail})"),
            AnomalyReason::BelowMinimum { max_score, min_score } => {
                write!(f, "highest score ({max_score}) is below {min_score}")
            }
        }
    }
}

/// A row that was ignored during validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Anomaly {
    /// 1-based file line (the header is line 1).
    pub line: usize,
    pub name: Option<String>,
    pub reason: AnomalyReason,
}

/// Result of reading and validating a score table.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub records: Vec<ScoreRecord>,
    pub anomalies: Vec<Anomaly>,
    pub rows_read: usize,
}

/// What the caller should do once any ignored rows have been reviewed.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Ready(Vec<ScoreRecord>),
    /// Ignored rows were shown and the user declined to continue.
    Cancelled,
    NoValidRows,
}

impl IngestReport {
    /// Ignored rows must be acknowledged before the records are used.
    pub fn needs_confirmation(&self) -> bool {
        !self.anomalies.is_empty()
    }

    /// Resolve the report given the user's answer about ignored rows.
    ///
    /// `accepted` is only consulted when there are anomalies.
    pub fn outcome(self, accepted: bool) -> IngestOutcome {
        if self.needs_confirmation() && !accepted {
            return IngestOutcome::Cancelled;
        }
        if self.records.is_empty() {
            return IngestOutcome::NoValidRows;
        }
        IngestOutcome::Ready(self.records)
    }
}

/// Open `config.csv_path` and validate its rows.
pub fn load_score_table(config: &IngestConfig) -> Result<IngestReport, AppError> {
    let file = File::open(&config.csv_path).map_err(|e| {
        AppError::usage(format!("Failed to open CSV '{}': {e}", config.csv_path.display()))
    })?;
    let report = read_score_table(file, config.min_score)?;
    debug!(
        path = %config.csv_path.display(),
        rows = report.rows_read,
        valid = report.records.len(),
        ignored = report.anomalies.len(),
        "ingested score table"
    );
    Ok(report)
}

/// Validate rows from any CSV source.
pub fn read_score_table<R: Read>(source: R, min_score: f64) -> Result<IngestReport, AppError> {
    if !min_score.is_finite() {
        return Err(AppError::usage(format!("Invalid minimum score: {min_score}")));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::usage(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let columns = resolve_columns(&headers)?;

    let mut records = Vec::new();
    let mut anomalies = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1, first data row is line 2.
        let line = idx + 2;
        rows_read += 1;

        let row = match result {
            Ok(r) => r,
            Err(e) => {
                anomalies.push(Anomaly {
                    line,
                    name: None,
                    reason: AnomalyReason::Incomplete {
                        detail: format!("CSV parse error: {e}"),
                    },
                });
                continue;
            }
        };

        // Spreadsheet exports often carry trailing blank lines.
        if row.iter().all(|field| field.is_empty()) {
            rows_read -= 1;
            continue;
        }

        match validate_row(&row, &columns, min_score) {
            Ok(record) => records.push(record),
            Err(reason) => {
                let name = cell(&row, columns.name).map(str::to_string);
                warn!(line, reason = %reason, "ignoring row");
                anomalies.push(Anomaly { line, name, reason });
            }
        }
    }

    Ok(IngestReport {
        records,
        anomalies,
        rows_read,
    })
}

/// Column positions for the name and each role score.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnMap {
    name: usize,
    roles: RoleMap<usize>,
}

fn resolve_columns(headers: &StringRecord) -> Result<ColumnMap, AppError> {
    let mut name = None;
    let mut roles: RoleMap<Option<usize>> = RoleMap::default();

    for (idx, header) in headers.iter().enumerate() {
        let key = normalize_header_name(header);
        if NAME_ALIASES.iter().any(|alias| key.contains(alias)) {
            if name.is_none() {
                name = Some(idx);
            }
            continue;
        }
        let matched = Role::ALL
            .into_iter()
            .find(|role| role.header_aliases().iter().any(|alias| key.contains(alias)));
        if let Some(role) = matched {
            if roles[role].is_none() {
                roles[role] = Some(idx);
            }
        }
    }

    let mut missing = Vec::new();
    if name.is_none() {
        missing.push("name");
    }
    for (role, col) in roles.iter() {
        if col.is_none() {
            missing.push(role.display_name());
        }
    }
    if !missing.is_empty() {
        return Err(AppError::usage(format!(
            "Missing required column(s): {}. Expected a name column and one score column per role \
             (Clarifier, Ideator, Developer, Implementer).",
            missing.join(", ")
        )));
    }

    // Every slot was checked above.
    let roles = RoleMap::from_fn(|role| roles[role].unwrap_or_default());
    Ok(ColumnMap {
        name: name.unwrap_or_default(),
        roles,
    })
}

fn normalize_header_name(name: &str) -> String {
    // Excel adds a BOM to UTF-8 CSVs; left in place it hides the first column.
    name.trim().trim_start_matches('\u{feff}').to_lowercase()
}

fn validate_row(row: &StringRecord, columns: &ColumnMap, min_score: f64) -> Result<ScoreRecord, AnomalyReason> {
    let name = cell(row, columns.name).ok_or_else(|| AnomalyReason::Incomplete {
        detail: "missing name".to_string(),
    })?;

    let mut scores = [0.0; 4];
    for role in Role::ALL {
        let raw = cell(row, columns.roles[role]).ok_or_else(|| AnomalyReason::Incomplete {
            detail: format!("missing {} score", role.display_name()),
        })?;
        scores[role.index()] = parse_score(raw).ok_or_else(|| AnomalyReason::Incomplete {
            detail: format!("invalid {} score '{raw}'", role.display_name()),
        })?;
    }

    let scores = RoleScores::new(scores[0], scores[1], scores[2], scores[3]);
    let max_score = scores.max();
    if max_score < min_score {
        return Err(AnomalyReason::BelowMinimum { max_score, min_score });
    }

    Ok(ScoreRecord::new(name, scores))
}

fn cell(row: &StringRecord, idx: usize) -> Option<&str> {
    row.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a score, accepting a decimal comma (`8,5`) as well as a point.
fn parse_score(s: &str) -> Option<f64> {
    let v = s
        .parse::<f64>()
        .ok()
        .or_else(|| s.replace(',', ".").parse::<f64>().ok())?;
    if v.is_finite() { Some(v) } else { None }
}
