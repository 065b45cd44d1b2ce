//! Interactive prompts: choosing a score sheet and confirming ignored rows.
//!
//! Kept apart from clap parsing so `fsg` with no `-f` can list the CSV files
//! under the current directory and let the user pick one.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::io::ingest::IngestReport;

/// Directory recursion depth when looking for CSV files.
const DEFAULT_SEARCH_DEPTH: usize = 4;

/// Ask the user to select a score sheet from the current directory tree.
///
/// Accepts a number from the list or an explicit path; `q` cancels.
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let files = discover_csv_files();
    if files.is_empty() {
        return Err(AppError::usage(
            "No .csv files found. Provide one with `fsg assign -f <scores.csv>`.",
        ));
    }

    println!("Found {} CSV file(s):", files.len());
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, pretty_path(path));
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        print!("Select a score sheet by number (1-{}) or type a path (q to quit): ", files.len());
        flush_prompt()?;

        let mut line = String::new();
        let bytes = input
            .read_line(&mut line)
            .map_err(|e| AppError::usage(format!("Failed to read input: {e}")))?;
        if bytes == 0 {
            return Err(AppError::usage(
                "No input received. Provide a CSV path with `fsg assign -f <scores.csv>`.",
            ));
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Err(AppError::usage("Canceled."));
        }

        if let Ok(choice) = line.parse::<usize>() {
            if (1..=files.len()).contains(&choice) {
                return validate_csv_path(&files[choice - 1]);
            }
            println!("Invalid choice: {choice}. Enter a number between 1 and {}.", files.len());
            continue;
        }

        match validate_csv_path(Path::new(line)) {
            Ok(path) => return Ok(path),
            Err(err) => println!("{err}"),
        }
    }
}

/// Show the ignored rows and ask whether to continue with the valid ones.
///
/// Returns `true` straight away when nothing was ignored.
pub fn confirm_anomalies(report: &IngestReport) -> Result<bool, AppError> {
    if !report.needs_confirmation() {
        return Ok(true);
    }
    print!(
        "{}",
        crate::report::format_anomalies(&report.anomalies, report.records.len())
    );
    print!("Continue with the valid students? [y/N] ");
    flush_prompt()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| AppError::usage(format!("Failed to read input: {e}")))?;
    Ok(is_yes(&line))
}

/// Validate the path points to an existing `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::usage(format!("CSV file not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::usage(format!(
            "Expected a file, got a directory: {}",
            path.display()
        )));
    }
    if !has_csv_extension(path) {
        return Err(AppError::usage(format!(
            "Expected a .csv file (got: {}). Use -f to pass a CSV path.",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

/// `*.csv` files under the current directory, sorted by display path.
pub fn discover_csv_files() -> Vec<PathBuf> {
    find_csv_files(Path::new("."), DEFAULT_SEARCH_DEPTH)
}

fn find_csv_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk(root, 0, max_depth, &mut out);
    out.sort_by_key(|p| pretty_path(p));
    out
}

fn walk(dir: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if !should_skip_dir(&path) {
                walk(&path, depth + 1, max_depth, out);
            }
        } else if file_type.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

fn pretty_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

fn flush_prompt() -> Result<(), AppError> {
    io::stdout()
        .flush()
        .map_err(|e| AppError::usage(format!("Failed to write prompt: {e}")))
}

/// Only an explicit yes (`y`, `yes`, or Spanish `s`/`si`) accepts. EOF declines.
fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sí")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_extension_and_existence() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("Scores.CSV");
        let txt = dir.path().join("notes.txt");
        fs::write(&csv, "name\n").unwrap();
        fs::write(&txt, "hi").unwrap();

        assert_eq!(validate_csv_path(&csv).unwrap(), csv);
        assert!(validate_csv_path(&txt).is_err());
        assert!(validate_csv_path(dir.path()).is_err());
        assert!(validate_csv_path(&dir.path().join("missing.csv")).is_err());
    }

    #[test]
    fn walks_directories_and_skips_build_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("class/a")).unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("class/a/scores.csv"), "").unwrap();
        fs::write(dir.path().join("top.csv"), "").unwrap();
        fs::write(dir.path().join("target/ignored.csv"), "").unwrap();

        let found = find_csv_files(dir.path(), DEFAULT_SEARCH_DEPTH);
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"scores.csv".to_string()));
        assert!(names.contains(&"top.csv".to_string()));

        assert!(find_csv_files(dir.path(), 0).iter().all(|p| !p.ends_with("a/scores.csv")));
    }

    #[test]
    fn only_explicit_yes_accepts() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(is_yes("sí"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("maybe"));
    }
}
