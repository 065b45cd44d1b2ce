//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main. It:
//! - loads `.env` defaults and parses CLI arguments
//! - sets up logging
//! - reads and validates the score sheet (asking before ignoring rows)
//! - runs the allocation pipeline
//! - prints reports or opens the TUI, and writes optional exports

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{AllocArgs, AssignArgs, Command, DemoArgs, ShowArgs};
use crate::data::{generate_cohort, SampleConfig};
use crate::domain::{AllocConfig, Allocation, IngestConfig, RunConfig, ScoreRecord, SizingConfig};
use crate::error::{AppError, EXIT_NO_DATA};
use crate::io::ingest::{load_score_table, IngestOutcome};
use crate::report::IngestSummary;

pub mod pipeline;

/// Entry point for the `fsg` binary.
pub fn run() -> Result<(), AppError> {
    // Environment defaults for the FSG_* options may live in a `.env` file.
    dotenvy::dotenv().ok();

    // `fsg` and `fsg -f x.csv` behave like `fsg assign ...`. Clap requires a
    // subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let tui = matches!(cli.command, Command::Tui(_));
    init_tracing(cli.verbose, tui);

    match cli.command {
        Command::Assign(args) => handle_assign(args),
        Command::Tui(args) => handle_tui(args),
        Command::Show(args) => handle_show(args),
        Command::Demo(args) => handle_demo(args),
    }
}

/// Records that passed validation plus the counts for the report header.
#[derive(Debug, Clone)]
pub struct LoadedCohort {
    pub records: Vec<ScoreRecord>,
    pub summary: IngestSummary,
}

fn handle_assign(args: AssignArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let Some(cohort) = load_cohort(&config.ingest, config.assume_yes)? else {
        return Ok(());
    };

    let allocation = pipeline::run_allocation(&cohort.records, &config.alloc)?;
    print!("{}", crate::report::format_run_summary(&cohort.summary, &allocation));
    print!("{}", crate::report::format_allocation(&allocation));

    write_exports(&config, &allocation)
}

fn handle_tui(args: AssignArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    // Prompts happen before the terminal switches to the alternate screen.
    let Some(cohort) = load_cohort(&config.ingest, config.assume_yes)? else {
        return Ok(());
    };
    crate::tui::run(cohort, config)
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let roster = crate::io::roster::read_roster_json(&args.roster)?;
    print!("{}", crate::report::format_roster(&roster));
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let sample = SampleConfig {
        count: args.count,
        seed: args.seed,
        ..SampleConfig::default()
    };
    let records = generate_cohort(&sample)?;
    debug!(count = records.len(), seed = sample.seed, "generated synthetic cohort");

    if let Some(path) = &args.write_csv {
        crate::io::export::write_scores_csv(path, &records)?;
        info!(path = %path.display(), "wrote synthetic score sheet");
    }

    let alloc = alloc_config_from_args(&args.alloc);
    let allocation = pipeline::run_allocation(&records, &alloc)?;
    let summary = IngestSummary {
        source: format!("synthetic cohort (seed {})", sample.seed),
        rows_read: records.len(),
        rows_used: records.len(),
        rows_ignored: 0,
    };
    print!("{}", crate::report::format_run_summary(&summary, &allocation));
    print!("{}", crate::report::format_allocation(&allocation));
    Ok(())
}

/// Resolve the input path (prompting when `-f` is missing) and collect options.
pub fn run_config_from_args(args: &AssignArgs) -> Result<RunConfig, AppError> {
    let csv_path = match &args.file {
        Some(path) => crate::cli::picker::validate_csv_path(path)?,
        None => crate::cli::picker::prompt_for_csv_path()?,
    };

    Ok(RunConfig {
        ingest: IngestConfig {
            csv_path,
            min_score: args.min_score,
        },
        alloc: alloc_config_from_args(&args.alloc),
        assume_yes: args.yes,
        export_csv: args.export.clone(),
        export_roster: args.export_roster.clone(),
    })
}

pub fn alloc_config_from_args(args: &AllocArgs) -> AllocConfig {
    AllocConfig {
        tie_threshold: args.tie_threshold,
        quota: args.quota,
        sizing: SizingConfig {
            min_size: args.min_group,
            max_size: args.max_group,
            ideal_size: args.ideal_group,
        },
    }
}

/// Read the score sheet and settle any ignored rows with the user.
///
/// `Ok(None)` means the user declined; a notice has already been printed.
pub fn load_cohort(ingest: &IngestConfig, assume_yes: bool) -> Result<Option<LoadedCohort>, AppError> {
    let report = load_score_table(ingest)?;
    let summary = IngestSummary {
        source: ingest.csv_path.display().to_string(),
        rows_read: report.rows_read,
        rows_used: report.records.len(),
        rows_ignored: report.anomalies.len(),
    };

    let accepted = assume_yes || crate::cli::picker::confirm_anomalies(&report)?;
    match report.outcome(accepted) {
        IngestOutcome::Ready(records) => Ok(Some(LoadedCohort { records, summary })),
        IngestOutcome::Cancelled => {
            eprintln!("Cancelled. No groups were formed.");
            Ok(None)
        }
        IngestOutcome::NoValidRows => Err(AppError::new(
            EXIT_NO_DATA,
            format!("No valid students found in {}.", summary.source),
        )),
    }
}

fn write_exports(config: &RunConfig, allocation: &Allocation) -> Result<(), AppError> {
    if let Some(path) = &config.export_csv {
        crate::io::export::write_groups_csv(path, allocation)?;
        info!(path = %path.display(), "wrote group CSV");
    }
    if let Some(path) = &config.export_roster {
        let roster = crate::io::roster::roster_from_allocation(allocation, Some(&config.ingest.csv_path));
        crate::io::roster::write_roster_json(path, &roster)?;
        info!(path = %path.display(), "wrote roster JSON");
    }
    Ok(())
}

/// Roster path used by the TUI export key: `<stem>.roster.json` beside the input.
pub fn default_roster_path(csv_path: &Path) -> PathBuf {
    let stem = csv_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("groups");
    csv_path.with_file_name(format!("{stem}.roster.json"))
}

fn init_tracing(verbosity: u8, tui: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbosity, tui).into());
    // A second init (tests calling `run`) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log level when `RUST_LOG` is unset.
fn default_filter(verbosity: u8, tui: bool) -> &'static str {
    if tui {
        return "off";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Rewrite argv so `fsg` defaults to `fsg assign`.
///
/// - `fsg`                      -> `fsg assign`
/// - `fsg -f x.csv ...`         -> `fsg assign -f x.csv ...`
/// - `fsg --help/--version/-h`  -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("assign".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "assign" | "tui" | "show" | "demo");
    if is_subcommand {
        return argv;
    }

    // A leading flag means "assign flags".
    if arg1.starts_with('-') {
        argv.insert(1, "assign".to_string());
    }
    argv
}
