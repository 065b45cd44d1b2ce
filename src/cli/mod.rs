//! Command-line parsing for the FourSight group assignment tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the allocation code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    QuotaPolicy, DEFAULT_IDEAL_GROUP_SIZE, DEFAULT_MAX_GROUP_SIZE, DEFAULT_MIN_GROUP_SIZE, DEFAULT_MIN_SCORE,
    DEFAULT_TIE_THRESHOLD,
};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fsg", version, about = "FourSight role balancing and group assignment")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides this.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read a score sheet, balance roles, form groups and print the result.
    Assign(AssignArgs),
    /// Same pipeline as `assign`, shown in an interactive terminal UI.
    Tui(AssignArgs),
    /// Print a roster previously saved with `--export-roster`.
    Show(ShowArgs),
    /// Generate a synthetic cohort and run the pipeline on it.
    Demo(DemoArgs),
}

/// Options shared by `assign` and `tui`.
#[derive(Debug, Args, Clone)]
pub struct AssignArgs {
    /// Score sheet CSV (name + one column per role). Prompts when omitted.
    #[arg(short = 'f', long = "file", value_name = "CSV")]
    pub file: Option<PathBuf>,

    /// Rows whose best score is below this are flagged and ignored.
    #[arg(long, env = "FSG_MIN_SCORE", default_value_t = DEFAULT_MIN_SCORE)]
    pub min_score: f64,

    /// Continue without asking when some rows are ignored.
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Export per-member results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Save the roster (groups + integrators) as JSON for `fsg show`.
    #[arg(long = "export-roster", value_name = "JSON")]
    pub export_roster: Option<PathBuf>,

    #[command(flatten)]
    pub alloc: AllocArgs,
}

/// Allocation knobs.
#[derive(Debug, Args, Clone)]
pub struct AllocArgs {
    /// Maximum gap between the top two scores for a student to count as an integrator.
    #[arg(long, env = "FSG_TIE_THRESHOLD", default_value_t = DEFAULT_TIE_THRESHOLD)]
    pub tie_threshold: f64,

    /// Students per role: a number, or `groups` for one per planned group.
    #[arg(long, env = "FSG_QUOTA", default_value_t = QuotaPolicy::default())]
    pub quota: QuotaPolicy,

    /// Smallest allowed group.
    #[arg(long, env = "FSG_MIN_GROUP", default_value_t = DEFAULT_MIN_GROUP_SIZE)]
    pub min_group: usize,

    /// Largest allowed group.
    #[arg(long, env = "FSG_MAX_GROUP", default_value_t = DEFAULT_MAX_GROUP_SIZE)]
    pub max_group: usize,

    /// Preferred group size.
    #[arg(long, env = "FSG_IDEAL_GROUP", default_value_t = DEFAULT_IDEAL_GROUP_SIZE)]
    pub ideal_group: usize,
}

/// Options for printing a saved roster.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Roster JSON produced by `fsg assign --export-roster`.
    #[arg(long, value_name = "JSON")]
    pub roster: PathBuf,
}

/// Options for the synthetic demo.
#[derive(Debug, Args)]
pub struct DemoArgs {
    /// Number of students to generate.
    #[arg(short = 'n', long, default_value_t = 24)]
    pub count: usize,

    /// Random seed (same seed, same cohort).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Also write the generated cohort as a score sheet CSV.
    #[arg(long = "write-csv", value_name = "CSV")]
    pub write_csv: Option<PathBuf>,

    #[command(flatten)]
    pub alloc: AllocArgs,
}
