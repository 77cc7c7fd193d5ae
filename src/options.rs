//! Command line options.

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

/// Computes permissive winning strategy templates for parity and
/// generalized parity games.
#[derive(Debug, Parser)]
#[command(name = "shrike", version, about)]
pub struct CliOptions {
    /// Verbosity of diagnostic output on stderr.
    #[arg(long, value_enum, default_value = "warn", global = true)]
    pub trace_level: TraceLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reads a game from stdin or a file, solves it and prints the winning
    /// region and the strategy template.
    Solve(SolveOptions),
    /// Converts a parity game into a generalized parity game, optionally
    /// augmenting it with random objectives.
    Convert(ConvertOptions),
    /// Checks whether the strategy template survives randomly drawn
    /// permanently unavailable edges.
    Faults(FaultOptions),
}

#[derive(Debug, Args)]
pub struct SolveOptions {
    /// Input file; stdin when absent. The format is auto-detected from the
    /// first token (`HOA:` or `parity`).
    pub input: Option<std::path::PathBuf>,

    /// Solve a parity game through the per-odd-color decomposition and the
    /// composition engine; the winning region is a sound lower bound.
    #[arg(long)]
    pub composed: bool,

    /// Add the objectives of a generalized parity game one at a time,
    /// reusing the template computed so far.
    #[arg(long)]
    pub incremental: bool,

    /// Print the cardinalities of the template parts.
    #[arg(long)]
    pub print_template_size: bool,

    /// Name actions by their transition label expression instead of the
    /// edge-node identifier.
    #[arg(long)]
    pub print_actions: bool,

    /// Print a per-vertex local template for every winning player-0 vertex.
    #[arg(long)]
    pub localize: bool,

    /// Echo the parsed game back before solving, in its native format or in
    /// PGSolver format with `--print-game=pg`.
    #[arg(
        long,
        value_enum,
        value_name = "FORMAT",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "native"
    )]
    pub print_game: Option<EchoFormat>,
}

#[derive(Debug, Args)]
pub struct ConvertOptions {
    /// Input file; stdin when absent.
    pub input: Option<std::path::PathBuf>,

    /// Number of random objectives to generate.
    #[arg(long, default_value_t = 0)]
    pub objectives: usize,

    /// Color ceiling for randomly generated objectives.
    #[arg(long, default_value_t = 3)]
    pub max_color: usize,

    /// Replace the original objective instead of keeping it in front.
    #[arg(long)]
    pub replace: bool,

    /// Split the parity objective into one three-color objective per odd
    /// color instead of generating random ones.
    #[arg(long, conflicts_with_all = ["objectives", "replace"])]
    pub split: bool,

    /// Seed for the random generator; drawn from entropy when absent.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct FaultOptions {
    /// Input file; stdin when absent.
    pub input: Option<std::path::PathBuf>,

    /// Percentage of the edges to declare permanently unavailable.
    #[arg(long, default_value_t = 1.0)]
    pub percent: f64,

    /// Number of independent draws to evaluate.
    #[arg(long, default_value_t = 1)]
    pub repetitions: usize,

    /// Seed for the random generator; drawn from entropy when absent.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// The format used to echo the parsed game.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum EchoFormat {
    /// The format the game was read in.
    Native,
    /// PGSolver format, regardless of the input format.
    Pg,
}

/// The level of diagnostic output.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum TraceLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<TraceLevel> for LevelFilter {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Off => LevelFilter::Off,
            TraceLevel::Error => LevelFilter::Error,
            TraceLevel::Warn => LevelFilter::Warn,
            TraceLevel::Info => LevelFilter::Info,
            TraceLevel::Debug => LevelFilter::Debug,
            TraceLevel::Trace => LevelFilter::Trace,
        }
    }
}
