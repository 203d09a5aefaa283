//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Timesheet tally.
///
/// Sums worked hours from manually written timesheets. Valid entry lines
/// look like `12.03-13:52 Did a lot @Reading ( @JOB )`, where `@JOB` is the
/// project category and `@Reading` an activity tag.
#[derive(Debug, Parser)]
#[command(name = "tally", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Day-by-day summaries and per-category totals.
    Report(ReportArgs),

    /// Per-category activity breakdown with percentages.
    Activity(ActivityArgs),

    /// Tag occurrence counts, most common first.
    Tags(TagsArgs),

    /// Render the aggregation as a Sankey flow diagram (HTML).
    Flow(FlowArgs),
}

/// Input selection and filtering shared by every subcommand.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Timesheet files to read, in order.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Only credit this category, e.g. `@JOB`.
    #[arg(long)]
    pub category: Option<String>,

    /// Only consider entry lines containing this text (repeatable).
    #[arg(long)]
    pub include: Vec<String>,

    /// Skip entry lines containing this text (repeatable).
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Print the lines kept after filtering.
    #[arg(long)]
    pub show_included: bool,

    /// Tag alias file with `OldTag, =NewTag` rules.
    #[arg(long)]
    pub alias_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Emit the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Print durations as `H:MM` instead of part-hours.
    #[arg(long)]
    pub clock: bool,

    /// Scale durations so the grand total equals this many minutes.
    #[arg(long, value_name = "MINUTES")]
    pub scale_to: Option<f64>,

    /// Suppress the day-by-day lines.
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Args)]
pub struct ActivityArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print durations as `H:MM` instead of part-hours.
    #[arg(long)]
    pub clock: bool,
}

#[derive(Debug, Args)]
pub struct TagsArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct FlowArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output HTML file.
    #[arg(long, default_value = "flow.html")]
    pub out: PathBuf,

    /// Collapse the specifier tier of the diagram.
    #[arg(long)]
    pub no_specifiers: bool,
}
