//! CLI command definitions and argument parsing.

use clap::{ArgGroup, Parser, Subcommand};
use rumor_domain::Severity;

/// Rumor CLI - Create, spread and decay rumors between entities.
#[derive(Debug, Parser)]
#[command(name = "rumor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RUMOR_CONFIG")]
    pub config: Option<String>,

    /// Database file path (overrides the configuration)
    #[arg(short, long, global = true, env = "RUMOR_DB")]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new rumor
    Create(CreateArgs),

    /// Create rumors in bulk from a JSON array
    Import(ImportArgs),

    /// Show a rumor with its variants and beliefs
    Show(ShowArgs),

    /// List rumors
    List(ListArgs),

    /// Spread a rumor or variant from one entity to another
    Spread(SpreadArgs),

    /// Manually set or adjust an entity's belief
    Believe(BelieveArgs),

    /// Run one decay pass
    Decay(DecayArgs),

    /// Delete rumors with their variants and beliefs
    Delete(DeleteArgs),

    /// Rumors an entity knows
    Known(KnownArgs),

    /// Ancestors and descendants of a rumor or variant
    Lineage(LineageArgs),

    /// Aggregate statistics
    Stats,

    /// Run the decay worker in the foreground
    Worker(WorkerArgs),
}

/// Arguments for the create command.
#[derive(Debug, Parser)]
pub struct CreateArgs {
    /// Entity the rumor starts with
    pub originator: String,

    /// Rumor text
    pub content: String,

    /// Category (repeatable)
    #[arg(short = 'C', long = "category")]
    pub categories: Vec<String>,

    /// Severity
    #[arg(short, long, value_enum, default_value = "moderate")]
    pub severity: SeverityArg,

    /// Objective truth value (0.0-1.0)
    #[arg(short, long, default_value = "0.5")]
    pub truth: f64,

    /// Entity that hears the rumor at creation (repeatable)
    #[arg(short, long = "initial")]
    pub initial: Vec<String>,
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// JSON file containing rumors to create
    #[arg(short = 'i', long)]
    pub file: Option<String>,

    /// JSON array of rumors from stdin
    #[arg(long)]
    pub stdin: bool,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Rumor ID
    pub id: String,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Filter by category (repeatable, matches any)
    #[arg(short = 'C', long = "category")]
    pub categories: Vec<String>,

    /// Minimum truth value
    #[arg(long)]
    pub min_truth: Option<f64>,

    /// Maximum truth value
    #[arg(long)]
    pub max_truth: Option<f64>,

    /// Exact severity
    #[arg(short, long, value_enum)]
    pub severity: Option<SeverityArg>,

    /// Minimum severity
    #[arg(long, value_enum)]
    pub min_severity: Option<SeverityArg>,

    /// Case-insensitive text search
    #[arg(long)]
    pub search: Option<String>,

    /// Only rumors this entity knows
    #[arg(long)]
    pub known_by: Option<String>,

    /// Maximum number of results
    #[arg(short, long, default_value = "50")]
    pub limit: usize,

    /// Number of results to skip
    #[arg(short, long, default_value = "0")]
    pub offset: usize,
}

/// Arguments for the spread command.
#[derive(Debug, Parser)]
pub struct SpreadArgs {
    /// Rumor or variant ID
    pub subject: String,

    /// Entity telling the rumor
    pub from: String,

    /// Entity hearing the rumor
    pub to: String,

    /// Create a mutated variant
    #[arg(short, long)]
    pub mutate: bool,

    /// Mutation strength (0.0-1.0)
    #[arg(short, long, default_value = "0.3")]
    pub strength: f64,

    /// Relationship factor from distrust (-1.0) to trust (1.0)
    #[arg(short, long, default_value = "0.0", allow_hyphen_values = true)]
    pub relationship: f64,
}

/// Arguments for the believe command.
#[derive(Debug, Parser)]
#[command(group(ArgGroup::new("change").required(true).args(["delta", "set"])))]
pub struct BelieveArgs {
    /// Rumor or variant ID
    pub subject: String,

    /// Entity whose belief changes
    pub entity: String,

    /// Add to the current believability (clamped to 0.0-1.0)
    #[arg(short = 'D', long, allow_hyphen_values = true)]
    pub delta: Option<f64>,

    /// Replace the believability
    #[arg(long)]
    pub set: Option<f64>,
}

/// Arguments for the decay command.
#[derive(Debug, Parser)]
pub struct DecayArgs {
    /// Decay up to this Unix timestamp instead of now
    #[arg(long)]
    pub as_of: Option<u64>,
}

/// Arguments for the delete command.
#[derive(Debug, Parser)]
pub struct DeleteArgs {
    /// Rumor IDs to delete
    pub ids: Vec<String>,

    /// Read IDs from file (one per line)
    #[arg(short = 'i', long)]
    pub file: Option<String>,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Arguments for the known command.
#[derive(Debug, Parser)]
pub struct KnownArgs {
    /// Entity ID
    pub entity: String,

    /// Filter by category (repeatable, matches any)
    #[arg(short = 'C', long = "category")]
    pub categories: Vec<String>,

    /// Minimum believability
    #[arg(short, long, default_value = "0.0")]
    pub min_believability: f64,

    /// Maximum number of results
    #[arg(short, long, default_value = "50")]
    pub limit: usize,
}

/// Arguments for the lineage command.
#[derive(Debug, Parser)]
pub struct LineageArgs {
    /// Rumor or variant ID
    pub subject: String,
}

/// Arguments for the worker command.
#[derive(Debug, Parser)]
pub struct WorkerArgs {
    /// Stop after this many passes instead of waiting for Ctrl+C
    #[arg(long)]
    pub cycles: Option<usize>,

    /// Minutes between passes (overrides the configuration)
    #[arg(short, long)]
    pub interval_minutes: Option<u64>,
}

/// Severity argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SeverityArg {
    /// Idle chatter
    Trivial,
    /// Minor news
    Minor,
    /// Noteworthy news
    Moderate,
    /// Serious news
    Major,
    /// World-shaking news
    Critical,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<SeverityArg> for Severity {
    fn from(severity: SeverityArg) -> Self {
        match severity {
            SeverityArg::Trivial => Severity::Trivial,
            SeverityArg::Minor => Severity::Minor,
            SeverityArg::Moderate => Severity::Moderate,
            SeverityArg::Major => Severity::Major,
            SeverityArg::Critical => Severity::Critical,
        }
    }
}
