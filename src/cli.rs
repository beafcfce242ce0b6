use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::commands::parse::{DEFAULT_ITEM_PREFIX, LOOKAHEAD_WINDOW, MIN_HEADER_CHARS};
use crate::taxonomy::ANS_QUESTIONNAIRE_KIND;

#[derive(Parser, Debug)]
#[command(
    name = "pqtool",
    version,
    about = "Protocol Question parsing, classification and re-organization tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Parse(ParseArgs),
    Seed(SeedArgs),
    Classify(ClassifyArgs),
    Migrate(MigrateArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum AssemblerMode {
    Sequential,
    LookAhead,
}

impl AssemblerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::LookAhead => "look-ahead",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    #[arg(long, default_value = ".cache/pq")]
    pub cache_root: PathBuf,

    /// Plain-text document produced from the PQ PDF.
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub parse_manifest_path: Option<PathBuf>,

    /// Previously accepted question set to report drift against.
    #[arg(long)]
    pub compare_with: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_ITEM_PREFIX)]
    pub item_prefix: String,

    #[arg(long, default_value_t = MIN_HEADER_CHARS)]
    pub min_header_chars: usize,

    #[arg(long, value_enum, default_value_t = AssemblerMode::Sequential)]
    pub assembler: AssemblerMode,

    #[arg(long, default_value_t = LOOKAHEAD_WINDOW)]
    pub lookahead_window: usize,
}

#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    #[arg(long, default_value = ".cache/pq")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Accepted question set written by `parse`.
    #[arg(long)]
    pub questions: Option<PathBuf>,

    #[arg(long, default_value = ANS_QUESTIONNAIRE_KIND)]
    pub questionnaire_kind: String,
}

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    #[arg(long, default_value = ".cache/pq")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Classify this artifact instead of the persisted question set.
    #[arg(long)]
    pub questions: Option<PathBuf>,

    /// External rule file replacing the built-in rule set.
    #[arg(long)]
    pub rules: Option<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long, default_value = ANS_QUESTIONNAIRE_KIND)]
    pub questionnaire_kind: String,
}

#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    #[arg(long, default_value = ".cache/pq")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Use this artifact as the question source instead of the persisted set.
    #[arg(long)]
    pub questions: Option<PathBuf>,

    #[arg(long)]
    pub rules: Option<PathBuf>,

    #[arg(long)]
    pub migration_manifest_path: Option<PathBuf>,

    #[arg(long, default_value = ANS_QUESTIONNAIRE_KIND)]
    pub questionnaire_kind: String,

    /// File unclassified questions under this category instead of leaving them out.
    #[arg(long)]
    pub fallback_category: Option<String>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/pq")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value = ANS_QUESTIONNAIRE_KIND)]
    pub questionnaire_kind: String,
}
