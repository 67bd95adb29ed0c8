use clap::Args;
use std::path::PathBuf;

/// Where docflow.toml and the .docflow/ state directory live.
#[derive(Args, Clone, Debug, Default)]
pub struct WorkspaceArgs {
    /// Directory holding docflow.toml and .docflow/ (default: current directory)
    #[arg(long, value_name = "PATH")]
    pub workspace: Option<PathBuf>,

    /// Explicit configuration file, replacing <workspace>/docflow.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// The three collaborator inputs of a timeline computation.
#[derive(Args, Clone, Debug)]
pub struct DocumentInputArgs {
    /// Workflow catalog file, one catalog or a list (JSON or YAML); omit to assemble from history only
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Execution history file, a list of records or an object keyed by document id
    #[arg(long, value_name = "FILE")]
    pub history: PathBuf,

    /// Document snapshot file, one document or a list
    #[arg(long, value_name = "FILE")]
    pub document: PathBuf,

    /// Document to report on (required when the document file holds several)
    #[arg(long, value_name = "ID")]
    pub document_id: Option<u64>,
}

/// Selects one catalog out of a catalog file.
#[derive(Args, Clone, Debug)]
pub struct CatalogArgs {
    /// Workflow catalog file (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub catalog: PathBuf,

    /// Document type whose catalog to use (required when the file holds several)
    #[arg(long, value_name = "ID")]
    pub document_type: Option<u64>,
}

#[derive(Args)]
pub struct TimelineArgs {
    #[command(flatten)]
    pub input: DocumentInputArgs,

    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Emit either terminal-friendly text or machine-readable JSON
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct ProgressArgs {
    #[command(flatten)]
    pub input: DocumentInputArgs,

    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Emit either terminal-friendly text or machine-readable JSON
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Include the full timeline in JSON output
    #[arg(long)]
    pub with_timeline: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Indented outline, nested JSON or a Graphviz digraph
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: GraphFormat,
}

#[derive(Args)]
pub struct TransitionsArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Only list transitions leaving this step
    #[arg(long, value_name = "STEP")]
    pub from: Option<u64>,

    /// Only list transitions entering this step
    #[arg(long, value_name = "STEP")]
    pub to: Option<u64>,

    /// Report whether this user may take each listed transition
    #[arg(long, value_name = "USER")]
    pub user: Option<String>,

    /// Text table, JSON or a Graphviz digraph of the rules
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: GraphFormat,
}

#[derive(Args)]
pub struct LintArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Emit either terminal-friendly text or machine-readable JSON
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Exit with a failure status when any error-level finding is reported
    #[arg(long)]
    pub strict: bool,
}

#[derive(Clone, Copy, clap::ValueEnum, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON payload suitable for downstream tooling
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum, Debug, PartialEq, Eq)]
pub enum GraphFormat {
    /// Human-readable listing
    Text,
    /// JSON payload suitable for downstream tooling
    Json,
    /// Graphviz DOT source
    Dot,
}
