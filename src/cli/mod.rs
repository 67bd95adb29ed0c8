pub mod args;
pub mod commands;
pub mod render;

pub use args::{
    CatalogArgs, DocumentInputArgs, GraphFormat, LintArgs, OutputFormat, ProgressArgs,
    TimelineArgs, TransitionsArgs, TreeArgs, WorkspaceArgs,
};
use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
WORKFLOW COMMANDS:\n{subcommands}\n";

#[derive(Parser)]
#[command(name = "docflow")]
#[command(version = crate::VERSION)]
#[command(about = "Reconstruct document workflow history from catalogs and execution records")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Typical flow: lint a catalog, inspect its tree and transitions, then render timelines and progress for documents."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(
        about = "Render the ordered step timeline of a document",
        long_about = "Timeline merges the workflow catalog, execution history and document snapshot into completed, current and pending entries, with diagnostics for every inconsistency found.",
        after_help = "Example:\n    docflow timeline --catalog catalog.yaml --history history.json --document doc.json"
    )]
    Timeline(TimelineArgs),
    #[command(
        about = "Summarize how far a document has advanced",
        long_about = "Progress counts completed, current and pending steps of a document's timeline and reports whether it reached a terminal step.",
        after_help = "Example:\n    docflow progress --catalog catalog.yaml --history history.json --document doc.json --format json"
    )]
    Progress(ProgressArgs),
    #[command(
        about = "Show the step hierarchy of a catalog",
        long_about = "Tree builds the parent/child hierarchy of a catalog's steps and prints it as an outline, nested JSON or Graphviz DOT.",
        after_help = "Example:\n    docflow tree --catalog catalog.yaml --format dot"
    )]
    Tree(TreeArgs),
    #[command(
        about = "List transition rules and who may take them",
        long_about = "Transitions lists each (from, to) pair of a catalog with its merged authorization, optionally filtered by step and checked for a user.",
        after_help = "Example:\n    docflow transitions --catalog catalog.yaml --from 20 --user ana"
    )]
    Transitions(TransitionsArgs),
    #[command(
        about = "Check a catalog for structural problems",
        long_about = "Lint reports duplicate positions, dangling transitions, orphaned or unreachable steps and other catalog defects.",
        after_help = "Example:\n    docflow lint --catalog catalog.yaml --strict"
    )]
    Lint(LintArgs),
}

impl Command {
    /// Workspace flags shared by every subcommand.
    pub fn workspace_args(&self) -> &WorkspaceArgs {
        match self {
            Command::Timeline(args) => &args.workspace,
            Command::Progress(args) => &args.workspace,
            Command::Tree(args) => &args.workspace,
            Command::Transitions(args) => &args.workspace,
            Command::Lint(args) => &args.workspace,
        }
    }
}

pub fn run(args: Args) -> crate::Result<()> {
    match args.command {
        Command::Timeline(timeline_args) => commands::timeline(timeline_args),
        Command::Progress(progress_args) => commands::progress(progress_args),
        Command::Tree(tree_args) => commands::tree(tree_args),
        Command::Transitions(transitions_args) => commands::transitions(transitions_args),
        Command::Lint(lint_args) => commands::lint(lint_args),
    }
}
