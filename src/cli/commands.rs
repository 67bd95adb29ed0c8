use crate::{
    cli::args::{
        CatalogArgs, DocumentInputArgs, GraphFormat, LintArgs, OutputFormat, ProgressArgs,
        TimelineArgs, TransitionsArgs, TreeArgs, WorkspaceArgs,
    },
    cli::render::{self, TransitionRow},
    core::{
        ConfigLoader, ConfigValidator, DocflowConfig, FileCatalogSource, FileDocumentSource,
        FileHistorySource, TimelineService,
    },
    core::workflow::{
        dot::transitions_to_dot,
        lint::{CatalogLinter, LintSeverity},
        transitions::TransitionResolver,
        tree::WorkflowTreeBuilder,
    },
    core::sources::{CatalogSource, NoCatalog},
    Result,
};
use anyhow::anyhow;
use docflow_types::{StepId, WorkflowCatalog};
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

/// Workspace directory for a command: `--workspace` or the current directory.
pub fn resolve_workspace(args: &WorkspaceArgs) -> Option<PathBuf> {
    args.workspace.clone().or_else(|| env::current_dir().ok())
}

fn load_config(args: &WorkspaceArgs) -> Result<DocflowConfig> {
    let config = match (&args.config, resolve_workspace(args)) {
        (Some(path), _) => ConfigLoader::load(path)?,
        (None, Some(workspace)) => ConfigLoader::load_from_workspace(&workspace)?,
        (None, None) => DocflowConfig::default(),
    };
    ConfigValidator::validate(&config)?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_catalog(args: &CatalogArgs) -> Result<WorkflowCatalog> {
    let source = FileCatalogSource::open(&args.catalog)?;
    Ok(source.select(args.document_type)?.clone())
}

/// The document named on the command line, or the only one in the file.
fn pick_document(input: &DocumentInputArgs, documents: &FileDocumentSource) -> Result<u64> {
    input
        .document_id
        .or_else(|| documents.only_document_id())
        .ok_or_else(|| {
            anyhow!(
                "{} holds several documents; pass --document-id",
                input.document.display()
            )
        })
}

fn with_service<T>(
    input: &DocumentInputArgs,
    config: &DocflowConfig,
    run: impl FnOnce(&dyn ReportSource, u64) -> Result<T>,
) -> Result<T> {
    let documents = FileDocumentSource::open(&input.document)?;
    let history = FileHistorySource::open(&input.history)?;
    let document_id = pick_document(input, &documents)?;
    match &input.catalog {
        Some(path) => {
            let catalogs = FileCatalogSource::open(path)?;
            let service = TimelineService::new(catalogs, history, documents, config)?;
            run(&service, document_id)
        }
        None => {
            tracing::info!("no catalog file given; assembling from history only");
            let service = TimelineService::new(NoCatalog, history, documents, config)?;
            run(&service, document_id)
        }
    }
}

/// Object-safe view of a [`TimelineService`] so both catalog variants share
/// one code path.
trait ReportSource {
    fn timeline(&self, document_id: u64) -> Result<crate::core::Timeline>;
    fn progress(&self, document_id: u64) -> Result<crate::core::ProgressReport>;
}

impl<C, H, D> ReportSource for TimelineService<C, H, D>
where
    C: CatalogSource,
    H: crate::core::HistorySource,
    D: crate::core::DocumentSource,
{
    fn timeline(&self, document_id: u64) -> Result<crate::core::Timeline> {
        Ok(TimelineService::timeline(self, document_id)?)
    }

    fn progress(&self, document_id: u64) -> Result<crate::core::ProgressReport> {
        Ok(TimelineService::progress(self, document_id)?)
    }
}

pub fn timeline(args: TimelineArgs) -> Result<()> {
    let config = load_config(&args.workspace)?;
    let timeline = with_service(&args.input, &config, |service, id| service.timeline(id))?;
    tracing::info!(
        document_id = timeline.document_id,
        entries = timeline.entries.len(),
        diagnostics = timeline.diagnostics.len(),
        "timeline assembled"
    );
    match args.format {
        OutputFormat::Text => print!("{}", render::timeline_text(&timeline)),
        OutputFormat::Json => print_json(&timeline)?,
    }
    Ok(())
}

pub fn progress(args: ProgressArgs) -> Result<()> {
    let config = load_config(&args.workspace)?;
    let report = with_service(&args.input, &config, |service, id| service.progress(id))?;
    match args.format {
        OutputFormat::Text => print!("{}", render::progress_text(&report)),
        OutputFormat::Json if args.with_timeline => print_json(&report)?,
        OutputFormat::Json => print_json(&report.summary)?,
    }
    Ok(())
}

pub fn tree(args: TreeArgs) -> Result<()> {
    let catalog = open_catalog(&args.catalog)?;
    let tree = WorkflowTreeBuilder::build(&catalog.steps);
    for diagnostic in tree.diagnostics() {
        tracing::warn!(code = diagnostic.code, "{}", diagnostic.message);
    }
    match args.format {
        GraphFormat::Text => print!("{}", tree.render_outline()),
        GraphFormat::Json => print_json(&tree.to_nested())?,
        GraphFormat::Dot => println!("{}", tree.to_dot()),
    }
    Ok(())
}

fn transition_rows(catalog: &WorkflowCatalog, args: &TransitionsArgs) -> Vec<TransitionRow> {
    let names: BTreeMap<StepId, &str> = catalog
        .steps
        .iter()
        .rev()
        .map(|step| (step.id, step.name.as_str()))
        .collect();
    let name_of = |id: StepId| {
        names
            .get(&id)
            .map(|name| name.to_string())
            .unwrap_or_else(|| format!("#{}", id))
    };
    let resolver = TransitionResolver::new(&catalog.transitions);
    let document_type = catalog.document_type_id;

    let mut pairs: Vec<(StepId, StepId)> = Vec::new();
    for rule in &catalog.transitions {
        if rule.document_type_id != document_type {
            continue;
        }
        if args.from.is_some_and(|from| rule.from_step_id.0 != from)
            || args.to.is_some_and(|to| rule.to_step_id.0 != to)
        {
            continue;
        }
        let pair = (rule.from_step_id, rule.to_step_id);
        if !pairs.contains(&pair) {
            pairs.push(pair);
        }
    }

    pairs
        .into_iter()
        .map(|(from, to)| {
            let authorization = resolver.authorized_users(to, from, document_type);
            TransitionRow {
                from_step_id: from,
                from_name: name_of(from),
                to_step_id: to,
                to_name: name_of(to),
                user_allowed: args.user.as_deref().map(|user| authorization.permits(user)),
                authorization,
                reassignment: from == to,
            }
        })
        .collect()
}

pub fn transitions(args: TransitionsArgs) -> Result<()> {
    let catalog = open_catalog(&args.catalog)?;
    match args.format {
        GraphFormat::Dot => println!(
            "{}",
            transitions_to_dot(&catalog.steps, &catalog.transitions, catalog.document_type_id)
        ),
        GraphFormat::Json => print_json(&transition_rows(&catalog, &args))?,
        GraphFormat::Text => print!(
            "{}",
            render::transitions_text(&transition_rows(&catalog, &args), args.user.as_deref())
        ),
    }
    Ok(())
}

pub fn lint(args: LintArgs) -> Result<()> {
    let catalog = open_catalog(&args.catalog)?;
    let results = CatalogLinter::new().run(&catalog);
    match args.format {
        OutputFormat::Text => print!("{}", render::lint_text(&results)),
        OutputFormat::Json => print_json(&results)?,
    }
    let errors = results
        .iter()
        .filter(|result| result.severity == LintSeverity::Error)
        .count();
    if args.strict && errors > 0 {
        return Err(anyhow!(
            "lint failed for {}: {} error-level finding(s)",
            args.catalog.catalog.display(),
            errors
        ));
    }
    Ok(())
}
