use super::{CatalogLintRule, LintResult, LintSeverity};
use crate::core::workflow::dot::transition_graph;
use crate::core::workflow::tree::WorkflowTree;
use docflow_types::{StepId, WorkflowCatalog};
use petgraph::visit::Bfs;
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub fn built_in_rules() -> Vec<Box<dyn CatalogLintRule>> {
    vec![
        Box::new(DuplicateStepPositionRule),
        Box::new(UnknownTransitionStepRule),
        Box::new(OrphanedStepRule),
        Box::new(PathParentMismatchRule),
        Box::new(MissingEntryStepRule),
        Box::new(UnreachableStepRule),
        Box::new(ForeignTransitionRule),
        Box::new(TerminalStepWithExitsRule),
        Box::new(AmbiguousStepNameRule),
    ]
}

struct DuplicateStepPositionRule;

impl CatalogLintRule for DuplicateStepPositionRule {
    fn validate(&self, catalog: &WorkflowCatalog, _tree: &WorkflowTree<'_>) -> Vec<LintResult> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for step in &catalog.steps {
            *counts.entry(step.key().to_string()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(key, count)| {
                LintResult::new(
                    "DOC-LINT-001",
                    LintSeverity::Error,
                    format!("step position {} is declared {} times", key, count),
                    Some(key),
                    Some("remove the repeated declaration; only the first is used".to_string()),
                )
            })
            .collect()
    }
}

struct UnknownTransitionStepRule;

impl CatalogLintRule for UnknownTransitionStepRule {
    fn validate(&self, catalog: &WorkflowCatalog, _tree: &WorkflowTree<'_>) -> Vec<LintResult> {
        let known: HashSet<StepId> = catalog.steps.iter().map(|step| step.id).collect();
        let mut out = Vec::new();
        for rule in &catalog.transitions {
            for (side, id) in [("source", rule.from_step_id), ("target", rule.to_step_id)] {
                if !known.contains(&id) {
                    out.push(LintResult::new(
                        "DOC-LINT-002",
                        LintSeverity::Error,
                        format!(
                            "transition {} -> {} references unknown {} step {}",
                            rule.from_step_id, rule.to_step_id, side, id
                        ),
                        Some(format!("{}->{}", rule.from_step_id, rule.to_step_id)),
                        Some("point transitions at steps declared in the catalog".to_string()),
                    ));
                }
            }
        }
        out
    }
}

struct OrphanedStepRule;

impl CatalogLintRule for OrphanedStepRule {
    fn validate(&self, _catalog: &WorkflowCatalog, tree: &WorkflowTree<'_>) -> Vec<LintResult> {
        tree.steps()
            .filter(|(key, step)| step.parent_id.is_some() && tree.parent_of(key).is_none())
            .map(|(key, step)| {
                LintResult::new(
                    "DOC-LINT-003",
                    LintSeverity::Warning,
                    format!(
                        "step '{}' has no parent matching both its parentId and path",
                        step.name
                    ),
                    Some(key.to_string()),
                    Some("fix parentId or path so the step attaches to its parent".to_string()),
                )
            })
            .collect()
    }
}

struct PathParentMismatchRule;

impl CatalogLintRule for PathParentMismatchRule {
    fn validate(&self, catalog: &WorkflowCatalog, _tree: &WorkflowTree<'_>) -> Vec<LintResult> {
        let mut out = Vec::new();
        for step in &catalog.steps {
            let key = step.key();
            let problem = if step.path.last() != Some(&step.id) {
                Some("path does not end with the step itself".to_string())
            } else {
                let declared_parent = key.parent_path().and_then(|parent| parent.last().copied());
                if declared_parent != step.parent_id {
                    Some(format!(
                        "parentId {} disagrees with path parent {}",
                        display_opt(step.parent_id),
                        display_opt(declared_parent)
                    ))
                } else {
                    None
                }
            };
            if let Some(problem) = problem {
                out.push(LintResult::new(
                    "DOC-LINT-004",
                    LintSeverity::Warning,
                    format!("step '{}': {}", step.name, problem),
                    Some(key.to_string()),
                    None,
                ));
            }
        }
        out
    }
}

fn display_opt(id: Option<StepId>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "none".to_string())
}

struct MissingEntryStepRule;

impl CatalogLintRule for MissingEntryStepRule {
    fn validate(&self, catalog: &WorkflowCatalog, tree: &WorkflowTree<'_>) -> Vec<LintResult> {
        if catalog.steps.is_empty() || tree.entry_step().is_some() {
            return Vec::new();
        }
        vec![LintResult::new(
            "DOC-LINT-005",
            LintSeverity::Warning,
            "catalog has no identifiable entry step; entry synthesis is disabled",
            None,
            Some("flag one step with role 'entry'".to_string()),
        )]
    }
}

struct UnreachableStepRule;

impl CatalogLintRule for UnreachableStepRule {
    fn validate(&self, catalog: &WorkflowCatalog, tree: &WorkflowTree<'_>) -> Vec<LintResult> {
        let Some(entry) = tree.entry_step() else {
            return Vec::new();
        };
        let (graph, node_map) =
            transition_graph(&catalog.steps, &catalog.transitions, catalog.document_type_id);
        let Some(&start) = node_map.get(&entry.id) else {
            return Vec::new();
        };

        let mut reachable = HashSet::new();
        let mut bfs = Bfs::new(&graph, start);
        while let Some(nx) = bfs.next(&graph) {
            reachable.insert(nx);
        }

        node_map
            .iter()
            .filter(|(_, nx)| !reachable.contains(*nx))
            .map(|(id, _)| {
                LintResult::new(
                    "DOC-LINT-006",
                    LintSeverity::Warning,
                    format!("step {} is unreachable from the entry step", id),
                    Some(id.to_string()),
                    Some("add a transition into the step or remove it".to_string()),
                )
            })
            .collect()
    }
}

struct ForeignTransitionRule;

impl CatalogLintRule for ForeignTransitionRule {
    fn validate(&self, catalog: &WorkflowCatalog, _tree: &WorkflowTree<'_>) -> Vec<LintResult> {
        let foreign: BTreeSet<u64> = catalog
            .transitions
            .iter()
            .map(|rule| rule.document_type_id)
            .filter(|id| *id != catalog.document_type_id)
            .collect();
        foreign
            .into_iter()
            .map(|id| {
                LintResult::new(
                    "DOC-LINT-007",
                    LintSeverity::Info,
                    format!(
                        "catalog for document type {} carries transitions for type {}; they are never used",
                        catalog.document_type_id, id
                    ),
                    Some(format!("type:{}", id)),
                    None,
                )
            })
            .collect()
    }
}

struct TerminalStepWithExitsRule;

impl CatalogLintRule for TerminalStepWithExitsRule {
    fn validate(&self, catalog: &WorkflowCatalog, _tree: &WorkflowTree<'_>) -> Vec<LintResult> {
        let terminal: BTreeMap<StepId, &str> = catalog
            .steps
            .iter()
            .filter(|step| step.role.is_terminal())
            .map(|step| (step.id, step.name.as_str()))
            .collect();
        let exits: BTreeSet<StepId> = catalog
            .transitions
            .iter()
            .filter(|rule| rule.document_type_id == catalog.document_type_id)
            .filter(|rule| !rule.is_self_transition())
            .map(|rule| rule.from_step_id)
            .filter(|id| terminal.contains_key(id))
            .collect();
        exits
            .into_iter()
            .map(|id| {
                LintResult::new(
                    "DOC-LINT-008",
                    LintSeverity::Info,
                    format!(
                        "terminal step '{}' has outgoing transitions; documents there never finish",
                        terminal.get(&id).copied().unwrap_or_default()
                    ),
                    Some(id.to_string()),
                    None,
                )
            })
            .collect()
    }
}

struct AmbiguousStepNameRule;

impl CatalogLintRule for AmbiguousStepNameRule {
    fn validate(&self, catalog: &WorkflowCatalog, _tree: &WorkflowTree<'_>) -> Vec<LintResult> {
        let mut by_name: BTreeMap<String, BTreeSet<StepId>> = BTreeMap::new();
        for step in &catalog.steps {
            by_name
                .entry(step.name.trim().to_lowercase())
                .or_default()
                .insert(step.id);
        }
        by_name
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(name, ids)| {
                let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                LintResult::new(
                    "DOC-LINT-009",
                    LintSeverity::Info,
                    format!(
                        "name '{}' is shared by steps {}; name-only history references resolve to the first",
                        name,
                        ids.join(", ")
                    ),
                    Some(name),
                    None,
                )
            })
            .collect()
    }
}
