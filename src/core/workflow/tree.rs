//! Reconstruction of the step hierarchy from the flat, path-annotated catalog.
//!
//! Each step carries its own ancestor path. A step is attached below the node
//! whose path equals its own path minus the last segment and whose id equals
//! its declared parent. Anything that cannot be attached is promoted to a root;
//! the tree is a browsing aid, not a structural validator.

use crate::core::workflow::diagnostics::{Diagnostic, DiagnosticKind};
use docflow_types::{StepDefinition, StepId, StepKey, StepRole};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

struct NodeData<'a> {
    step: &'a StepDefinition,
    key: StepKey,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Forest of catalog steps keyed by `(id, path)`.
pub struct WorkflowTree<'a> {
    nodes: Vec<NodeData<'a>>,
    index: HashMap<StepKey, usize>,
    by_id: BTreeMap<StepId, Vec<usize>>,
    roots: Vec<usize>,
    diagnostics: Vec<Diagnostic>,
}

/// Serializable nested view of a tree node.
#[derive(Debug, Serialize)]
pub struct TreeNodeView<'a> {
    #[serde(flatten)]
    pub step: &'a StepDefinition,
    pub children: Vec<TreeNodeView<'a>>,
}

pub struct WorkflowTreeBuilder;

impl WorkflowTreeBuilder {
    /// Build the forest. Children keep catalog declaration order.
    pub fn build(steps: &[StepDefinition]) -> WorkflowTree<'_> {
        let mut tree = WorkflowTree {
            nodes: Vec::with_capacity(steps.len()),
            index: HashMap::with_capacity(steps.len()),
            by_id: BTreeMap::new(),
            roots: Vec::new(),
            diagnostics: Vec::new(),
        };

        for step in steps {
            let key = step.key();
            if tree.index.contains_key(&key) {
                tree.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DuplicateStepPosition,
                    format!(
                        "step '{}' is declared more than once at the same position; keeping the first",
                        step.name
                    ),
                    Some(key.to_string()),
                ));
                continue;
            }
            let idx = tree.nodes.len();
            tree.index.insert(key.clone(), idx);
            tree.by_id.entry(step.id).or_default().push(idx);
            tree.nodes.push(NodeData {
                step,
                key,
                parent: None,
                children: Vec::new(),
            });
        }

        for idx in 0..tree.nodes.len() {
            match tree.resolve_parent(idx) {
                Some(parent) => {
                    tree.nodes[idx].parent = Some(parent);
                    tree.nodes[parent].children.push(idx);
                }
                None => {
                    let node = &tree.nodes[idx];
                    if let Some(parent_id) = node.step.parent_id {
                        tracing::debug!(step = %node.key, parent = %parent_id, "promoting orphaned step to root");
                        tree.diagnostics.push(Diagnostic::new(
                            DiagnosticKind::OrphanedTreeNode,
                            format!(
                                "step '{}' declares parent {} but no node matches its path; promoted to root",
                                node.step.name, parent_id
                            ),
                            Some(node.key.to_string()),
                        ));
                    }
                    tree.roots.push(idx);
                }
            }
        }

        tree
    }
}

impl<'a> WorkflowTree<'a> {
    fn resolve_parent(&self, idx: usize) -> Option<usize> {
        let node = &self.nodes[idx];
        let parent_id = node.step.parent_id?;
        let parent_path = node.key.parent_path()?;
        let parent_key = StepKey::new(parent_id, parent_path.to_vec());
        self.index.get(&parent_key).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn roots(&self) -> impl Iterator<Item = &'a StepDefinition> + '_ {
        self.roots.iter().map(|&idx| self.nodes[idx].step)
    }

    pub fn lookup(&self, key: &StepKey) -> Option<&'a StepDefinition> {
        self.index.get(key).map(|&idx| self.nodes[idx].step)
    }

    /// Position of the key among the deduplicated catalog declarations.
    pub fn declaration_index(&self, key: &StepKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn parent_of(&self, key: &StepKey) -> Option<&StepKey> {
        let idx = *self.index.get(key)?;
        self.nodes[idx].parent.map(|parent| &self.nodes[parent].key)
    }

    pub fn children_of(&self, key: &StepKey) -> Vec<&StepKey> {
        self.index
            .get(key)
            .map(|&idx| {
                self.nodes[idx]
                    .children
                    .iter()
                    .map(|&child| &self.nodes[child].key)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every position at which a step id occurs, in declaration order.
    pub fn positions_of(&self, id: StepId) -> Vec<&StepKey> {
        self.by_id
            .get(&id)
            .map(|indices| indices.iter().map(|&idx| &self.nodes[idx].key).collect())
            .unwrap_or_default()
    }

    /// Steps in declaration order with their resolved keys.
    pub fn steps(&self) -> impl Iterator<Item = (&StepKey, &'a StepDefinition)> + '_ {
        self.nodes.iter().map(|node| (&node.key, node.step))
    }

    /// Canonical first stage: the step flagged with the entry role, otherwise the
    /// single parentless step at the shallowest level.
    pub fn entry_step(&self) -> Option<&StepKey> {
        if let Some(node) = self.nodes.iter().find(|node| node.step.role == StepRole::Entry) {
            return Some(&node.key);
        }
        let parentless: Vec<&NodeData<'a>> = self
            .nodes
            .iter()
            .filter(|node| node.step.parent_id.is_none())
            .collect();
        let min_level = parentless.iter().map(|node| node.step.level).min()?;
        let mut at_min = parentless
            .into_iter()
            .filter(|node| node.step.level == min_level);
        match (at_min.next(), at_min.next()) {
            (Some(node), None) => Some(&node.key),
            _ => None,
        }
    }

    /// Depth-first walk yielding `(depth, step)` pairs.
    pub fn depth_first(&self) -> Vec<(usize, &'a StepDefinition)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, usize)> = self.roots.iter().rev().map(|&idx| (0, idx)).collect();
        while let Some((depth, idx)) = stack.pop() {
            let node = &self.nodes[idx];
            out.push((depth, node.step));
            for &child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, node)| node.parent.map(|parent| (parent, idx)))
    }

    pub(crate) fn node_step(&self, idx: usize) -> &'a StepDefinition {
        self.nodes[idx].step
    }

    /// Indented text rendering, two spaces per level.
    pub fn render_outline(&self) -> String {
        let mut out = String::new();
        for (depth, step) in self.depth_first() {
            let _ = writeln!(out, "{}{} (#{})", "  ".repeat(depth), step.name, step.id);
        }
        out
    }

    pub fn to_nested(&self) -> Vec<TreeNodeView<'a>> {
        self.roots.iter().map(|&idx| self.nested(idx)).collect()
    }

    fn nested(&self, idx: usize) -> TreeNodeView<'a> {
        let node = &self.nodes[idx];
        TreeNodeView {
            step: node.step,
            children: node.children.iter().map(|&child| self.nested(child)).collect(),
        }
    }
}
