use crate::core::workflow::tree::WorkflowTree;
use docflow_types::{StepDefinition, StepId, TransitionRule};
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeMap;
use std::fmt;

/// Node weight carrying step display information.
struct StepNode {
    id: StepId,
    name: String,
}

impl fmt::Display for StepNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\\n#{}", self.name, self.id)
    }
}

/// Edge weight; empty for hierarchy edges.
struct EdgeData {
    label: String,
}

impl fmt::Display for EdgeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

impl WorkflowTree<'_> {
    /// Render the parent/child hierarchy as a Graphviz DOT string.
    pub fn to_dot(&self) -> String {
        let mut graph: DiGraph<StepNode, EdgeData> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..self.len())
            .map(|idx| graph.add_node(step_node(self.node_step(idx))))
            .collect();
        for (parent, child) in self.edges() {
            graph.add_edge(
                nodes[parent],
                nodes[child],
                EdgeData {
                    label: String::new(),
                },
            );
        }
        format!("{}", Dot::new(&graph))
    }
}

/// Build the step-to-step transition graph for one document type. Each step
/// id becomes one node, whatever the number of positions it has in the tree.
pub(crate) fn transition_graph(
    steps: &[StepDefinition],
    rules: &[TransitionRule],
    document_type_id: u64,
) -> (DiGraph<StepId, usize>, BTreeMap<StepId, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut node_map: BTreeMap<StepId, NodeIndex> = BTreeMap::new();
    for step in steps {
        node_map
            .entry(step.id)
            .or_insert_with(|| graph.add_node(step.id));
    }
    for (position, rule) in rules.iter().enumerate() {
        if rule.document_type_id != document_type_id {
            continue;
        }
        if let (Some(&from), Some(&to)) = (node_map.get(&rule.from_step_id), node_map.get(&rule.to_step_id)) {
            graph.add_edge(from, to, position);
        }
    }
    (graph, node_map)
}

/// Render the transition rules of one document type as DOT, labelling each
/// edge with its authorized users.
pub fn transitions_to_dot(steps: &[StepDefinition], rules: &[TransitionRule], document_type_id: u64) -> String {
    let mut graph: DiGraph<StepNode, EdgeData> = DiGraph::new();
    let mut node_map: BTreeMap<StepId, NodeIndex> = BTreeMap::new();
    for step in steps {
        node_map
            .entry(step.id)
            .or_insert_with(|| graph.add_node(step_node(step)));
    }
    for rule in rules.iter().filter(|rule| rule.document_type_id == document_type_id) {
        if let (Some(&from), Some(&to)) = (node_map.get(&rule.from_step_id), node_map.get(&rule.to_step_id)) {
            let label = if rule.authorized_users.is_empty() {
                "*".to_string()
            } else {
                truncate(&rule.authorized_users.join(","), 60)
            };
            graph.add_edge(from, to, EdgeData { label });
        }
    }
    format!("{}", Dot::new(&graph))
}

fn step_node(step: &StepDefinition) -> StepNode {
    StepNode {
        id: step.id,
        name: truncate(&step.name, 80),
    }
}

fn truncate(value: &str, limit: usize) -> String {
    match value.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}
