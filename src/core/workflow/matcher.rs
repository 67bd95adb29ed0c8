//! Resolution of historical step references against the canonical catalog.
//!
//! History was written under different reference conventions over time, so a
//! reference is tried as an id first, then as an exact name, then as a
//! case-insensitive name. The first tier that matches anything wins.

use crate::core::workflow::tree::WorkflowTree;
use docflow_types::{StepKey, StepReference};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStrategy {
    Id,
    ExactName,
    CaseInsensitiveName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepMatch<'t> {
    /// Every catalog position of the matched step, in declaration order.
    Resolved {
        strategy: MatchStrategy,
        candidates: Vec<&'t StepKey>,
    },
    Unresolved,
}

impl<'t> StepMatch<'t> {
    pub fn first(&self) -> Option<&'t StepKey> {
        match self {
            StepMatch::Resolved { candidates, .. } => candidates.first().copied(),
            StepMatch::Unresolved => None,
        }
    }
}

pub struct StepMatcher<'t, 'a> {
    tree: &'t WorkflowTree<'a>,
}

impl<'t, 'a> StepMatcher<'t, 'a> {
    pub fn new(tree: &'t WorkflowTree<'a>) -> Self {
        Self { tree }
    }

    pub fn resolve(&self, reference: &StepReference) -> StepMatch<'t> {
        if let Some(id) = reference.as_id() {
            let candidates = self.tree.positions_of(id);
            if !candidates.is_empty() {
                return StepMatch::Resolved {
                    strategy: MatchStrategy::Id,
                    candidates,
                };
            }
        }

        let StepReference::Text(text) = reference else {
            return StepMatch::Unresolved;
        };

        let exact = self.by_name(|name| name == text);
        if !exact.is_empty() {
            return StepMatch::Resolved {
                strategy: MatchStrategy::ExactName,
                candidates: exact,
            };
        }

        let wanted = text.trim().to_lowercase();
        if wanted.is_empty() {
            return StepMatch::Unresolved;
        }
        let folded = self.by_name(|name| name.trim().to_lowercase() == wanted);
        if !folded.is_empty() {
            return StepMatch::Resolved {
                strategy: MatchStrategy::CaseInsensitiveName,
                candidates: folded,
            };
        }

        StepMatch::Unresolved
    }

    fn by_name(&self, predicate: impl Fn(&str) -> bool) -> Vec<&'t StepKey> {
        self.tree
            .steps()
            .filter(|(_, step)| predicate(&step.name))
            .map(|(key, _)| key)
            .collect()
    }
}
