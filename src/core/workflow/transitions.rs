use docflow_types::{Authorization, DocumentTypeId, StepId, TransitionRule};
use std::collections::BTreeSet;

/// Answers "where can this document go next, and who may move it there".
///
/// Rules never inherit across document types; both the type and the source step
/// must match exactly.
pub struct TransitionResolver<'a> {
    rules: &'a [TransitionRule],
    allow_entry_reassignment: bool,
}

impl<'a> TransitionResolver<'a> {
    pub fn new(rules: &'a [TransitionRule]) -> Self {
        Self {
            rules,
            allow_entry_reassignment: false,
        }
    }

    pub fn with_entry_reassignment(mut self, allowed: bool) -> Self {
        self.allow_entry_reassignment = allowed;
        self
    }

    /// Rules leaving `from` for the given document type, in declaration order.
    pub fn valid_transitions(
        &self,
        document_type_id: DocumentTypeId,
        from: StepId,
    ) -> Vec<&'a TransitionRule> {
        self.rules
            .iter()
            .filter(|rule| rule.document_type_id == document_type_id && rule.from_step_id == from)
            .collect()
    }

    /// Distinct destinations reachable from `from`, excluding reassignments.
    pub fn next_step_ids(&self, document_type_id: DocumentTypeId, from: StepId) -> Vec<StepId> {
        let mut seen = BTreeSet::new();
        self.valid_transitions(document_type_id, from)
            .into_iter()
            .filter(|rule| !rule.is_self_transition())
            .map(|rule| rule.to_step_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Union of users allowed across every rule from `from` into `to`.
    ///
    /// A matching rule with an empty user list opens the transition to anyone;
    /// no matching rule at all means the transition is invalid.
    pub fn authorized_users(
        &self,
        to: StepId,
        from: StepId,
        document_type_id: DocumentTypeId,
    ) -> Authorization {
        let mut matched = false;
        let mut users = BTreeSet::new();
        for rule in self.valid_transitions(document_type_id, from) {
            if rule.to_step_id != to {
                continue;
            }
            if rule.authorized_users.is_empty() {
                return Authorization::Unrestricted;
            }
            matched = true;
            users.extend(rule.authorized_users.iter().cloned());
        }
        if matched {
            Authorization::Restricted(users)
        } else {
            Authorization::NoRule
        }
    }

    pub fn is_user_authorized(
        &self,
        user: &str,
        to: StepId,
        from: StepId,
        document_type_id: DocumentTypeId,
    ) -> bool {
        self.authorized_users(to, from, document_type_id).permits(user)
    }

    /// Whether the document may be reassigned to another user without moving.
    /// Reassigning away from the entry step is refused unless configured.
    pub fn can_reassign(
        &self,
        document_type_id: DocumentTypeId,
        step: StepId,
        entry_step: Option<StepId>,
    ) -> bool {
        if entry_step == Some(step) && !self.allow_entry_reassignment {
            return false;
        }
        self.authorized_users(step, step, document_type_id).is_valid()
    }
}
