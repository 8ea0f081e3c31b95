//! Canonical ordering of protocol elements
//!
//! Parameters sort key-first, then by scope (in < nil < out), then by
//! name. Actions sort by their canonical string, roles alphabetically.

use crate::protocol::{Action, Parameter, Protocol, Role};
use std::cmp::Ordering;

/// Total order on parameters used for canonical forms
pub fn compare_parameters(a: &Parameter, b: &Parameter) -> Ordering {
    b.key
        .cmp(&a.key)
        .then_with(|| a.scope.rank().cmp(&b.scope.rank()))
        .then_with(|| a.name.cmp(&b.name))
}

pub fn sort_parameters(params: &mut [Parameter]) {
    params.sort_by(compare_parameters);
}

pub fn sort_actions(actions: &mut [Action]) {
    actions.sort_by_cached_key(|a| a.to_string());
}

pub fn sort_roles(roles: &mut [Role]) {
    roles.sort();
}

impl Protocol {
    /// Bring roles, parameters and actions into canonical order in place
    ///
    /// Each action's parameters are sorted before the actions themselves,
    /// since an action's canonical string includes its parameter list.
    pub fn canonicalize(&mut self) {
        sort_roles(&mut self.roles);
        sort_parameters(&mut self.params);
        for action in &mut self.actions {
            sort_parameters(&mut action.params);
        }
        sort_actions(&mut self.actions);
    }

    /// A canonically ordered copy
    pub fn canonical(&self) -> Protocol {
        let mut protocol = self.clone();
        protocol.canonicalize();
        protocol
    }
}

/// Compare two protocols irrespective of declaration order
pub fn equivalent(a: &Protocol, b: &Protocol) -> bool {
    a.canonical() == b.canonical()
}
