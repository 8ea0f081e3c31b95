//! Validator: semantic checks over a structurally valid protocol
//!
//! Runs after parsing. Catches protocols that are syntactically valid
//! but cannot be enacted: actions between undeclared roles, actions
//! that cannot be tied to an instance key, and actions whose inputs
//! depend on each other's outputs in a cycle.

use crate::errors::{ValidationError, ValidationResult};
use crate::protocol::{Action, Parameter, Parameterized, Protocol, Role};
use std::collections::HashSet;

/// Validate a protocol for semantic correctness
pub fn validate(protocol: &Protocol) -> ValidationResult<()> {
    let result = validate_has_keys(protocol)
        .and_then(|_| validate_roles(protocol))
        .and_then(|_| validate_key_coverage(protocol))
        .and_then(|_| validate_acyclic(protocol));

    if let Err(err) = &result {
        tracing::warn!(protocol = %protocol.name, error = %err, "Protocol failed validation");
    }
    result
}

/// At least one protocol parameter must be a key
pub fn validate_has_keys(protocol: &Protocol) -> ValidationResult<()> {
    if protocol.params.iter().any(Parameter::is_key) {
        Ok(())
    } else {
        Err(ValidationError::NoKeyParameters(protocol.name.clone()))
    }
}

fn validate_roles(protocol: &Protocol) -> ValidationResult<()> {
    for action in &protocol.actions {
        for role in [&action.from, &action.to] {
            if !protocol.has_role(role) {
                return Err(unknown_role(action, role));
            }
        }
    }
    Ok(())
}

fn unknown_role(action: &Action, role: &Role) -> ValidationError {
    ValidationError::UnknownRole {
        action: action.name.clone(),
        role: role.to_string(),
    }
}

fn validate_key_coverage(protocol: &Protocol) -> ValidationResult<()> {
    let key_names: HashSet<&str> = protocol.keys().iter().map(|p| p.name.as_str()).collect();

    for action in &protocol.actions {
        if !action.params.iter().any(|p| key_names.contains(p.name.as_str())) {
            return Err(ValidationError::NoKeyOverlap {
                action: action.name.clone(),
                protocol: protocol.name.clone(),
            });
        }
    }
    Ok(())
}

fn validate_acyclic(protocol: &Protocol) -> ValidationResult<()> {
    let graph = DependencyGraph::build(&protocol.actions);
    match graph.find_cycle() {
        Some(index) => Err(ValidationError::CircularDependency(
            protocol.actions[index].name.clone(),
        )),
        None => Ok(()),
    }
}

// ── Dependency graph ─────────────────────────────────────────────────

/// Data dependencies between the actions of a protocol
///
/// Nodes are indices into the action list. Action `a` depends on
/// action `b` when one of `a`'s `in` parameter names is among `b`'s
/// `out` parameter names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyGraph {
    depends_on: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn build(actions: &[Action]) -> Self {
        let mut depends_on = vec![Vec::new(); actions.len()];

        for (a, action) in actions.iter().enumerate() {
            let ins: HashSet<&str> = action.ins().iter().map(|p| p.name.as_str()).collect();
            for (b, other) in actions.iter().enumerate() {
                if a == b {
                    continue;
                }
                if other.outs().iter().any(|p| ins.contains(p.name.as_str())) {
                    depends_on[a].push(b);
                }
            }
        }

        Self { depends_on }
    }

    /// Build directly from adjacency lists
    pub fn from_edges(depends_on: Vec<Vec<usize>>) -> Self {
        Self { depends_on }
    }

    pub fn len(&self) -> usize {
        self.depends_on.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depends_on.is_empty()
    }

    pub fn depends_on(&self, node: usize) -> &[usize] {
        self.depends_on.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find a node lying on a dependency cycle
    ///
    /// One visited set is shared by every traversal of the pass: a root
    /// already reached from an earlier root is not explored again, and
    /// a visited node met off the current path is not descended into.
    /// A node met while still on the current path closes a cycle and is
    /// the one reported.
    pub fn find_cycle(&self) -> Option<usize> {
        let mut visited = vec![false; self.len()];
        let mut on_path = vec![false; self.len()];

        for root in 0..self.len() {
            if visited[root] {
                continue;
            }
            if let Some(node) = self.visit(root, &mut visited, &mut on_path) {
                return Some(node);
            }
        }
        None
    }

    fn visit(&self, node: usize, visited: &mut [bool], on_path: &mut [bool]) -> Option<usize> {
        visited[node] = true;
        on_path[node] = true;

        for &next in self.depends_on(node) {
            if on_path[next] {
                return Some(next);
            }
            if visited[next] {
                continue;
            }
            if let Some(found) = self.visit(next, visited, on_path) {
                return Some(found);
            }
        }

        on_path[node] = false;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Parameter, Scope};

    fn noncircular() -> Protocol {
        let buyer = Role::new("Buyer");
        let seller = Role::new("Seller");
        Protocol::new("Noncircular")
            .with_role(buyer.clone())
            .with_role(seller.clone())
            .with_param(Parameter::new("ID", Scope::Out).as_key())
            .with_param(Parameter::new("item", Scope::Out))
            .with_param(Parameter::new("price", Scope::Out))
            .with_action(
                Action::new("Request", buyer.clone(), seller.clone())
                    .with_param(Parameter::new("ID", Scope::Out).as_key())
                    .with_param(Parameter::new("item", Scope::Out)),
            )
            .with_action(
                Action::new("Offer", buyer, seller)
                    .with_param(Parameter::new("ID", Scope::In).as_key())
                    .with_param(Parameter::new("item", Scope::In))
                    .with_param(Parameter::new("price", Scope::Out)),
            )
    }

    #[test]
    fn test_valid_protocol() {
        assert!(validate(&noncircular()).is_ok());
    }

    #[test]
    fn test_circular_dependency() {
        let mut p = noncircular();
        p.actions[0].params.push(Parameter::new("price", Scope::In));
        assert!(matches!(
            validate(&p),
            Err(ValidationError::CircularDependency(_))
        ));
    }

    #[test]
    fn test_action_without_shared_key() {
        let mut p = noncircular();
        let action = Action::new("Fail", p.roles[0].clone(), p.roles[1].clone())
            .with_param(Parameter::new("madeup", Scope::Out).as_key());
        p.actions.push(action);
        assert!(matches!(
            validate(&p),
            Err(ValidationError::NoKeyOverlap { .. })
        ));
    }

    #[test]
    fn test_no_key_parameters() {
        let mut p = noncircular();
        for param in &mut p.params {
            param.key = false;
        }
        assert!(matches!(
            validate(&p),
            Err(ValidationError::NoKeyParameters(_))
        ));
    }

    #[test]
    fn test_unknown_role() {
        let mut p = noncircular();
        p.actions[0].to = Role::new("Shipper");
        match validate(&p) {
            Err(ValidationError::UnknownRole { action, role }) => {
                assert_eq!(action, "Request");
                assert_eq!(role, "Shipper");
            }
            other => panic!("expected unknown role, got {:?}", other),
        }
    }

    #[test]
    fn test_build_graph_edges() {
        let p = noncircular();
        let graph = DependencyGraph::build(&p.actions);
        assert!(graph.depends_on(0).is_empty());
        assert_eq!(graph.depends_on(1), &[0]);
    }

    #[test]
    fn test_chain_is_acyclic() {
        // a -> b -> c
        let graph = DependencyGraph::from_edges(vec![vec![1], vec![2], vec![]]);
        assert_eq!(graph.find_cycle(), None);
    }

    #[test]
    fn test_closed_chain_is_cyclic() {
        // a -> b -> c -> a
        let graph = DependencyGraph::from_edges(vec![vec![1], vec![2], vec![0]]);
        assert!(graph.find_cycle().is_some());
    }

    #[test]
    fn test_diamond_is_acyclic() {
        // a -> b -> c
        //  \-> d -/
        let graph = DependencyGraph::from_edges(vec![vec![1, 3], vec![2], vec![], vec![2]]);
        assert_eq!(graph.find_cycle(), None);
    }

    #[test]
    fn test_diamond_with_back_edge_is_cyclic() {
        // a -> b -> c -> a
        //  \-> d -/
        let graph = DependencyGraph::from_edges(vec![vec![1, 3], vec![2], vec![0], vec![2]]);
        assert!(graph.find_cycle().is_some());
    }

    #[test]
    fn test_reported_node_lies_on_cycle() {
        // root -> a -> b -> a
        let graph = DependencyGraph::from_edges(vec![vec![1], vec![2], vec![1]]);
        let node = graph.find_cycle().unwrap();
        assert!(node == 1 || node == 2);
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::build(&[]);
        assert!(graph.is_empty());
        assert_eq!(graph.find_cycle(), None);
    }
}
