//! Property tests: chains of data-dependent actions validate until an
//! input closes the chain into a cycle.

use bspl_types::{validate, Action, Parameter, Protocol, Role, Scope, ValidationError};
use proptest::prelude::*;

/// Action `i` consumes `x{i-1}` and produces `x{i}`; all share the key `ID`.
fn chain(len: usize) -> Protocol {
    let a = Role::new("A");
    let b = Role::new("B");
    let mut protocol = Protocol::new("Chain")
        .with_role(a.clone())
        .with_role(b.clone())
        .with_param(Parameter::new("ID", Scope::Out).as_key());

    for i in 0..len {
        protocol.params.push(Parameter::new(format!("x{}", i), Scope::Out));

        let key_scope = if i == 0 { Scope::Out } else { Scope::In };
        let (from, to) = if i % 2 == 0 { (&a, &b) } else { (&b, &a) };
        let mut action = Action::new(format!("Step{}", i), from.clone(), to.clone())
            .with_param(Parameter::new("ID", key_scope).as_key())
            .with_param(Parameter::new(format!("x{}", i), Scope::Out));
        if i > 0 {
            action
                .params
                .push(Parameter::new(format!("x{}", i - 1), Scope::In));
        }
        protocol.actions.push(action);
    }
    protocol
}

proptest! {
    #[test]
    fn open_chains_validate(len in 1usize..12) {
        prop_assert!(validate(&chain(len)).is_ok());
    }

    #[test]
    fn closing_the_chain_is_rejected(len in 2usize..12) {
        let mut protocol = chain(len);
        protocol.actions[0]
            .params
            .push(Parameter::new(format!("x{}", len - 1), Scope::In));

        match validate(&protocol) {
            Err(ValidationError::CircularDependency(action)) => {
                prop_assert!(protocol.actions.iter().any(|a| a.name == action));
            }
            other => prop_assert!(false, "expected a cycle, got {:?}", other),
        }
    }

    #[test]
    fn reordering_actions_keeps_the_verdict(len in 2usize..8, rotate in 0usize..8) {
        let mut protocol = chain(len);
        protocol.actions.rotate_left(rotate % len);
        prop_assert!(validate(&protocol).is_ok());

        let step0 = protocol.actions.iter().position(|a| a.name == "Step0").unwrap();
        protocol.actions[step0]
            .params
            .push(Parameter::new(format!("x{}", len - 1), Scope::In));
        prop_assert!(validate(&protocol).is_err());
    }
}
