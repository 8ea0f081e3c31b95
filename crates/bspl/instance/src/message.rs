//! Messages: recorded occurrences of an action

use crate::instance::Values;
use crate::traits::{Keyed, ProtocolMessage};
use bspl_types::{Action, Parameterized};
use std::collections::BTreeMap;

/// An action that took place within one instance
///
/// `values` is keyed by the canonical strings of the action's own
/// parameters (`in ID key`, `out price`, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    instance_key: String,
    action: Action,
    values: Values,
}

impl Message {
    pub fn new(instance_key: impl Into<String>, action: Action, values: Values) -> Self {
        Self {
            instance_key: instance_key.into(),
            action,
            values,
        }
    }
}

impl ProtocolMessage for Message {
    fn instance_key(&self) -> &str {
        &self.instance_key
    }

    fn action(&self) -> &Action {
        &self.action
    }

    fn values(&self) -> &Values {
        &self.values
    }
}

impl Keyed for Message {
    fn keys(&self) -> BTreeMap<String, String> {
        self.action
            .keys()
            .into_iter()
            .filter_map(|param| {
                self.values
                    .get(&param.to_string())
                    .map(|value| (param.name.clone(), value.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::differ;
    use bspl_types::{Parameter, Role, Scope};

    fn offer() -> Action {
        Action::new("Offer", Role::new("Seller"), Role::new("Buyer"))
            .with_param(Parameter::new("ID", Scope::In).as_key())
            .with_param(Parameter::new("item", Scope::In))
            .with_param(Parameter::new("price", Scope::Out))
    }

    fn values(pairs: &[(&str, &str)]) -> Values {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_message_keys() {
        let m = Message::new(
            "Purchase,ID:X",
            offer(),
            values(&[("in ID key", "X"), ("in item", "book"), ("out price", "10")]),
        );
        let keys = m.keys();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys["ID"], "X");
    }

    #[test]
    fn test_unbound_key_is_left_out() {
        let m = Message::new("Purchase,ID:", offer(), values(&[("out price", "10")]));
        assert!(m.keys().is_empty());
    }

    #[test]
    fn test_differ() {
        let a = Message::new("k", offer(), values(&[("in ID key", "X")]));
        let b = Message::new("k", offer(), values(&[("in ID key", "X"), ("out price", "3")]));
        let c = Message::new("k", offer(), values(&[("in ID key", "Y")]));
        assert!(!differ(&a, &b));
        assert!(differ(&a, &c));
    }
}
