//! Instance engine: the live state of one protocol execution
//!
//! An instance binds a protocol to role identities and accumulates
//! parameter values and messages as the execution advances. Two
//! snapshots of the same instance can be reconciled with
//! [`ProtocolInstance::diff`], which names the action that explains
//! the newly observed values.

use crate::errors::{InstanceError, InstanceResult};
use crate::message::Message;
use crate::traits::{Keyed, ProtocolInstance, ProtocolMessage};
use bspl_types::{Action, Parameter, Parameterized, Protocol, Role, KEY_SEPARATOR};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Separates the protocol key from the key values in an instance key
pub const INSTANCE_SEPARATOR: char = ':';

/// Role to the identity of the agent playing it
pub type Roles = BTreeMap<Role, String>;

/// Canonical parameter string to bound value
pub type Values = BTreeMap<String, String>;

/// Canonical action string to the message recorded for it
pub type Messages = BTreeMap<String, Message>;

/// Outcome of reconciling two snapshots
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diff {
    /// Every action whose outputs account exactly for the new values
    pub actions: Vec<Action>,
    /// Newly observed values keyed by canonical parameter string
    pub values: Values,
}

/// A protocol instance
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instance {
    protocol: Arc<Protocol>,
    roles: Roles,
    values: Values,
    messages: Messages,
}

/// Start a fresh execution of `protocol` with the given role bindings
pub fn instantiate(protocol: Arc<Protocol>, roles: Roles) -> Instance {
    Instance::new(protocol, roles)
}

impl Instance {
    pub fn new(protocol: Arc<Protocol>, roles: Roles) -> Self {
        Self {
            protocol,
            roles,
            values: Values::new(),
            messages: Messages::new(),
        }
    }

    pub(crate) fn from_parts(
        protocol: Arc<Protocol>,
        roles: Roles,
        values: Values,
        messages: Messages,
    ) -> Self {
        Self {
            protocol,
            roles,
            values,
            messages,
        }
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// The declared parameter for a canonical value key
    ///
    /// Every key in `values` was produced from a declared parameter;
    /// one that no longer resolves means the state is corrupt.
    fn resolve(&self, canonical: &str) -> &Parameter {
        match self.protocol.resolve(canonical) {
            Some(param) => param,
            None => panic!(
                "value key '{}' does not resolve to any parameter of protocol '{}'",
                canonical, self.protocol.name
            ),
        }
    }

    fn observed_values(&self, other: &Instance) -> InstanceResult<Values> {
        let mut observed = Values::new();

        for (key, incoming) in &other.values {
            if incoming.is_empty() {
                continue;
            }
            match self.values.get(key) {
                Some(current) if current == incoming => {}
                Some(current) if !current.is_empty() => {
                    return Err(InstanceError::ValueConflict {
                        parameter: key.clone(),
                        current: current.clone(),
                        incoming: incoming.clone(),
                    });
                }
                _ => {
                    observed.insert(key.clone(), incoming.clone());
                }
            }
        }

        Ok(observed)
    }
}

impl ProtocolInstance for Instance {
    type Message = Message;

    fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    fn roles(&self) -> &Roles {
        &self.roles
    }

    fn values(&self) -> &Values {
        &self.values
    }

    fn key(&self) -> String {
        let values: Vec<&str> = self
            .protocol
            .keys()
            .into_iter()
            .map(|param| {
                self.values
                    .get(&param.to_string())
                    .map(String::as_str)
                    .unwrap_or("")
            })
            .collect();

        let mut key = self.protocol.key();
        key.push(INSTANCE_SEPARATOR);
        key.push_str(&values.join(&KEY_SEPARATOR.to_string()));
        key
    }

    fn get_value(&self, name: &str) -> &str {
        self.protocol
            .find_parameter(name)
            .and_then(|param| self.values.get(&param.to_string()))
            .map(String::as_str)
            .unwrap_or("")
    }

    fn set_value(&mut self, name: &str, value: String) -> InstanceResult<()> {
        let canonical = self
            .protocol
            .find_parameter(name)
            .map(|param| param.to_string())
            .ok_or_else(|| InstanceError::UnknownParameter {
                protocol: self.protocol.name.clone(),
                name: name.to_string(),
            })?;
        self.values.insert(canonical, value);
        Ok(())
    }

    fn diff(&self, other: &Self) -> InstanceResult<Diff> {
        if self.protocol != other.protocol {
            return Err(InstanceError::ProtocolMismatch {
                expected: self.protocol.key(),
                found: other.protocol.key(),
            });
        }

        let values = self.observed_values(other)?;
        let names: BTreeSet<&str> = values
            .keys()
            .map(|key| self.resolve(key).name.as_str())
            .collect();

        let actions: Vec<Action> = self
            .protocol
            .actions
            .iter()
            .filter(|action| {
                let outs = action.outs();
                outs.len() == names.len()
                    && outs.iter().all(|param| names.contains(param.name.as_str()))
            })
            .cloned()
            .collect();

        if actions.is_empty() {
            return Err(InstanceError::UnmatchedDiff(
                names.into_iter().map(String::from).collect(),
            ));
        }
        if actions.len() > 1 {
            tracing::warn!(
                instance = %self.key(),
                candidates = actions.len(),
                "Diff matches more than one action"
            );
        }

        tracing::debug!(
            instance = %self.key(),
            actions = ?actions.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            values = values.len(),
            "Diff computed"
        );
        Ok(Diff { actions, values })
    }

    fn update(&mut self, other: &Self) -> InstanceResult<()> {
        let diff = self.diff(other)?;
        let updates: Vec<(String, String)> = diff
            .values
            .into_iter()
            .map(|(key, value)| (self.resolve(&key).name.clone(), value))
            .collect();

        for (name, value) in updates {
            self.set_value(&name, value)?;
        }
        Ok(())
    }

    fn add_message(&mut self, message: Message) -> InstanceResult<()> {
        let action = message.action().to_string();
        if self.messages.contains_key(&action) {
            return Err(InstanceError::DuplicateMessage(action));
        }

        tracing::info!(
            instance = %self.key(),
            action = %message.action().name,
            "Message recorded"
        );
        self.messages.insert(action, message);
        Ok(())
    }

    fn equals(&self, other: &Self) -> bool {
        self == other
    }
}

impl Keyed for Instance {
    fn keys(&self) -> BTreeMap<String, String> {
        self.protocol
            .keys()
            .into_iter()
            .map(|param| (param.name.clone(), self.get_value(&param.name).to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bspl_types::Scope;

    fn proto_name() -> Arc<Protocol> {
        let buyer = Role::new("Buyer");
        let seller = Role::new("Seller");
        Arc::new(
            Protocol::new("ProtoName")
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
                ),
        )
    }

    fn roles() -> Roles {
        Roles::from([
            (Role::new("Buyer"), "B".to_string()),
            (Role::new("Seller"), "S".to_string()),
        ])
    }

    fn requested(protocol: &Arc<Protocol>) -> Instance {
        let mut i = instantiate(protocol.clone(), roles());
        i.set_value("ID", "testID".into()).unwrap();
        i.set_value("item", "testItem".into()).unwrap();
        i
    }

    #[test]
    fn test_instance_key() {
        let mut i = instantiate(proto_name(), roles());
        i.set_value("ID", "X".into()).unwrap();
        assert_eq!(i.key(), "ProtoName,ID:X");
    }

    #[test]
    fn test_key_of_unbound_instance() {
        assert_eq!(instantiate(proto_name(), roles()).key(), "ProtoName,ID:");
    }

    #[test]
    fn test_equals() {
        let p = proto_name();
        assert!(requested(&p).equals(&requested(&p)));
        assert!(!requested(&p).equals(&instantiate(p.clone(), roles())));
    }

    #[test]
    fn test_get_and_set_value() {
        let mut i = instantiate(proto_name(), roles());
        assert_eq!(i.get_value("price"), "");
        i.set_value("price", "10".into()).unwrap();
        assert_eq!(i.get_value("price"), "10");
        assert_eq!(i.values()["out price"], "10");
        assert!(matches!(
            i.set_value("colour", "red".into()),
            Err(InstanceError::UnknownParameter { .. })
        ));
        assert_eq!(i.get_value("colour"), "");
    }

    #[test]
    fn test_diff_identifies_request() {
        let p = proto_name();
        let empty = instantiate(p.clone(), roles());
        let diff = empty.diff(&requested(&p)).unwrap();
        assert_eq!(diff.actions.len(), 1);
        assert_eq!(diff.actions[0].name, "Request");
        assert_eq!(diff.values.len(), 2);
    }

    #[test]
    fn test_diff_ignores_values_already_known() {
        let p = proto_name();
        let before = requested(&p);
        let mut after = requested(&p);
        after.set_value("price", "3".into()).unwrap();

        let diff = before.diff(&after).unwrap();
        assert_eq!(diff.actions[0].name, "Offer");
        assert_eq!(diff.values.len(), 1);
    }

    #[test]
    fn test_diff_conflict() {
        let p = proto_name();
        let mine = requested(&p);
        let mut theirs = requested(&p);
        theirs.set_value("item", "otherItem".into()).unwrap();
        assert!(matches!(
            mine.diff(&theirs),
            Err(InstanceError::ValueConflict { .. })
        ));
    }

    #[test]
    fn test_diff_without_matching_action() {
        let p = proto_name();
        let empty = instantiate(p.clone(), roles());
        let mut partial = instantiate(p, roles());
        partial.set_value("ID", "testID".into()).unwrap();
        assert!(matches!(
            empty.diff(&partial),
            Err(InstanceError::UnmatchedDiff(names)) if names == vec!["ID".to_string()]
        ));
    }

    #[test]
    fn test_diff_requires_same_protocol() {
        let other = Arc::new(Protocol::new("Other").with_param(Parameter::new("ID", Scope::Out).as_key()));
        let a = instantiate(proto_name(), roles());
        let b = instantiate(other, roles());
        assert!(matches!(
            a.diff(&b),
            Err(InstanceError::ProtocolMismatch { .. })
        ));
    }

    #[test]
    fn test_update() {
        let p = proto_name();
        let mut i = instantiate(p.clone(), roles());
        let next = requested(&p);
        i.update(&next).unwrap();
        assert!(i.equals(&next));
    }

    #[test]
    fn test_update_leaves_state_on_error() {
        let p = proto_name();
        let mut i = requested(&p);
        let mut theirs = requested(&p);
        theirs.set_value("ID", "otherID".into()).unwrap();
        assert!(i.update(&theirs).is_err());
        assert!(i.equals(&requested(&p)));
    }

    #[test]
    fn test_add_message_once_per_action() {
        let p = proto_name();
        let mut i = requested(&p);
        let request = p.find_action("Request").unwrap().clone();
        let values = Values::from([("out ID key".to_string(), "testID".to_string())]);

        i.add_message(Message::new(i.key(), request.clone(), values.clone()))
            .unwrap();
        assert_eq!(i.messages().len(), 1);
        assert!(matches!(
            i.add_message(Message::new(i.key(), request, values)),
            Err(InstanceError::DuplicateMessage(_))
        ));
    }

    #[test]
    fn test_instance_keys() {
        let p = proto_name();
        let keys = requested(&p).keys();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys["ID"], "testID");
    }
}
