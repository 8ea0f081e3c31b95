//! Behaviour contracts for instances and messages

use crate::errors::InstanceResult;
use crate::instance::{Diff, Roles, Values};
use bspl_types::{Action, Protocol};
use std::collections::BTreeMap;

/// Something identified by the values of its key parameters
pub trait Keyed {
    /// Key parameter name to bound value
    fn keys(&self) -> BTreeMap<String, String>;
}

/// True when the two sides are bound to different key values
pub fn differ<A, B>(a: &A, b: &B) -> bool
where
    A: Keyed + ?Sized,
    B: Keyed + ?Sized,
{
    a.keys() != b.keys()
}

/// One execution of a protocol
///
/// Implementors hold mutable state; callers serialize access to a
/// single instance themselves.
pub trait ProtocolInstance: Keyed {
    type Message: ProtocolMessage;

    fn protocol(&self) -> &Protocol;

    fn roles(&self) -> &Roles;

    /// Bound values keyed by canonical parameter string
    fn values(&self) -> &Values;

    /// Routing identity: protocol key, then the key parameter values
    fn key(&self) -> String;

    /// Value bound to a parameter name; empty when unbound
    fn get_value(&self, name: &str) -> &str;

    fn set_value(&mut self, name: &str, value: String) -> InstanceResult<()>;

    /// Work out which action turned `self` into `other`
    fn diff(&self, other: &Self) -> InstanceResult<Diff>;

    /// Take over the values `other` observed since `self`
    ///
    /// Only sound when exactly one action separates the two snapshots.
    fn update(&mut self, other: &Self) -> InstanceResult<()>;

    fn add_message(&mut self, message: Self::Message) -> InstanceResult<()>;

    fn equals(&self, other: &Self) -> bool;
}

/// One occurrence of an action within an instance
pub trait ProtocolMessage: Keyed {
    fn instance_key(&self) -> &str;

    fn action(&self) -> &Action;

    fn values(&self) -> &Values;
}
