//! BSPL protocol instances
//!
//! An [`Instance`] is one execution of a compiled protocol: role
//! bindings plus the parameter values and messages observed so far.
//! Given two snapshots of the same instance, [`ProtocolInstance::diff`]
//! reconstructs which action produced the change and
//! [`ProtocolInstance::update`] applies it.
//!
//! Instances and messages travel as JSON envelopes that embed the
//! protocol and action text, see [`Instance::encode`] and
//! [`Message::encode`].
//!
//! # Usage
//!
//! ```rust
//! use bspl_instance::{instantiate, ProtocolInstance, Roles};
//! use bspl_types::Role;
//! use std::sync::Arc;
//!
//! let protocol = bspl_parser::compile("Purchase {
//!   role Buyer, Seller
//!   parameter out ID key, out item, out price
//!
//!   Buyer -> Seller: Request[out ID key, out item]
//!   Seller -> Buyer: Offer[in ID key, in item, out price]
//! }").unwrap();
//!
//! let roles = Roles::from([
//!     (Role::new("Buyer"), "B".to_string()),
//!     (Role::new("Seller"), "S".to_string()),
//! ]);
//! let protocol = Arc::new(protocol);
//! let mut local = instantiate(protocol.clone(), roles.clone());
//!
//! let mut remote = instantiate(protocol, roles);
//! remote.set_value("ID", "42".into()).unwrap();
//! remote.set_value("item", "book".into()).unwrap();
//!
//! let diff = local.diff(&remote).unwrap();
//! assert_eq!(diff.actions[0].name, "Request");
//!
//! local.update(&remote).unwrap();
//! assert_eq!(local.key(), "Purchase,ID:42");
//! ```

#![deny(unsafe_code)]

mod codec;
mod errors;
mod instance;
mod message;
mod traits;

pub use codec::{
    marshal_action, unmarshal_action, unmarshal_action_with_rules, InstanceEnvelope,
    MessageEnvelope,
};
pub use errors::{InstanceError, InstanceResult};
pub use instance::{instantiate, Diff, Instance, Messages, Roles, Values, INSTANCE_SEPARATOR};
pub use message::Message;
pub use traits::{differ, Keyed, ProtocolInstance, ProtocolMessage};
