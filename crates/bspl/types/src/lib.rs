//! BSPL protocol types
//!
//! A BSPL protocol declares the roles taking part in an interaction,
//! the parameters shared by the protocol, and the actions: directed
//! messages between two roles carrying scoped parameters.
//!
//! ```text
//! Purchase {
//!   role Buyer, Seller
//!   parameter out ID key, out item, out price
//!
//!   Buyer -> Seller: Request[out ID key, out item]
//!   Seller -> Buyer: Offer[in ID key, in item, out price]
//! }
//! ```
//!
//! This crate holds the AST ([`Protocol`], [`Action`], [`Parameter`],
//! [`Role`]), its canonical ordering, and the semantic checks a
//! structurally valid protocol must pass before instances of it are
//! tracked.

#![deny(unsafe_code)]

mod canonical;
mod errors;
mod protocol;
mod validation;

pub use canonical::{compare_parameters, equivalent, sort_actions, sort_parameters, sort_roles};
pub use errors::{ValidationError, ValidationResult};
pub use protocol::{
    is_reserved, keywords, Action, Parameter, Parameterized, Protocol, Role, Scope,
    KEY_SEPARATOR, RESERVED_WORDS, SCOPE_WORDS,
};
pub use validation::{validate, validate_has_keys, DependencyGraph};
