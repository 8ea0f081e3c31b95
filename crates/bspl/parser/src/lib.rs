//! BSPL grammar
//!
//! Turns BSPL source text into a [`bspl_types::Protocol`]. The pipeline
//! has three stages:
//!
//! 1. [`Lexer`] splits the text into a token table, driven by
//!    [`LexerRules`].
//! 2. [`normalize`] drops whitespace and collapses newline runs.
//! 3. [`Parser`] walks the table section by section and builds the AST.
//!
//! [`compile`] additionally runs the semantic checks from `bspl-types`.
//!
//! # Syntax
//!
//! ```text
//! Name {
//!   role R1, R2, ...
//!   parameter [scope] name [key], ...
//!
//!   R1 -> R2: Action[[scope] name [key], ...]
//! }
//! ```
//!
//! # Usage
//!
//! ```rust
//! use bspl_parser::compile;
//!
//! let source = "Purchase {
//!   role Buyer, Seller
//!   parameter out ID key, out item, out price
//!
//!   Buyer -> Seller: Request[out ID key, out item]
//!   Seller -> Buyer: Offer[in ID key, in item, out price]
//! }";
//!
//! let protocol = compile(source).unwrap();
//! assert_eq!(protocol.key(), "Purchase,ID");
//! assert_eq!(protocol.actions.len(), 2);
//! ```

#![deny(unsafe_code)]

mod compiler;
mod errors;
mod lexer;
mod normalize;
mod parser;

pub use compiler::{compile, compile_with_rules};
pub use errors::{BsplError, BsplResult};
pub use lexer::{Lexer, LexerRules, Token, TokenKind};
pub use normalize::normalize;
pub use parser::Parser;
