//! Compiler: source text to a validated protocol
//!
//! Runs the structural parse, then the semantic checks. A protocol
//! returned from here is safe to instantiate.

use crate::errors::BsplResult;
use crate::lexer::LexerRules;
use crate::parser::Parser;
use bspl_types::Protocol;

/// Compile BSPL source into a validated [`Protocol`]
pub fn compile(input: &str) -> BsplResult<Protocol> {
    compile_with_rules(input, &LexerRules::default())
}

/// Compile BSPL source under a custom lexer rule set
pub fn compile_with_rules(input: &str, rules: &LexerRules) -> BsplResult<Protocol> {
    let protocol = Parser::parse_with_rules(input, rules)?;
    protocol.validate()?;

    tracing::info!(
        protocol = %protocol.name,
        key = %protocol.key(),
        roles = protocol.roles.len(),
        actions = protocol.actions.len(),
        "Protocol compiled"
    );
    Ok(protocol)
}
