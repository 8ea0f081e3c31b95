//! Token normalization
//!
//! The grammar treats newline as its statement terminator but is
//! otherwise insensitive to layout. Normalization drops whitespace
//! tokens and collapses each run of newlines into one, leaving every
//! other token untouched.

use crate::lexer::{Token, TokenKind};

/// Strip whitespace and repeated newlines from a token table
pub fn normalize(tokens: Vec<Token>) -> Vec<Token> {
    let total = tokens.len();
    let mut normalized: Vec<Token> = Vec::with_capacity(total);

    for token in tokens {
        match token.kind {
            TokenKind::Whitespace => continue,
            TokenKind::Newline
                if normalized
                    .last()
                    .is_some_and(|prev| prev.kind == TokenKind::Newline) =>
            {
                continue
            }
            _ => normalized.push(token),
        }
    }

    tracing::debug!(before = total, after = normalized.len(), "Normalized token table");
    normalized
}
