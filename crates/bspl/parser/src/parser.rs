//! Parser: builds a protocol AST from a normalized token table
//!
//! The grammar is consumed strictly left to right in fixed sections:
//! name, roles, protocol parameters, then actions until the closing
//! brace. Each section advances the cursor and reports how many tokens
//! it consumed. The first violation aborts the parse; the error handed
//! back carries every token value consumed before it.

use crate::errors::{BsplError, BsplResult};
use crate::lexer::{Lexer, LexerRules, Token, TokenKind};
use crate::normalize::normalize;
use bspl_types::{
    is_reserved, keywords, validate_has_keys, Action, Parameter, Protocol, Role, Scope,
    SCOPE_WORDS,
};

/// Parser for BSPL protocols
pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    protocol: Protocol,
}

impl<'t> Parser<'t> {
    /// Parse protocol source text using the default lexer rules
    pub fn parse(input: &str) -> BsplResult<Protocol> {
        Self::parse_with_rules(input, &LexerRules::default())
    }

    /// Parse protocol source text under a custom lexer rule set
    pub fn parse_with_rules(input: &str, rules: &LexerRules) -> BsplResult<Protocol> {
        let tokens = Lexer::new(input, rules).tokenize()?;
        Parser::parse_tokens(tokens)
    }

    /// Parse a raw token table produced by any tokenizer honouring the token contract
    pub fn parse_tokens(tokens: Vec<Token>) -> BsplResult<Protocol> {
        let tokens = normalize(tokens);
        let mut parser = Parser::new(&tokens);
        match parser.parse_protocol() {
            Ok(consumed) => {
                tracing::debug!(
                    protocol = %parser.protocol.name,
                    tokens = consumed,
                    "Parsed protocol"
                );
                Ok(parser.protocol)
            }
            Err(cause) => Err(BsplError::Global {
                consumed: parser.consumed(),
                source: Box::new(cause),
            }),
        }
    }

    fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            protocol: Protocol::default(),
        }
    }

    fn parse_protocol(&mut self) -> BsplResult<usize> {
        let start = self.pos;
        while self.accept(TokenKind::Newline) {}

        self.parse_name()?;
        self.parse_roles()?;
        self.parse_protocol_params()?;
        self.parse_actions()?;
        Ok(self.pos - start)
    }

    // ── Sections ─────────────────────────────────────────────────────

    /// `WORD { [NEWLINE]`
    fn parse_name(&mut self) -> BsplResult<usize> {
        let start = self.pos;
        self.protocol.name = self.expect_identifier()?;
        self.expect(TokenKind::OpenBrace)?;
        self.accept(TokenKind::Newline);

        tracing::debug!(protocol = %self.protocol.name, "Parsed name section");
        Ok(self.pos - start)
    }

    /// `role WORD (, WORD)* NEWLINE`
    fn parse_roles(&mut self) -> BsplResult<usize> {
        let start = self.pos;
        self.expect_keyword(keywords::ROLE)?;

        loop {
            let tok = self.current(TokenKind::Word)?;
            let role = Role::new(identifier(tok)?);
            if self.protocol.has_role(&role) {
                return Err(BsplError::DuplicateRole {
                    role: role.to_string(),
                    line: tok.line,
                });
            }
            self.pos += 1;
            self.protocol.roles.push(role);

            if self.accept(TokenKind::Comma) {
                continue;
            }
            self.expect_labeled(TokenKind::Newline, "',' or newline")?;
            break;
        }

        tracing::debug!(roles = self.protocol.roles.len(), "Parsed role section");
        Ok(self.pos - start)
    }

    /// `parameter <groups> NEWLINE`
    fn parse_protocol_params(&mut self) -> BsplResult<usize> {
        let start = self.pos;
        self.expect_keyword(keywords::PARAMETER)?;
        self.protocol.params = self.parse_param_list(TokenKind::Newline)?;
        validate_has_keys(&self.protocol)?;

        tracing::debug!(
            params = self.protocol.params.len(),
            "Parsed protocol parameter section"
        );
        Ok(self.pos - start)
    }

    /// Action lines until `}`, then nothing but newlines
    fn parse_actions(&mut self) -> BsplResult<usize> {
        let start = self.pos;

        loop {
            match self.peek() {
                Some(tok) if tok.kind == TokenKind::CloseBrace => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    self.parse_action()?;
                }
                None => return Err(BsplError::UnexpectedEof("action or '}'".into())),
            }
        }

        while let Some(tok) = self.peek() {
            if tok.kind != TokenKind::Newline {
                return Err(unexpected("end of input", tok));
            }
            self.pos += 1;
        }

        Ok(self.pos - start)
    }

    /// `WORD -> WORD : WORD [ <groups> ] NEWLINE`
    fn parse_action(&mut self) -> BsplResult<usize> {
        let start = self.pos;
        let from = self.expect_role()?;
        self.expect(TokenKind::Arrow)?;
        let to = self.expect_role()?;
        self.expect(TokenKind::Colon)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::OpenBracket)?;
        let params = self.parse_param_list(TokenKind::CloseBracket)?;
        self.expect(TokenKind::Newline)?;

        let action = Action {
            name,
            from,
            to,
            params,
        };
        tracing::debug!(action = %action, "Parsed action section");
        self.protocol.actions.push(action);
        Ok(self.pos - start)
    }

    /// Comma-separated parameter groups up to and including `terminator`
    fn parse_param_list(&mut self, terminator: TokenKind) -> BsplResult<Vec<Parameter>> {
        let mut params = Vec::new();
        let mut group: Vec<&'t Token> = Vec::new();

        loop {
            let Some(tok) = self.peek() else {
                return Err(BsplError::UnexpectedEof(format!(
                    "parameter, ',' or '{}'",
                    terminator
                )));
            };

            match tok.kind {
                TokenKind::Word => group.push(tok),
                TokenKind::Comma => {
                    push_param(&mut params, &group)?;
                    group.clear();
                }
                kind if kind == terminator => {
                    push_param(&mut params, &group)?;
                    self.pos += 1;
                    break;
                }
                _ => {
                    return Err(unexpected(
                        &format!("parameter, ',' or '{}'", terminator),
                        tok,
                    ))
                }
            }
            self.pos += 1;
        }

        Ok(params)
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    /// The current token, required to be of `kind`; does not advance
    fn current(&self, kind: TokenKind) -> BsplResult<&'t Token> {
        match self.peek() {
            Some(tok) if tok.kind == kind => Ok(tok),
            Some(tok) => Err(unexpected(&kind.to_string(), tok)),
            None => Err(BsplError::UnexpectedEof(kind.to_string())),
        }
    }

    fn accept(&mut self, kind: TokenKind) -> bool {
        match self.peek() {
            Some(tok) if tok.kind == kind => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> BsplResult<&'t Token> {
        let tok = self.current(kind)?;
        self.pos += 1;
        Ok(tok)
    }

    fn expect_labeled(&mut self, kind: TokenKind, label: &str) -> BsplResult<&'t Token> {
        match self.peek() {
            Some(tok) if tok.kind == kind => {
                self.pos += 1;
                Ok(tok)
            }
            Some(tok) => Err(unexpected(label, tok)),
            None => Err(BsplError::UnexpectedEof(label.into())),
        }
    }

    fn expect_identifier(&mut self) -> BsplResult<String> {
        let name = identifier(self.current(TokenKind::Word)?)?;
        self.pos += 1;
        Ok(name)
    }

    fn expect_keyword(&mut self, keyword: &str) -> BsplResult<()> {
        let tok = self.current(TokenKind::Word)?;
        if tok.text != keyword {
            return Err(unexpected(&format!("'{}'", keyword), tok));
        }
        self.pos += 1;
        Ok(())
    }

    fn expect_role(&mut self) -> BsplResult<Role> {
        let tok = self.current(TokenKind::Word)?;
        let role = Role::new(tok.text.as_str());
        if !self.protocol.has_role(&role) {
            return Err(unexpected("a declared role", tok));
        }
        self.pos += 1;
        Ok(role)
    }

    fn consumed(&self) -> Vec<String> {
        self.tokens[..self.pos.min(self.tokens.len())]
            .iter()
            .map(|t| t.text.clone())
            .collect()
    }
}

fn unexpected(expected: &str, found: &Token) -> BsplError {
    BsplError::Parse {
        expected: expected.to_string(),
        found: found.text.clone(),
        line: found.line,
    }
}

/// A free identifier: any word that is not reserved
fn identifier(tok: &Token) -> BsplResult<String> {
    if is_reserved(&tok.text) {
        return Err(BsplError::Reserved {
            word: tok.text.clone(),
            line: tok.line,
        });
    }
    Ok(tok.text.clone())
}

fn push_param(params: &mut Vec<Parameter>, group: &[&Token]) -> BsplResult<()> {
    let param = build_param(group)?;
    if params.iter().any(|p| p.name == param.name) {
        return Err(param_error(
            group,
            format!("parameter '{}' is declared more than once", param.name),
        ));
    }
    params.push(param);
    Ok(())
}

/// Interpret a group of one to three words by position
///
/// `name`, `name key`, `scope name`, `scope name key`
fn build_param(group: &[&Token]) -> BsplResult<Parameter> {
    match group {
        [name] => Ok(Parameter::new(identifier(name)?, Scope::Nil)),
        [name, marker] if marker.text == keywords::KEY => {
            Ok(Parameter::new(identifier(name)?, Scope::Nil).as_key())
        }
        [scope, name] => Ok(Parameter::new(identifier(name)?, scope_of(scope, group)?)),
        [scope, name, marker] => {
            if marker.text != keywords::KEY {
                return Err(param_error(
                    group,
                    format!("expected '{}' but found '{}'", keywords::KEY, marker.text),
                ));
            }
            Ok(Parameter::new(identifier(name)?, scope_of(scope, group)?).as_key())
        }
        [] => Err(param_error(group, "empty parameter group".into())),
        _ => Err(param_error(
            group,
            "a parameter takes at most a scope, a name and a key marker".into(),
        )),
    }
}

fn scope_of(tok: &Token, group: &[&Token]) -> BsplResult<Scope> {
    Scope::from_word(&tok.text).ok_or_else(|| {
        param_error(
            group,
            format!("'{}' is not a scope ({})", tok.text, SCOPE_WORDS.join(", ")),
        )
    })
}

fn param_error(group: &[&Token], message: String) -> BsplError {
    BsplError::Param {
        group: group.iter().map(|t| t.text.clone()).collect(),
        message,
    }
}
