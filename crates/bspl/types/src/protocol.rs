//! Protocol AST: roles, scoped parameters, actions

use crate::canonical::compare_parameters;
use crate::errors::ValidationResult;
use crate::validation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the segments of a protocol key
pub const KEY_SEPARATOR: char = ',';

/// Words reserved by the BSPL grammar
pub mod keywords {
    pub const ROLE: &str = "role";
    pub const PARAMETER: &str = "parameter";
    pub const IN: &str = "in";
    pub const OUT: &str = "out";
    pub const NIL: &str = "nil";
    pub const KEY: &str = "key";
}

/// Every reserved word; none of them may name a protocol, role, action or parameter
pub const RESERVED_WORDS: [&str; 6] = [
    keywords::ROLE,
    keywords::PARAMETER,
    keywords::IN,
    keywords::OUT,
    keywords::NIL,
    keywords::KEY,
];

/// Words accepted in the scope position of a parameter group
pub const SCOPE_WORDS: [&str; 3] = [keywords::IN, keywords::NIL, keywords::OUT];

/// Check whether a word is reserved by the grammar
pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

// ── Role ─────────────────────────────────────────────────────────────

/// A participant role of a protocol
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(pub String);

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Parameter ────────────────────────────────────────────────────────

/// Binding scope of a parameter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Must be bound before the action
    In,
    /// Unscoped; the default when no scope word is given
    #[default]
    Nil,
    /// Produced by the action
    Out,
}

impl Scope {
    /// Parse a scope word (`in`, `out`, `nil`)
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            keywords::IN => Some(Self::In),
            keywords::OUT => Some(Self::Out),
            keywords::NIL => Some(Self::Nil),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => keywords::IN,
            Self::Nil => keywords::NIL,
            Self::Out => keywords::OUT,
        }
    }

    /// Position in the canonical ordering: In < Nil < Out
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Self::In => 0,
            Self::Nil => 1,
            Self::Out => 2,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, scoped parameter of a protocol or action
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub scope: Scope,
    pub key: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, scope: Scope) -> Self {
        Self {
            name: name.into(),
            scope,
            key: false,
        }
    }

    /// Mark the parameter as part of the instance key
    pub fn as_key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn is_key(&self) -> bool {
        self.key
    }
}

/// Canonical form: `[scope ]name[ key]`, the scope omitted when nil
impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scope != Scope::Nil {
            write!(f, "{} ", self.scope)?;
        }
        write!(f, "{}", self.name)?;
        if self.key {
            write!(f, " {}", keywords::KEY)?;
        }
        Ok(())
    }
}

/// Anything declaring a list of parameters
pub trait Parameterized {
    fn parameters(&self) -> &[Parameter];

    /// Key parameters in canonical order
    fn keys(&self) -> Vec<&Parameter> {
        let mut keys: Vec<&Parameter> = self.parameters().iter().filter(|p| p.is_key()).collect();
        keys.sort_by(|a, b| compare_parameters(a, b));
        keys
    }

    fn ins(&self) -> Vec<&Parameter> {
        self.with_scope(Scope::In)
    }

    fn outs(&self) -> Vec<&Parameter> {
        self.with_scope(Scope::Out)
    }

    fn nils(&self) -> Vec<&Parameter> {
        self.with_scope(Scope::Nil)
    }

    fn with_scope(&self, scope: Scope) -> Vec<&Parameter> {
        self.parameters()
            .iter()
            .filter(|p| p.scope == scope)
            .collect()
    }

    fn find_parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters().iter().find(|p| p.name == name)
    }
}

// ── Action ───────────────────────────────────────────────────────────

/// A directed message type between two roles
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub from: Role,
    pub to: Role,
    pub params: Vec<Parameter>,
}

impl Action {
    pub fn new(name: impl Into<String>, from: Role, to: Role) -> Self {
        Self {
            name: name.into(),
            from,
            to,
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }
}

impl Parameterized for Action {
    fn parameters(&self) -> &[Parameter] {
        &self.params
    }
}

/// Canonical form: `from -> to: name[p1, p2, ...]`
impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}[", self.from, self.to, self.name)?;
        write_joined(f, &self.params)?;
        write!(f, "]")
    }
}

// ── Protocol ─────────────────────────────────────────────────────────

/// A complete protocol declaration
///
/// Built once by the parser and shared read-only afterwards; equality
/// is structural over the stored order. Use [`Protocol::canonical`] to
/// compare protocols that differ only in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Protocol {
    pub name: String,
    pub roles: Vec<Role>,
    pub params: Vec<Parameter>,
    pub actions: Vec<Action>,
}

impl Protocol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    pub fn with_param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Protocol identity: the name followed by every key parameter name
    pub fn key(&self) -> String {
        let mut key = self.name.clone();
        for param in self.keys() {
            key.push(KEY_SEPARATOR);
            key.push_str(&param.name);
        }
        key
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    pub fn find_action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Reverse lookup of a canonical parameter string
    ///
    /// Action declarations are searched first, then the protocol's own
    /// parameter list.
    pub fn resolve(&self, canonical: &str) -> Option<&Parameter> {
        self.actions
            .iter()
            .flat_map(|a| a.params.iter())
            .chain(self.params.iter())
            .find(|p| p.to_string() == canonical)
    }

    /// Run the semantic checks
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate(self)
    }
}

impl Parameterized for Protocol {
    fn parameters(&self) -> &[Parameter] {
        &self.params
    }
}

/// Re-serializes the protocol in the shape the grammar accepts
impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {{", self.name)?;
        write!(f, "  {} ", keywords::ROLE)?;
        write_joined(f, &self.roles)?;
        writeln!(f)?;
        write!(f, "  {} ", keywords::PARAMETER)?;
        write_joined(f, &self.params)?;
        writeln!(f)?;
        writeln!(f)?;
        for action in &self.actions {
            writeln!(f, "  {}", action)?;
        }
        writeln!(f, "}}")
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
