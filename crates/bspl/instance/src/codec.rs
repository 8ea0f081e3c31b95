//! Envelope codec: JSON envelopes for instances and messages
//!
//! Protocols and actions travel as BSPL text, so a receiver without a
//! prior copy of the schema rebuilds it with the ordinary parser.

use crate::errors::{InstanceError, InstanceResult};
use crate::instance::{Instance, Messages, Roles, Values};
use crate::message::Message;
use crate::traits::{ProtocolInstance, ProtocolMessage};
use bspl_parser::{compile_with_rules, normalize, Lexer, LexerRules, Parser, TokenKind};
use bspl_types::Action;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

const SHELL_NAME: &str = "X";
const SHELL_KEY: &str = "C";
const SHELL_ROLES: (&str, &str) = ("A", "B");

/// Wire form of a [`Message`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub instance_key: String,
    /// Canonical action text
    pub action: String,
    pub values: Values,
}

/// Wire form of an [`Instance`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceEnvelope {
    /// Full protocol source text
    pub protocol: String,
    pub roles: Roles,
    pub values: Values,
    pub messages: BTreeMap<String, MessageEnvelope>,
}

/// Render an action as the text of one action line
pub fn marshal_action(action: &Action) -> String {
    action.to_string()
}

/// Read a single action line back using the default lexer rules
pub fn unmarshal_action(text: &str) -> InstanceResult<Action> {
    unmarshal_action_with_rules(text, &LexerRules::default())
}

/// Read a single action line back
///
/// The line is wrapped in a throwaway protocol declaring the line's own
/// roles and one key parameter, and parsed structurally under `rules`;
/// the first action of the result is returned.
pub fn unmarshal_action_with_rules(text: &str, rules: &LexerRules) -> InstanceResult<Action> {
    let shell = action_shell(text, rules);
    let protocol = Parser::parse_with_rules(&shell, rules)?;
    protocol
        .actions
        .into_iter()
        .next()
        .ok_or_else(|| InstanceError::MissingAction(text.to_string()))
}

fn action_shell(fragment: &str, rules: &LexerRules) -> String {
    let fragment = fragment.trim();
    let (from, to) = shell_roles(fragment, rules);
    let roles = if from == to {
        from
    } else {
        format!("{}, {}", from, to)
    };

    format!(
        "{} {{\n  role {}\n  parameter out {} key\n\n  {}\n}}\n",
        SHELL_NAME, roles, SHELL_KEY, fragment
    )
}

/// The words in the sender and receiver positions, where readable
fn shell_roles(fragment: &str, rules: &LexerRules) -> (String, String) {
    let mut from = SHELL_ROLES.0.to_string();
    let mut to = SHELL_ROLES.1.to_string();

    let Ok(tokens) = Lexer::new(fragment, rules).tokenize() else {
        return (from, to);
    };
    let tokens = normalize(tokens);

    if let Some(first) = tokens.first().filter(|t| t.kind == TokenKind::Word) {
        from = first.text.clone();
    }
    if let [_, arrow, receiver, ..] = tokens.as_slice() {
        if arrow.kind == TokenKind::Arrow && receiver.kind == TokenKind::Word {
            to = receiver.text.clone();
        }
    }
    (from, to)
}

// ── Messages ─────────────────────────────────────────────────────────

impl From<&Message> for MessageEnvelope {
    fn from(message: &Message) -> Self {
        Self {
            instance_key: message.instance_key().to_string(),
            action: marshal_action(message.action()),
            values: message.values().clone(),
        }
    }
}

impl TryFrom<MessageEnvelope> for Message {
    type Error = InstanceError;

    fn try_from(envelope: MessageEnvelope) -> InstanceResult<Self> {
        message_from_envelope(envelope, &LexerRules::default())
    }
}

fn message_from_envelope(envelope: MessageEnvelope, rules: &LexerRules) -> InstanceResult<Message> {
    let action = unmarshal_action_with_rules(&envelope.action, rules)?;
    Ok(Message::new(envelope.instance_key, action, envelope.values))
}

impl Message {
    pub fn encode(&self) -> InstanceResult<Vec<u8>> {
        let bytes = serde_json::to_vec(&MessageEnvelope::from(self))?;
        tracing::debug!(action = %self.action().name, bytes = bytes.len(), "Encoded message");
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> InstanceResult<Self> {
        Self::decode_with_rules(bytes, &LexerRules::default())
    }

    /// Decode a message whose action was written under custom lexer rules
    pub fn decode_with_rules(bytes: &[u8], rules: &LexerRules) -> InstanceResult<Self> {
        let envelope: MessageEnvelope = serde_json::from_slice(bytes)?;
        let message = message_from_envelope(envelope, rules)?;
        tracing::debug!(action = %message.action().name, "Decoded message");
        Ok(message)
    }
}

// ── Instances ────────────────────────────────────────────────────────

impl From<&Instance> for InstanceEnvelope {
    fn from(instance: &Instance) -> Self {
        Self {
            protocol: instance.protocol().to_string(),
            roles: instance.roles().clone(),
            values: instance.values().clone(),
            messages: instance
                .messages()
                .iter()
                .map(|(key, message)| (key.clone(), MessageEnvelope::from(message)))
                .collect(),
        }
    }
}

impl TryFrom<InstanceEnvelope> for Instance {
    type Error = InstanceError;

    fn try_from(envelope: InstanceEnvelope) -> InstanceResult<Self> {
        instance_from_envelope(envelope, &LexerRules::default())
    }
}

/// Rebuild an instance; value keys must be protocol-level canonical strings
fn instance_from_envelope(envelope: InstanceEnvelope, rules: &LexerRules) -> InstanceResult<Instance> {
    let protocol = compile_with_rules(&envelope.protocol, rules)?;

    let declared: Vec<String> = protocol.params.iter().map(|p| p.to_string()).collect();
    if let Some(key) = envelope.values.keys().find(|key| !declared.contains(key)) {
        return Err(InstanceError::UndeclaredValue(key.clone()));
    }

    let mut messages = Messages::new();
    for wire in envelope.messages.into_values() {
        let message = message_from_envelope(wire, rules)?;
        messages.insert(message.action().to_string(), message);
    }

    Ok(Instance::from_parts(
        Arc::new(protocol),
        envelope.roles,
        envelope.values,
        messages,
    ))
}

impl Instance {
    pub fn encode(&self) -> InstanceResult<Vec<u8>> {
        let bytes = serde_json::to_vec(&InstanceEnvelope::from(self))?;
        tracing::debug!(instance = %self.key(), bytes = bytes.len(), "Encoded instance");
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> InstanceResult<Self> {
        Self::decode_with_rules(bytes, &LexerRules::default())
    }

    /// Decode an instance whose protocol text needs custom lexer rules
    pub fn decode_with_rules(bytes: &[u8], rules: &LexerRules) -> InstanceResult<Self> {
        let envelope: InstanceEnvelope = serde_json::from_slice(bytes)?;
        let instance = instance_from_envelope(envelope, rules)?;
        tracing::debug!(
            instance = %instance.key(),
            messages = instance.messages().len(),
            "Decoded instance"
        );
        Ok(instance)
    }
}
