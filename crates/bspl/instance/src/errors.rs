//! Instance engine error types

use bspl_parser::BsplError;

/// Errors raised while reconciling, recording or transporting instances
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    #[error("Conflicting values for '{parameter}': '{current}' and '{incoming}'")]
    ValueConflict {
        parameter: String,
        current: String,
        incoming: String,
    },

    #[error("No action produces exactly the parameters {0:?}")]
    UnmatchedDiff(Vec<String>),

    #[error("A message is already recorded for action '{0}'")]
    DuplicateMessage(String),

    #[error("Protocol '{protocol}' declares no parameter '{name}'")]
    UnknownParameter { protocol: String, name: String },

    #[error("Instances of different protocols: '{expected}' and '{found}'")]
    ProtocolMismatch { expected: String, found: String },

    #[error("Envelope error: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error(transparent)]
    Protocol(#[from] BsplError),

    #[error("No action could be read from '{0}'")]
    MissingAction(String),

    #[error("Value key '{0}' does not name a declared parameter")]
    UndeclaredValue(String),
}

/// Result type alias for instance operations
pub type InstanceResult<T> = Result<T, InstanceError>;
