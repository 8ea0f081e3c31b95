//! Semantic validation errors

/// Reasons a structurally valid protocol is rejected
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Protocol '{0}' declares no key parameters")]
    NoKeyParameters(String),

    #[error("Action '{action}' references unknown role '{role}'")]
    UnknownRole { action: String, role: String },

    #[error("Action '{action}' has no key parameters in common with '{protocol}'")]
    NoKeyOverlap { action: String, protocol: String },

    #[error("Circular dependency at action '{0}'")]
    CircularDependency(String),
}

/// Result type alias for validation
pub type ValidationResult<T> = Result<T, ValidationError>;
