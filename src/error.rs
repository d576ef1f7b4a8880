//! Error types for the Vapor client.

use thiserror::Error;

use crate::value::SemanticType;

/// Errors raised while turning an action and its arguments into a prepared
/// call. These indicate a caller or catalog defect and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// A declared parameter has no argument
    #[error("Action '{token}' requires an argument for '{binding_name}'")]
    MissingArgument { token: String, binding_name: String },

    /// An argument names no declared parameter
    #[error("Action '{token}' has no parameter named '{binding_name}'")]
    UnknownArgument { token: String, binding_name: String },

    /// A validated string could not be converted to its semantic type
    #[error("Cannot convert '{value}' for '{binding_name}' to {semantic_type}: {reason}")]
    Conversion {
        binding_name: String,
        semantic_type: SemanticType,
        value: String,
        reason: String,
    },

    /// The procedure binding string could not be parsed
    #[error("Malformed procedure binding '{binding}': {reason}")]
    MalformedBinding { binding: String, reason: String },

    /// Placeholder count disagrees with the declared parameters
    #[error("Procedure binding '{binding}' has {placeholders} slots, expected {expected}")]
    ArityMismatch {
        binding: String,
        placeholders: usize,
        expected: usize,
    },

    /// A slot index outside `1..=slots`
    #[error("Slot {slot} is out of range for a call with {slots} slots")]
    SlotOutOfRange { slot: usize, slots: usize },
}

/// A call that reached the database and failed there, or could not reach it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ExecutionFailure {
    pub message: String,
    /// The connection can no longer be used
    pub connection_lost: bool,
}

impl ExecutionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        ExecutionFailure {
            message: message.into(),
            connection_lost: false,
        }
    }

    pub fn connection_lost(message: impl Into<String>) -> Self {
        ExecutionFailure {
            message: message.into(),
            connection_lost: true,
        }
    }
}

/// Configuration could not be loaded, or the configured database could not
/// be reached
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Figment failed to read or extract the configuration
    #[error("Configuration error: {0}")]
    Load(#[from] Box<figment::Error>),

    /// An explicitly requested configuration file does not exist
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// A required key is absent or empty
    #[error("Missing required configuration value '{0}'")]
    MissingField(&'static str),

    /// A key has an unusable value
    #[error("Invalid configuration value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    /// The database refused or did not answer the connection attempt
    #[error("Connection to {address} failed: {reason}")]
    Connect { address: String, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Load(Box::new(err))
    }
}

/// Umbrella error for binaries and front-end plumbing
#[derive(Error, Debug)]
pub enum VaporError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Execution(#[from] ExecutionFailure),

    #[error(transparent)]
    Catalog(#[from] crate::action::CatalogError),

    #[error(transparent)]
    Console(#[from] crate::console::ConsoleError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for fallible front-end operations
pub type VaporResult<T> = Result<T, VaporError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_error_messages() {
        let err = BindingError::MissingArgument {
            token: "fu".to_string(),
            binding_name: "followed_id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Action 'fu' requires an argument for 'followed_id'"
        );

        let err = BindingError::Conversion {
            binding_name: "price".to_string(),
            semantic_type: SemanticType::Money,
            value: "abc".to_string(),
            reason: "invalid decimal".to_string(),
        };
        assert!(err.to_string().contains("to money"));
    }

    #[test]
    fn test_execution_failure_constructors() {
        let failure = ExecutionFailure::new("duplicate follow");
        assert_eq!(failure.to_string(), "duplicate follow");
        assert!(!failure.connection_lost);

        let lost = ExecutionFailure::connection_lost("socket closed");
        assert!(lost.connection_lost);
    }

    #[test]
    fn test_vapor_error_from_conversions() {
        let err: VaporError = ConfigError::MissingField("database.username").into();
        assert!(matches!(err, VaporError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Missing required configuration value 'database.username'"
        );

        let err: VaporError = ExecutionFailure::new("boom").into();
        assert_eq!(err.to_string(), "boom");
    }
}
