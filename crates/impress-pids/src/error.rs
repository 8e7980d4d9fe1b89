//! Error types for impress-pids

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pid::PidStatus;
use crate::store::StoreError;

/// Result type alias for PID operations
pub type Result<T> = std::result::Result<T, PidError>;

/// A field-scoped validation problem, e.g. `pids.doi` with its messages.
///
/// Validators append these to a shared list instead of failing, so a caller
/// always sees every problem of a request at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub messages: Vec<String>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            messages: vec![message.into()],
        }
    }

    pub fn with_messages(field: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            field: field.into(),
            messages,
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.messages.join(" "))
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Main error type for PID operations
///
/// Configuration-class errors (`SchemeNotSupported`, `ProviderNotSupported`,
/// `Configuration`) indicate a deployment defect. `Validation` always carries
/// the complete list of field errors.
#[derive(Error, Debug)]
pub enum PidError {
    /// One or more schemes are not configured
    #[error("PID scheme(s) not supported: {}", .0.join(", "))]
    SchemeNotSupported(Vec<String>),

    /// The named provider is not configured for the scheme
    #[error("Provider '{provider}' is not supported for PID scheme '{scheme}'")]
    ProviderNotSupported { scheme: String, provider: String },

    /// No PID row exists for the identifier
    #[error("PID does not exist: {scheme}:{identifier}")]
    DoesNotExist { scheme: String, identifier: String },

    /// The identifier is already taken
    #[error("PID already exists: {scheme}:{identifier}")]
    AlreadyExists { scheme: String, identifier: String },

    /// Status change not allowed by the PID state machine
    #[error("Invalid status transition for {identifier} from {from} to {to}")]
    InvalidTransition {
        identifier: String,
        from: PidStatus,
        to: PidStatus,
    },

    /// Aggregate validation failure
    #[error("Validation failed: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// Provider or manager misconfiguration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failure building a registry document
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Local PID store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl PidError {
    /// A validation error with a single field entry
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        PidError::Validation(vec![FieldError::new(field, message)])
    }

    /// Whether the error points at a configuration defect rather than input
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PidError::SchemeNotSupported(_)
                | PidError::ProviderNotSupported { .. }
                | PidError::Configuration(_)
        )
    }

    /// The field errors carried by a validation error (empty otherwise)
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            PidError::Validation(errors) => errors,
            _ => &[],
        }
    }
}
