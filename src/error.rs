//! Error types for the ranked match coordinator
//!
//! Domain operations return [`RankedError`]; the binary and configuration
//! layers wrap these in `anyhow` at the edges.

/// Result type alias for domain operations
pub type Result<T> = std::result::Result<T, RankedError>;

/// Machine-usable classification of a [`RankedError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    ConfigurationError,
    ExternalCallFailure,
    InvalidInput,
    Storage,
    Internal,
}

/// Custom error types for specific ranked match scenarios
#[derive(Debug, thiserror::Error)]
pub enum RankedError {
    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("External call failed during {operation}: {message}")]
    ExternalCallFailure { operation: String, message: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal service error: {message}")]
    Internal { message: String },
}

impl RankedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RankedError::NotFound { .. } => ErrorKind::NotFound,
            RankedError::Forbidden { .. } => ErrorKind::Forbidden,
            RankedError::ConfigurationError { .. } => ErrorKind::ConfigurationError,
            RankedError::ExternalCallFailure { .. } => ErrorKind::ExternalCallFailure,
            RankedError::InvalidInput { .. } => ErrorKind::InvalidInput,
            RankedError::Storage { .. } => ErrorKind::Storage,
            RankedError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        RankedError::NotFound { what: what.into() }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        RankedError::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn external(operation: impl Into<String>, message: impl std::fmt::Display) -> Self {
        RankedError::ExternalCallFailure {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Errors the requester caused or can fix; these never mutate state.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound
                | ErrorKind::Forbidden
                | ErrorKind::ConfigurationError
                | ErrorKind::InvalidInput
        )
    }

    /// Text shown to the requester, `None` for errors that only get logged
    pub fn user_message(&self) -> Option<&str> {
        match self {
            RankedError::NotFound { what } => Some(what.as_str()),
            RankedError::Forbidden { reason } => Some(reason.as_str()),
            RankedError::ConfigurationError { message } => Some(message.as_str()),
            RankedError::InvalidInput { reason } => Some(reason.as_str()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RankedError {
    fn from(err: serde_json::Error) -> Self {
        RankedError::Storage {
            message: format!("JSON (de)serialization failed: {}", err),
        }
    }
}

impl From<std::io::Error> for RankedError {
    fn from(err: std::io::Error) -> Self {
        RankedError::Storage {
            message: err.to_string(),
        }
    }
}
