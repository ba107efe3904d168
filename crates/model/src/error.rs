//! Error types for model operations
use http::StatusCode;
use tessera_validator::{ErrorReport, PathError, SchemaError};
use thiserror::Error;

use crate::transport::Action;

/// Boxed error produced by an HTTP collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Everything that can go wrong while building or driving a model.
///
/// Configuration problems (`Schema`, `ReservedAttribute`, `InvalidHeader`,
/// `Options`) surface at build or registration time. Failed validation is
/// only an error when a save was blocked by `validateBeforeSave`.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The validation schema could not be compiled
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// An attribute path cannot be written
    #[error(transparent)]
    Path(#[from] PathError),

    /// An attribute name collides with the model's own API surface
    #[error("attribute `{0}` collides with a reserved name")]
    ReservedAttribute(String),

    /// A configured header is not a valid HTTP header
    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader {
        /// Header name as configured
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// Model options could not be deserialized
    #[error("invalid model options: {0}")]
    Options(#[source] serde_json::Error),

    /// No URL template is configured for an action
    #[error("no URL configured for `{action}`")]
    MissingUrl {
        /// The action that was attempted
        action: Action,
    },

    /// Validation failed and the request was not sent
    #[error("validation failed for {} attribute(s)", .0.failing().count())]
    Invalid(ErrorReport),

    /// The HTTP collaborator failed; the source is its own error, untouched
    #[error("{source}")]
    Transport {
        /// The collaborator's error
        #[source]
        source: BoxError,
    },

    /// The response body cannot be assigned to the model
    #[error("unexpected response body ({status}): {reason}")]
    MalformedResponse {
        /// Response status
        status: StatusCode,
        /// What was wrong with the body
        reason: String,
    },
}

impl ModelError {
    /// Whether this error came from the HTTP collaborator.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// The validation report of a blocked save.
    pub fn report(&self) -> Option<&ErrorReport> {
        match self {
            Self::Invalid(report) => Some(report),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error::Error as _;

    #[derive(Debug, Error)]
    #[error("connection reset")]
    struct Reset;

    #[test]
    fn transport_error_is_passed_through() {
        let err = ModelError::Transport {
            source: Box::new(Reset),
        };
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "connection reset");
        assert!(err.source().is_some_and(|s| s.is::<Reset>()));
    }

    #[test]
    fn schema_errors_convert() {
        let err: ModelError = SchemaError::UnknownRule {
            rule: "bogus".into(),
        }
        .into();
        assert_eq!(err.to_string(), "unknown validation rule `bogus`");
    }
}
