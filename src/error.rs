//! Error types for the savings engine.

use crate::models::ProgressionType;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, SavingsError>;

/// Failures raised while talking to the persistence gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// HTTP transport failed.
    #[cfg(any(feature = "async", feature = "blocking"))]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The requested entity does not exist on the backend.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind (`goal`, `installment`, `deposit`).
        entity: &'static str,
        /// Identifier that was looked up.
        id: i64,
    },

    /// The backend failed internally.
    #[error("backend failure: {0}")]
    Backend(String),

    /// The client is misconfigured (missing token, bad URL).
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// All errors that can occur when using the savings engine.
#[derive(Debug, thiserror::Error)]
pub enum SavingsError {
    /// An argument is outside the accepted domain (unknown enum id,
    /// zero installments, negative amount, overflow).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A parameter required by the progression type is absent.
    #[error("{progression} progression requires {parameter}")]
    MissingParameter {
        /// Progression type that needs the parameter.
        progression: ProgressionType,
        /// Human-readable parameter name.
        parameter: &'static str,
    },

    /// The operation is not defined for the given input.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A goal-store rule was violated before anything was submitted.
    #[error("{0}")]
    DomainValidation(String),

    /// Transport or backend failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl SavingsError {
    /// Short message suitable for the store's `error` field.
    #[must_use]
    #[allow(
        clippy::ref_patterns,
        reason = "borrows the API message out of a dereferenced match"
    )]
    pub fn user_message(&self) -> String {
        match *self {
            Self::Gateway(GatewayError::Api {
                status,
                ref message,
            }) => {
                if message.trim().is_empty() {
                    format!("request failed with status {status}")
                } else {
                    message.trim().to_owned()
                }
            }
            Self::Gateway(GatewayError::NotFound { entity, id }) => {
                format!("{entity} {id} was not found")
            }
            Self::Gateway(_) => "the savings service is unavailable".to_owned(),
            Self::InvalidArgument(_)
            | Self::MissingParameter { .. }
            | Self::UnsupportedOperation(_)
            | Self::DomainValidation(_) => self.to_string(),
        }
    }

    /// Returns `true` for failures that happened before reaching the
    /// gateway.
    #[inline]
    #[must_use]
    pub const fn is_client_side(&self) -> bool {
        !matches!(*self, Self::Gateway(_))
    }
}

#[cfg(any(feature = "async", feature = "blocking"))]
impl From<reqwest::Error> for SavingsError {
    #[inline]
    fn from(err: reqwest::Error) -> Self {
        Self::Gateway(GatewayError::Http(err))
    }
}

impl From<serde_json::Error> for SavingsError {
    #[inline]
    fn from(err: serde_json::Error) -> Self {
        Self::Gateway(GatewayError::Serialization(err))
    }
}
