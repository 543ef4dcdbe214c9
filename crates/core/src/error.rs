//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Local failures raised before any request leaves the client, such as a
/// missing form field or a stock change that would go negative. Transport
/// failures are [`TransportError`](crate::TransportError).
///
/// The `Display` output is the message shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (missing field, malformed number, value
    /// outside the current option set).
    #[error("{0}")]
    Validation(String),

    /// A domain invariant would be violated (e.g. negative stock).
    #[error("{0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The referenced record is not in the local collection.
    #[error("not found")]
    NotFound,

    /// The operation collides with one already in flight.
    #[error("{0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Shorthand for the "X must be filled" family of form errors.
    pub fn required(field: &str) -> Self {
        Self::Validation(format!("{field} must be filled"))
    }
}
