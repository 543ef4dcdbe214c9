use thiserror::Error;

use schoolops_core::DomainError;

/// Failure of a login, logout or password-reset flow.
///
/// The `Display` output is what the login page shows.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The server answered but refused the request (e.g. expired reset token).
    #[error("{0}")]
    Rejected(String),

    #[error("Error contacting server: {0}")]
    Transport(String),
}
