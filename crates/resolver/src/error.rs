use thiserror::Error;

use schoolops_core::{DomainError, TransportError};

/// Failure of a form operation. `Display` is the message shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// The workbook lookup came back empty, so there is nothing to pick.
    #[error("No workbook is configured for grade {grade} at {school} ({location}); contact an administrator")]
    NoWorkbookConfigured {
        grade: String,
        school: String,
        location: String,
    },

    #[error("Error submitting: {0}")]
    Transport(#[from] TransportError),
}
