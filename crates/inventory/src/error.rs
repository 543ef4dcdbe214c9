use thiserror::Error;

use schoolops_core::{DomainError, TransportError};

/// Failure of a ledger operation. `Display` is the message shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("Inventory update failed: {0}")]
    Transport(#[from] TransportError),
}
