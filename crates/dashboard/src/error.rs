use thiserror::Error;

use schoolops_auth::AuthzError;
use schoolops_core::{DomainError, TransportError};
use schoolops_inventory::LedgerError;

/// Failure of a dashboard operation. `Display` is the message shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DashboardError {
    #[error(transparent)]
    Unauthorized(#[from] AuthzError),

    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("Request failed: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Inventory(#[from] LedgerError),
}
