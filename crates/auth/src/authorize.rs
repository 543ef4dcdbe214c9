use thiserror::Error;

use crate::Session;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("not signed in")]
    NotSignedIn,

    #[error("forbidden: requires role '{0}'")]
    Forbidden(String),
}

/// Gate for the admin dashboard.
///
/// - No IO
/// - No panics
pub fn require_admin(session: &Session) -> Result<(), AuthzError> {
    if session.role().is_admin() {
        Ok(())
    } else {
        tracing::warn!(email = %session.email(), role = %session.role(), "dashboard access denied");
        Err(AuthzError::Forbidden(crate::Role::ADMIN.to_string()))
    }
}
