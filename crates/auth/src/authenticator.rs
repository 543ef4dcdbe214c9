//! Seam to the backend's authentication endpoints.

use async_trait::async_trait;

use crate::{AuthError, Credentials, Role};

/// What the backend hands back for a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGrant {
    pub email: String,
    pub role: Role,
}

/// Authentication collaborator.
///
/// The protocol behind it (passwords, tokens, reset emails) belongs to the
/// backend. Implementations map their transport failures onto
/// [`AuthError::Transport`] and a refused login onto
/// [`AuthError::InvalidCredentials`].
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, AuthError>;

    /// Display name for a signed-in user, `None` if the account has none.
    async fn display_name(&self, email: &str) -> Result<Option<String>, AuthError>;

    /// Ask the backend to email a reset link. Returns the server's message.
    async fn request_password_reset(&self, email: &str) -> Result<String, AuthError>;

    /// Redeem a reset token. Returns the server's message.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<String, AuthError>;
}
