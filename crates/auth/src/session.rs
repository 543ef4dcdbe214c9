//! Signed-in identity and its lifecycle.
//!
//! A [`Session`] is created by a successful login and dropped by logout.
//! Components that need the submitter's identity or role take a `&Session`
//! argument instead of reading it from ambient storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authenticator::Authenticator;
use crate::authorize::AuthzError;
use crate::{AuthError, Credentials, EmailPolicy, Role};

/// Greeting used when the backend has no display name for the account.
pub const FALLBACK_DISPLAY_NAME: &str = "User";

/// Client-side identifier of one login, used to correlate log lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    email: String,
    role: Role,
    display_name: String,
    started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(email: impl Into<String>, role: Role, display_name: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            email: email.into(),
            role,
            display_name: display_name.into(),
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Identity recorded as `submitted_by` on form submissions.
    pub fn submitter(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Holds the current session, if any.
///
/// Populated by [`SessionContext::login`], cleared by
/// [`SessionContext::logout`].
#[derive(Debug, Default)]
pub struct SessionContext {
    policy: EmailPolicy,
    current: Option<Session>,
}

impl SessionContext {
    pub fn new(policy: EmailPolicy) -> Self {
        Self {
            policy,
            current: None,
        }
    }

    pub fn policy(&self) -> &EmailPolicy {
        &self.policy
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn require(&self) -> Result<&Session, AuthzError> {
        self.current.as_ref().ok_or(AuthzError::NotSignedIn)
    }

    /// Validate locally, authenticate, then resolve the greeting name.
    ///
    /// Any previous session is replaced only once the new login succeeds.
    pub async fn login<A>(
        &mut self,
        authenticator: &A,
        credentials: Credentials,
    ) -> Result<&Session, AuthError>
    where
        A: Authenticator + ?Sized,
    {
        credentials.validate(&self.policy)?;

        let grant = authenticator.login(&credentials).await.inspect_err(|err| {
            tracing::warn!(email = %credentials.email, error = %err, "login failed");
        })?;

        let display_name = match authenticator.display_name(&grant.email).await {
            Ok(Some(name)) if !name.trim().is_empty() => name,
            Ok(_) => FALLBACK_DISPLAY_NAME.to_string(),
            Err(err) => {
                tracing::warn!(email = %grant.email, error = %err, "display name lookup failed");
                FALLBACK_DISPLAY_NAME.to_string()
            }
        };

        let session = Session::new(grant.email, grant.role, display_name);
        tracing::info!(
            session_id = %session.id(),
            email = %session.email(),
            role = %session.role(),
            "signed in"
        );
        Ok(&*self.current.insert(session))
    }

    /// Drop the current session. Returns it so callers can tear down views
    /// that were opened under it.
    pub fn logout(&mut self) -> Option<Session> {
        let previous = self.current.take();
        if let Some(session) = &previous {
            tracing::info!(session_id = %session.id(), email = %session.email(), "signed out");
        }
        previous
    }
}

/// "Forgot password" flow: validate the address, then ask the backend.
pub async fn request_password_reset<A>(
    authenticator: &A,
    policy: &EmailPolicy,
    email: &str,
) -> Result<String, AuthError>
where
    A: Authenticator + ?Sized,
{
    policy.check(email)?;
    authenticator.request_password_reset(email.trim()).await
}

/// Redeem a reset token from the emailed link.
pub async fn reset_password<A>(
    authenticator: &A,
    token: &str,
    new_password: &str,
) -> Result<String, AuthError>
where
    A: Authenticator + ?Sized,
{
    if token.trim().is_empty() {
        return Err(schoolops_core::DomainError::validation("Reset link is missing its token").into());
    }
    if new_password.is_empty() {
        return Err(schoolops_core::DomainError::required("New password").into());
    }
    authenticator.reset_password(token.trim(), new_password).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorize::require_admin;
    use crate::LoginGrant;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeAuth {
        name: Option<String>,
        fail_name_lookup: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Authenticator for FakeAuth {
        async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, AuthError> {
            self.calls.lock().unwrap().push(format!("login:{}", credentials.email));
            match credentials.password.as_str() {
                "admin-pw" => Ok(LoginGrant { email: credentials.email.clone(), role: Role::admin() }),
                "user-pw" => Ok(LoginGrant { email: credentials.email.clone(), role: Role::user() }),
                _ => Err(AuthError::InvalidCredentials),
            }
        }

        async fn display_name(&self, _email: &str) -> Result<Option<String>, AuthError> {
            if self.fail_name_lookup {
                return Err(AuthError::Transport("timeout".into()));
            }
            Ok(self.name.clone())
        }

        async fn request_password_reset(&self, email: &str) -> Result<String, AuthError> {
            self.calls.lock().unwrap().push(format!("reset:{email}"));
            Ok("If the email exists, a reset link will be sent.".into())
        }

        async fn reset_password(&self, token: &str, _new_password: &str) -> Result<String, AuthError> {
            if token == "expired" {
                Err(AuthError::Rejected("Token expired".into()))
            } else {
                Ok("Password reset successful".into())
            }
        }
    }

    #[tokio::test]
    async fn login_populates_and_logout_clears() {
        let auth = FakeAuth { name: Some("Ana".into()), ..Default::default() };
        let mut ctx = SessionContext::new(EmailPolicy::company("school.org"));

        let session = ctx
            .login(&auth, Credentials::new("ana@school.org", "user-pw"))
            .await
            .unwrap();
        assert_eq!(session.submitter(), "ana@school.org");
        assert_eq!(session.display_name(), "Ana");
        assert!(!session.is_admin());

        let dropped = ctx.logout().unwrap();
        assert_eq!(dropped.email(), "ana@school.org");
        assert!(ctx.current().is_none());
        assert_eq!(ctx.require().unwrap_err(), AuthzError::NotSignedIn);
    }

    #[tokio::test]
    async fn local_validation_runs_before_the_backend() {
        let auth = FakeAuth::default();
        let mut ctx = SessionContext::new(EmailPolicy::company("school.org"));

        let err = ctx
            .login(&auth, Credentials::new("ana@gmail.com", "user-pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert!(auth.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_login_keeps_previous_session() {
        let auth = FakeAuth::default();
        let mut ctx = SessionContext::new(EmailPolicy::any());
        ctx.login(&auth, Credentials::new("boss@school.org", "admin-pw"))
            .await
            .unwrap();

        let err = ctx
            .login(&auth, Credentials::new("boss@school.org", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(ctx.current().unwrap().email(), "boss@school.org");
    }

    #[tokio::test]
    async fn display_name_falls_back_to_user() {
        let auth = FakeAuth { fail_name_lookup: true, ..Default::default() };
        let mut ctx = SessionContext::new(EmailPolicy::any());
        let session = ctx
            .login(&auth, Credentials::new("boss@school.org", "admin-pw"))
            .await
            .unwrap();
        assert_eq!(session.display_name(), FALLBACK_DISPLAY_NAME);
        assert!(require_admin(session).is_ok());
    }

    #[test]
    fn non_admin_is_denied_the_dashboard() {
        let session = Session::new("ana@school.org", Role::user(), "Ana");
        assert_eq!(
            require_admin(&session).unwrap_err(),
            AuthzError::Forbidden("admin".into())
        );
    }

    #[tokio::test]
    async fn password_reset_flows_validate_locally() {
        let auth = FakeAuth::default();
        let policy = EmailPolicy::company("school.org");

        let err = request_password_reset(&auth, &policy, "x@gmail.com").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a @school.org email");

        let msg = request_password_reset(&auth, &policy, " ana@school.org ").await.unwrap();
        assert!(msg.contains("reset link"));
        assert_eq!(auth.calls.lock().unwrap().as_slice(), ["reset:ana@school.org"]);

        assert!(matches!(
            reset_password(&auth, "", "pw").await,
            Err(AuthError::Validation(_))
        ));
        assert_eq!(
            reset_password(&auth, "expired", "pw").await.unwrap_err(),
            AuthError::Rejected("Token expired".into())
        );
        assert_eq!(
            reset_password(&auth, "tok", "pw").await.unwrap(),
            "Password reset successful"
        );
    }
}
