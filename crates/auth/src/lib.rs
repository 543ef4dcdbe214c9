//! `schoolops-auth` — session identity and access boundary.
//!
//! This crate is intentionally decoupled from HTTP. The backend is reached
//! through the [`Authenticator`] trait, implemented by `schoolops-client`.

pub mod authenticator;
pub mod authorize;
pub mod credentials;
pub mod error;
pub mod roles;
pub mod session;

pub use authenticator::{Authenticator, LoginGrant};
pub use authorize::{require_admin, AuthzError};
pub use credentials::{Credentials, EmailPolicy};
pub use error::AuthError;
pub use roles::Role;
pub use session::{
    reset_password, request_password_reset, Session, SessionContext, SessionId,
    FALLBACK_DISPLAY_NAME,
};
