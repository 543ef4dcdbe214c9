use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role attached to an account by the backend.
///
/// Roles are opaque strings on the wire. Only `admin` carries meaning on the
/// client: it unlocks the dashboard. Everything else lands on the form page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: &'static str = "admin";
    pub const USER: &'static str = "user";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn admin() -> Self {
        Self(Cow::Borrowed(Self::ADMIN))
    }

    pub fn user() -> Self {
        Self(Cow::Borrowed(Self::USER))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.as_str().eq_ignore_ascii_case(Self::ADMIN)
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::user()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
