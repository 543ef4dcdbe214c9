//! Login input and the company email policy.

use serde::{Deserialize, Serialize};

use schoolops_core::DomainError;

/// Which email addresses may sign in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailPolicy {
    /// Company domain without the `@`, e.g. `example.com`. `None` allows any.
    pub required_domain: Option<String>,
}

impl EmailPolicy {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn company(domain: impl Into<String>) -> Self {
        let domain: String = domain.into();
        Self {
            required_domain: Some(domain.trim_start_matches('@').to_string()),
        }
    }

    pub fn check(&self, email: &str) -> Result<(), DomainError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(DomainError::required("Email"));
        }
        if !email.contains('@') {
            return Err(DomainError::validation(format!("'{email}' is not an email address")));
        }
        match &self.required_domain {
            Some(domain) if !email.ends_with(&format!("@{domain}")) => Err(
                DomainError::validation(format!("Please enter a @{domain} email")),
            ),
            _ => Ok(()),
        }
    }
}

/// Email + password pair as typed on the login page.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    pub fn validate(&self, policy: &EmailPolicy) -> Result<(), DomainError> {
        policy.check(&self.email)?;
        if self.password.is_empty() {
            return Err(DomainError::required("Password"));
        }
        Ok(())
    }
}

// Keep the password out of logs.
impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_policy_rejects_foreign_domains() {
        let policy = EmailPolicy::company("@school.org");
        assert!(policy.check("ana@school.org").is_ok());
        assert_eq!(
            policy.check("ana@gmail.com").unwrap_err(),
            DomainError::validation("Please enter a @school.org email")
        );
        assert_eq!(policy.check("  ").unwrap_err(), DomainError::required("Email"));
    }

    #[test]
    fn open_policy_still_requires_an_address() {
        let policy = EmailPolicy::any();
        assert!(policy.check("ops@anywhere.io").is_ok());
        assert!(policy.check("not-an-email").is_err());
    }

    #[test]
    fn password_is_required_and_redacted() {
        let creds = Credentials::new(" ana@school.org ", "");
        assert_eq!(creds.email, "ana@school.org");
        assert_eq!(
            creds.validate(&EmailPolicy::any()).unwrap_err(),
            DomainError::required("Password")
        );

        let creds = Credentials::new("ana@school.org", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
