//! Client configuration from the environment.

use std::time::Duration;

use anyhow::{bail, Context};

use schoolops_auth::EmailPolicy;

pub const API_URL_ENV: &str = "SCHOOLOPS_API_URL";
pub const HTTP_TIMEOUT_ENV: &str = "SCHOOLOPS_HTTP_TIMEOUT_SECS";
pub const EMAIL_DOMAIN_ENV: &str = "SCHOOLOPS_EMAIL_DOMAIN";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the service of record, without a trailing slash.
    pub api_url: String,
    pub request_timeout: Duration,
    pub email_policy: EmailPolicy,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            email_policy: EmailPolicy::any(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset or blank keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = match get(API_URL_ENV) {
            Some(url) => url,
            None => {
                tracing::warn!(default = DEFAULT_API_URL, "{API_URL_ENV} not set, using default");
                DEFAULT_API_URL.to_string()
            }
        };
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            bail!("{API_URL_ENV} must be an http(s) URL, got {api_url:?}");
        }

        let request_timeout = match get(HTTP_TIMEOUT_ENV) {
            Some(raw) => {
                let secs: u64 = raw.parse().with_context(|| {
                    format!("{HTTP_TIMEOUT_ENV} must be a whole number of seconds, got {raw:?}")
                })?;
                if secs == 0 {
                    bail!("{HTTP_TIMEOUT_ENV} must be greater than zero");
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        let email_policy = get(EMAIL_DOMAIN_ENV)
            .map(EmailPolicy::company)
            .unwrap_or_default();

        Ok(Self {
            request_timeout,
            email_policy,
            ..Self::new(api_url)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.email_policy, EmailPolicy::any());
    }

    #[test]
    fn reads_every_key() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL_ENV, "https://ops.example.com/api/"),
            (HTTP_TIMEOUT_ENV, "30"),
            (EMAIL_DOMAIN_ENV, "@example.com"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://ops.example.com/api");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.email_policy, EmailPolicy::company("example.com"));
    }

    #[test]
    fn rejects_bad_values() {
        let err = ClientConfig::from_lookup(lookup(&[(HTTP_TIMEOUT_ENV, "soon")])).unwrap_err();
        assert!(err.to_string().contains(HTTP_TIMEOUT_ENV));
        assert!(ClientConfig::from_lookup(lookup(&[(HTTP_TIMEOUT_ENV, "0")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[(API_URL_ENV, "ftp://x")])).is_err());
    }
}
