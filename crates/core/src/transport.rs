//! Failures reported by the remote service of record.

use thiserror::Error;

/// A request left the client and did not come back with an acknowledgment.
///
/// Every service port in the workspace returns this error. Adapters map their
/// own failures onto it (HTTP client errors, non-2xx statuses, bodies that do
/// not match the expected schema, `success: false` envelopes).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Parse(String),

    /// The server answered `success: false`; carries its message.
    #[error("{0}")]
    Rejected(String),
}

impl TransportError {
    pub fn rejected(message: Option<String>, fallback: &str) -> Self {
        Self::Rejected(
            message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        )
    }
}
