//! Confirmation seam for destructive actions.

/// Asks the person at the screen whether a destructive action should proceed.
///
/// The presentation shell owns the dialog. The core only needs a yes/no
/// answer before it issues a delete.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Result of a delete that first asks for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The server acknowledged the delete and the record left the cache.
    Deleted,
    /// The user said no; nothing was sent.
    Declined,
}

/// Always answers yes. For batch tooling and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}
