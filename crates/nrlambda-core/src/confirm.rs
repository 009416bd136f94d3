//! Confirmation capability for destructive steps
//!
//! The uninstall workflow asks before each destructive tier. The question is
//! answered by whatever [`Confirm`] implementation the caller injects: a
//! terminal prompt in the CLI, a fixed answer in tests or `--force` runs.

use crate::error::Result;

/// Answers yes/no questions put to the user
pub trait Confirm: Send + Sync {
    /// Ask `prompt`; `Ok(true)` means proceed
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Approves every prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysApprove;

impl Confirm for AlwaysApprove {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Declines every prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDecline;

impl Confirm for AlwaysDecline {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> Result<bool> {
        Ok(self(prompt))
    }
}
