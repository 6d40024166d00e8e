//! Common type definitions for Zesec.
//!
//! - [`Operation`]: encryption or decryption
//! - [`EncryptionResult`]: immutable outcome of one engine call
//! - [`Hooks`]: progress callback and cancellation token handed to long calls
//! - [`CleanOperation`] / [`WipeOutcome`]: secure-erase request and per-file result

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use strum::Display as StrumDisplay;

use crate::error::{Error, Result};

/// The direction of an engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
pub enum Operation {
    Encrypt,
    Decrypt,
}

/// Outcome of one `encrypt` or `decrypt` call.
///
/// On failure `output_path` is normally `None`. The exception is a failed
/// clean-after-encrypt: the container was written and `output_path` names it,
/// while `error` carries the wipe failure.
#[derive(Debug)]
pub struct EncryptionResult {
    pub operation: Operation,
    pub success: bool,
    pub output_path: Option<PathBuf>,
    pub bytes_processed: u64,
    pub error: Option<Error>,
}

impl EncryptionResult {
    pub fn ok(operation: Operation, output_path: PathBuf, bytes_processed: u64) -> Self {
        Self { operation, success: true, output_path: Some(output_path), bytes_processed, error: None }
    }

    pub fn err(operation: Operation, error: Error) -> Self {
        Self { operation, success: false, output_path: None, bytes_processed: 0, error: Some(error) }
    }

    /// Converts into a plain `Result`, dropping the bookkeeping fields on failure.
    ///
    /// # Errors
    ///
    /// Returns the recorded error when the call did not succeed.
    pub fn into_result(self) -> Result<Self> {
        match self.error {
            None if self.success => Ok(self),
            Some(error) => Err(error),
            None => Err(Error::EncryptionFailure("unsuccessful result without error".to_owned())),
        }
    }
}

impl Display for EncryptionResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.error, &self.output_path) {
            (None, Some(path)) => write!(f, "{} successful: {}", self.operation, path.display()),
            (Some(error), _) => write!(f, "{} failed: {error}", self.operation),
            (None, None) => write!(f, "{} failed", self.operation),
        }
    }
}

/// Which stage a [`Progress`] report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
pub enum Phase {
    Encrypting,
    Decrypting,
    Wiping,
}

/// Bytes processed so far against the expected total for the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub phase: Phase,
    pub processed: u64,
    pub total: u64,
}

/// Cooperative cancellation flag shared between a worker and its caller.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Optional progress callback and cancellation token for one call.
///
/// Both are checked between chunks and between passes, never mid-write.
#[derive(Clone, Copy, Default)]
pub struct Hooks<'a> {
    progress: Option<&'a dyn Fn(Progress)>,
    cancel: Option<&'a Cancellation>,
}

impl<'a> Hooks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn Fn(Progress)) -> Self {
        self.progress = Some(progress);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: &'a Cancellation) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[inline]
    pub fn report(&self, phase: Phase, processed: u64, total: u64) {
        if let Some(progress) = self.progress {
            progress(Progress { phase, processed, total });
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] once the token has been triggered.
    #[inline]
    pub fn checkpoint(&self) -> Result<()> {
        match self.cancel {
            Some(cancel) if cancel.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

/// A single secure-erase request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanOperation {
    pub target_path: PathBuf,
    pub pass_count: u32,
    pub delete_after: bool,
}

impl CleanOperation {
    pub fn new(target_path: impl Into<PathBuf>, pass_count: u32, delete_after: bool) -> Self {
        Self { target_path: target_path.into(), pass_count, delete_after }
    }
}

/// Result for one entry visited by a directory wipe.
#[derive(Debug)]
pub struct WipeOutcome {
    pub path: PathBuf,
    pub result: Result<()>,
}

impl WipeOutcome {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_result_display() {
        let ok = EncryptionResult::ok(Operation::Encrypt, PathBuf::from("a.txt.zesec"), 3);
        assert_eq!(ok.to_string(), "Encrypt successful: a.txt.zesec");

        let failed = EncryptionResult::err(Operation::Decrypt, Error::Authentication);
        assert!(failed.to_string().starts_with("Decrypt failed: authentication failed"));
        assert!(failed.into_result().unwrap_err().is_authentication());
    }

    #[test]
    fn test_hooks_report_and_cancel() {
        let seen = Cell::new(0u64);
        let record = |p: Progress| seen.set(p.processed);
        let cancel = Cancellation::new();
        let hooks = Hooks::new().with_progress(&record).with_cancel(&cancel);

        hooks.report(Phase::Wiping, 42, 100);
        assert_eq!(seen.get(), 42);
        assert!(hooks.checkpoint().is_ok());

        cancel.clone().cancel();
        assert!(matches!(hooks.checkpoint(), Err(Error::Cancelled)));
    }

    #[test]
    fn test_empty_hooks_are_inert() {
        let hooks = Hooks::new();
        hooks.report(Phase::Encrypting, 1, 1);
        assert!(hooks.checkpoint().is_ok());
    }
}
