//! Zesec - password-protected file encryption with secure erase.
//!
//! - ChaCha20-Poly1305 (RFC 8439) with a single tag per file, streamed in bounded chunks
//! - PBKDF2-HMAC-SHA256 key stretching, optionally mixed with a key file through HKDF-SHA256
//! - Atomic, fsync'd output: a destination file only appears once it is complete
//! - Multi-pass random overwrite before deletion
//!
//! The functions at the crate root are the caller-facing surface. Each takes
//! an explicit [`Config`] and a [`Hooks`] value for progress and
//! cancellation; nothing is read from the environment.

pub mod cipher;
pub mod config;
pub mod eraser;
pub mod error;
pub mod file;
pub mod header;
pub mod keyfile;
pub mod processor;
pub mod secret;
pub mod types;

use std::path::Path;

pub use crate::config::Config;
pub use crate::eraser::Eraser;
pub use crate::error::{Error, Result};
pub use crate::header::Header;
pub use crate::keyfile::KeyFile;
pub use crate::processor::Processor;
pub use crate::secret::{KeyMaterial, Password};
pub use crate::types::{Cancellation, CleanOperation, EncryptionResult, Hooks, Operation, Phase, Progress, WipeOutcome};

/// Encrypts one file. See [`Processor::encrypt`].
pub fn encrypt(config: &Config, input: &Path, password: &Password, key_file: Option<&Path>, output: Option<&Path>, clean_original: bool, hooks: Hooks<'_>) -> EncryptionResult {
    match Processor::new(*config) {
        Ok(processor) => processor.encrypt(input, password, key_file, output, clean_original, hooks),
        Err(error) => EncryptionResult::err(Operation::Encrypt, error),
    }
}

/// Decrypts one container. See [`Processor::decrypt`].
pub fn decrypt(config: &Config, input: &Path, password: &Password, key_file: Option<&Path>, output: Option<&Path>, hooks: Hooks<'_>) -> EncryptionResult {
    match Processor::new(*config) {
        Ok(processor) => processor.decrypt(input, password, key_file, output, hooks),
        Err(error) => EncryptionResult::err(Operation::Decrypt, error),
    }
}

/// Writes a fresh 32-byte key file. See [`KeyFile::generate`].
///
/// # Errors
///
/// [`Error::Io`] if `path` exists and `overwrite` is false, or on write failure.
pub fn generate_key(path: &Path, overwrite: bool) -> Result<()> {
    KeyFile::generate(path, overwrite)
}

/// Securely erases one file. See [`Eraser::wipe`].
///
/// # Errors
///
/// [`Error::WeakParameter`] for an invalid `config` or zero `passes`;
/// otherwise as [`Eraser::wipe`].
pub fn wipe(config: &Config, path: &Path, passes: u32, delete_after: bool, hooks: Hooks<'_>) -> Result<()> {
    config.validate()?;
    Eraser::new(config.chunk_size).wipe(path, passes, delete_after, hooks)
}

/// Securely erases every file under `dir`. See [`Eraser::wipe_directory`].
///
/// # Errors
///
/// [`Error::WeakParameter`] for an invalid `config` or zero `passes`, or
/// [`Error::Io`] when `dir` is not a directory.
pub fn wipe_directory(config: &Config, dir: &Path, passes: u32, delete_after: bool, recursive: bool, hooks: Hooks<'_>) -> Result<Vec<WipeOutcome>> {
    config.validate()?;
    Eraser::new(config.chunk_size).wipe_directory(dir, passes, delete_after, recursive, hooks)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::config::MIN_ITERATIONS;

    #[test]
    fn test_top_level_roundtrip_with_key_file() {
        let dir = tempdir().unwrap();
        let config = Config::default().with_iterations(MIN_ITERATIONS);
        let src = dir.path().join("notes.md");
        let key = dir.path().join("notes.key");
        fs::write(&src, b"# meeting notes").unwrap();

        generate_key(&key, false).unwrap();
        let sealed = encrypt(&config, &src, &Password::from("pw"), Some(&key), None, true, Hooks::new());
        assert!(sealed.success, "{sealed}");
        assert!(!src.exists());

        let opened = decrypt(&config, &sealed.output_path.unwrap(), &Password::from("pw"), Some(&key), None, Hooks::new());
        assert!(opened.success, "{opened}");
        assert_eq!(fs::read(&src).unwrap(), b"# meeting notes");
    }

    #[test]
    fn test_invalid_config_is_reported_in_result() {
        let config = Config::default().with_chunk_size(1);
        let result = encrypt(&config, Path::new("whatever"), &Password::from("pw"), None, None, false, Hooks::new());
        assert!(matches!(result.error, Some(Error::WeakParameter(_))));
    }

    #[test]
    fn test_top_level_wipe() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file");
        fs::write(&path, b"bytes").unwrap();

        wipe(&Config::default(), &path, 2, true, Hooks::new()).unwrap();
        assert!(!path.exists());

        fs::write(dir.path().join("other"), b"bytes").unwrap();
        let outcomes = wipe_directory(&Config::default(), dir.path(), 1, true, true, Hooks::new()).unwrap();
        assert_eq!(outcomes.len(), 1);
    }
}
