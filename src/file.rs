//! Path helpers shared by the engines.
//!
//! Default output names, the "is this already a container" check, and the
//! staging file that every engine writes through before the final rename.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::{DECRYPTED_EXTENSION, FILE_EXTENSION};
use crate::error::{Error, PathContext, Result};
use crate::types::Operation;

/// Default destination for `input` when the caller gives none.
///
/// Encryption appends [`FILE_EXTENSION`]. Decryption strips it, or appends
/// [`DECRYPTED_EXTENSION`] when the input does not carry it.
pub fn output_path(input: &Path, operation: Operation) -> PathBuf {
    match operation {
        Operation::Encrypt => with_suffix(input, FILE_EXTENSION),
        Operation::Decrypt => match input.to_str().and_then(|s| s.strip_suffix(FILE_EXTENSION)) {
            Some(stripped) if !stripped.is_empty() && !stripped.ends_with(std::path::MAIN_SEPARATOR) => PathBuf::from(stripped),
            _ => with_suffix(input, DECRYPTED_EXTENSION),
        },
    }
}

fn with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[inline]
#[must_use]
pub fn is_encrypted_file(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().ends_with(FILE_EXTENSION)
}

/// Rejects writing over the input itself.
///
/// # Errors
///
/// Returns [`Error::Io`] with `InvalidInput` when both paths name the same file.
pub fn ensure_distinct(input: &Path, output: &Path) -> Result<()> {
    let same = match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    };

    if same {
        return Err(Error::io(output, std::io::Error::new(std::io::ErrorKind::InvalidInput, "output path is the same as the input path")));
    }

    Ok(())
}

/// Opens a staging file next to `output`, so the final rename stays on one filesystem.
///
/// # Errors
///
/// Returns [`Error::Io`] if the parent directory cannot hold a new file.
pub fn stage(output: &Path) -> Result<NamedTempFile> {
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    tempfile::Builder::new().prefix(".zesec-").suffix(".tmp").tempfile_in(parent).at(output)
}

/// Syncs a staged file and moves it onto `output`, replacing any existing file.
///
/// # Errors
///
/// Returns [`Error::Io`] if syncing or renaming fails, or if the file on disk
/// does not have the expected length afterwards.
pub fn commit(staged: NamedTempFile, output: &Path, expected_len: u64) -> Result<()> {
    staged.as_file().sync_all().at(output)?;
    staged.persist(output).map_err(|e| Error::io(output, e.error))?;

    let written = fs::metadata(output).at(output)?.len();
    if written != expected_len {
        return Err(Error::io(output, std::io::Error::other(format!("expected {expected_len} bytes on disk, found {written}"))));
    }

    Ok(())
}
