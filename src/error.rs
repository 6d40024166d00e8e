//! Error taxonomy shared by every core operation.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors returned by the encryption, erase and key-file operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter was rejected before any I/O took place.
    #[error("weak parameter: {0}")]
    WeakParameter(String),

    /// The source or destination could not be accessed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input is not a structurally valid container.
    #[error("malformed container: {0}")]
    MalformedContainer(String),

    /// Tag verification failed.
    ///
    /// Wrong password, wrong or missing key file and corrupted data all land
    /// here on purpose: the message must not reveal which factor was wrong.
    #[error("authentication failed: wrong password or key file, or the file is corrupted")]
    Authentication,

    /// A primitive failed in a way that should not happen with valid inputs.
    #[error("encryption failure: {0}")]
    EncryptionFailure(String),

    /// The caller signalled cancellation.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn weak(message: impl Into<String>) -> Self {
        Self::WeakParameter(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedContainer(message.into())
    }

    /// Whether the error belongs to the "wrong secret or tampered data" class.
    #[inline]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attaches the offending path to a bare `io::Error`.
pub trait PathContext<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> PathContext<T> for io::Result<T> {
    #[inline]
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|source| Error::io(path, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_path() {
        let err: Result<()> = Err(io::Error::from(io::ErrorKind::PermissionDenied)).at(Path::new("/tmp/secret.txt"));
        let message = err.unwrap_err().to_string();
        assert!(message.contains("/tmp/secret.txt"));
    }

    #[test]
    fn test_authentication_message_is_generic() {
        let message = Error::Authentication.to_string();
        assert!(message.contains("wrong password or key file"));
        assert!(Error::Authentication.is_authentication());
        assert!(!Error::Cancelled.is_authentication());
    }
}
