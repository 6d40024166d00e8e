//! Key files: a second factor stored on disk.
//!
//! A key file is raw bytes. [`KeyFile::generate`] writes 32 random bytes, but
//! any readable file (including an empty one) is accepted as key material.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use rand::RngCore;
use tracing::debug;
use zeroize::Zeroizing;

use crate::config::KEY_FILE_SIZE;
use crate::error::{PathContext, Result};
use crate::secret::KeyMaterial;

pub struct KeyFile;

impl KeyFile {
    /// Writes a fresh key file to `path`.
    ///
    /// On Unix the file is created with mode `0600`. The data is synced before
    /// returning.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if `path` exists and `overwrite` is false,
    /// or if the file cannot be written.
    pub fn generate(path: &Path, overwrite: bool) -> Result<()> {
        let mut bytes = Zeroizing::new([0u8; KEY_FILE_SIZE]);
        rand::rng().fill_bytes(&mut bytes[..]);

        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path).at(path)?;

        // create(true) keeps the mode of an existing file.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if overwrite {
                file.set_permissions(fs::Permissions::from_mode(0o600)).at(path)?;
            }
        }

        file.write_all(&bytes[..]).at(path)?;
        file.sync_all().at(path)?;

        debug!(path = %path.display(), "generated key file");
        Ok(())
    }

    /// Reads the whole file as key material.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be read.
    pub fn load(path: &Path) -> Result<KeyMaterial> {
        let bytes = fs::read(path).at(path)?;
        debug!(path = %path.display(), len = bytes.len(), "loaded key file");
        Ok(KeyMaterial::from_vec(bytes))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::error::Error;

    #[test]
    fn test_generate_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secret.key");

        KeyFile::generate(&path, false).unwrap();
        let material = KeyFile::load(&path).unwrap();
        assert_eq!(material.len(), KEY_FILE_SIZE);
    }

    #[test]
    fn test_generated_keys_differ() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.key");
        let b = dir.path().join("b.key");

        KeyFile::generate(&a, false).unwrap();
        KeyFile::generate(&b, false).unwrap();
        assert_ne!(fs::read(a).unwrap(), fs::read(b).unwrap());
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secret.key");
        fs::write(&path, b"keep me").unwrap();

        assert!(matches!(KeyFile::generate(&path, false), Err(Error::Io { .. })));
        assert_eq!(fs::read(&path).unwrap(), b"keep me");

        KeyFile::generate(&path, true).unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), KEY_FILE_SIZE);
    }

    #[cfg(unix)]
    #[test]
    fn test_generated_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("secret.key");
        KeyFile::generate(&path, false).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_empty_file_is_valid_material() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.key");
        fs::write(&path, b"").unwrap();

        assert!(KeyFile::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(KeyFile::load(&dir.path().join("nope.key")), Err(Error::Io { .. })));
    }
}
