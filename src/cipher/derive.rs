//! # Key Derivation
//!
//! Turns a password, and optionally key-file material, into the 256-bit key
//! that drives one container.
//!
//! - The password is stretched with PBKDF2-HMAC-SHA256 over the container salt.
//! - When a key file is supplied, its bytes and the stretched password key are
//!   mixed through HKDF-SHA256 (salted with the same container salt). Both
//!   factors are then needed to reproduce the key; a wrong one is only noticed
//!   when the tag fails to verify.
//!
//! An absent key file and an empty key file are different inputs: the first
//! skips the HKDF step entirely.

use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::config::{KEY_FILE_INFO, KEY_SIZE, MIN_ITERATIONS, NONCE_SIZE, SALT_SIZE};
use crate::error::{Error, Result};

/// A derived 256-bit key, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    #[inline]
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// Password and optional key-file material awaiting a salt.
pub struct Derive<'a> {
    password: &'a [u8],
    key_file: Option<&'a [u8]>,
}

impl<'a> Derive<'a> {
    /// # Errors
    ///
    /// Returns [`Error::WeakParameter`] if the password is empty.
    pub fn new(password: &'a [u8], key_file: Option<&'a [u8]>) -> Result<Self> {
        if password.is_empty() {
            return Err(Error::weak("password cannot be empty"));
        }

        Ok(Self { password, key_file })
    }

    /// Derives the container key for `salt`.
    ///
    /// Deterministic: identical inputs always yield the identical key, which
    /// is what lets decryption reproduce the encryption-time key.
    ///
    /// # Errors
    ///
    /// - [`Error::WeakParameter`] if `iterations` is below [`MIN_ITERATIONS`].
    /// - [`Error::EncryptionFailure`] if HKDF rejects the output length.
    pub fn derive_key(&self, salt: &[u8; SALT_SIZE], iterations: u32) -> Result<EncryptionKey> {
        if iterations < MIN_ITERATIONS {
            return Err(Error::weak(format!("iterations must be at least {MIN_ITERATIONS}, got {iterations}")));
        }

        let mut password_key = Zeroizing::new([0u8; KEY_SIZE]);
        pbkdf2::pbkdf2_hmac::<Sha256>(self.password, salt, iterations, &mut password_key[..]);

        let Some(key_file) = self.key_file else {
            return Ok(EncryptionKey(*password_key));
        };

        // key_file || password_key; the fixed-width suffix keeps the split unambiguous.
        let mut ikm = Zeroizing::new(Vec::with_capacity(key_file.len() + KEY_SIZE));
        ikm.extend_from_slice(key_file);
        ikm.extend_from_slice(&password_key[..]);

        let mut key = [0u8; KEY_SIZE];
        Hkdf::<Sha256>::new(Some(&salt[..]), &ikm)
            .expand(KEY_FILE_INFO, &mut key)
            .map_err(|e| Error::EncryptionFailure(format!("key combination failed: {e}")))?;

        Ok(EncryptionKey(key))
    }
}

/// Convenience wrapper over [`Derive`].
///
/// # Errors
///
/// See [`Derive::new`] and [`Derive::derive_key`].
pub fn derive(password: &[u8], key_file: Option<&[u8]>, salt: &[u8; SALT_SIZE], iterations: u32) -> Result<EncryptionKey> {
    Derive::new(password, key_file)?.derive_key(salt, iterations)
}

/// Fresh random salt from the OS-seeded CSPRNG.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::rng().fill_bytes(&mut salt);
    salt
}

/// Fresh random nonce, drawn independently of the salt.
pub fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce);
    nonce
}
