//! Configuration Constants and Per-Call Parameters
//!
//! The first half of this module fixes the container format: magic bytes,
//! algorithm identifiers, field sizes. Those values are versioned by
//! [`CURRENT_VERSION`] and must never change for an existing version, or old
//! containers stop decrypting.
//!
//! The second half is [`Config`], the tunable surface (iteration count, chunk
//! size, default wipe passes). The core never reads it from the environment;
//! callers build one and hand it to each component.

use crate::error::{Error, Result};

/// Application name used in user interfaces.
pub const APP_NAME: &str = "Zesec";

/// Suffix appended to encrypted files.
pub const FILE_EXTENSION: &str = ".zesec";

/// Suffix appended on decrypt when the input does not carry [`FILE_EXTENSION`].
pub const DECRYPTED_EXTENSION: &str = ".decrypted";

// === Container Format ===

/// Magic bytes opening every container.
pub const MAGIC_BYTES: [u8; 4] = *b"ZSEC";

/// Current container format version.
///
/// Version 1 pins ChaCha20-Poly1305, PBKDF2-HMAC-SHA256 and the HKDF key-file
/// combination. Any change to derivation or framing needs a new version.
pub const CURRENT_VERSION: u8 = 0x01;

/// Identifier for the ChaCha20-Poly1305 AEAD (RFC 8439).
pub const ALGORITHM_CHACHA20_POLY1305: u8 = 0x01;

/// Identifier for PBKDF2-HMAC-SHA256 with HKDF-SHA256 key-file mixing.
pub const KDF_PBKDF2_SHA256: u8 = 0x01;

/// Size of the fixed header (magic, ids, lengths, iterations).
pub const HEADER_SIZE: usize = 16;

/// Length of the per-file KDF salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Length of the AEAD nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Length of the Poly1305 authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Header, salt and nonce: everything that precedes the ciphertext.
pub const PREAMBLE_SIZE: usize = HEADER_SIZE + SALT_SIZE + NONCE_SIZE;

/// Smallest possible container (empty ciphertext).
pub const MIN_CONTAINER_SIZE: usize = PREAMBLE_SIZE + TAG_SIZE;

/// Size of the derived encryption key (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of generated key files.
pub const KEY_FILE_SIZE: usize = 32;

/// HKDF info string binding the key-file combination to format version 1.
pub const KEY_FILE_INFO: &[u8] = b"zesec/v1 key-file combination";

// === Tunable Defaults ===

/// Lowest PBKDF2 iteration count the engine accepts.
pub const MIN_ITERATIONS: u32 = 100_000;

/// Highest PBKDF2 iteration count the engine accepts.
///
/// The stored count is read before anything is authenticated, so a crafted
/// header must not be able to stall decryption in the KDF. Containers above
/// this are rejected as malformed.
pub const MAX_ITERATIONS: u32 = 10_000_000;

/// PBKDF2 iteration count used for new containers.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Streaming chunk size. Memory use stays near this figure regardless of file size.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Smallest accepted chunk size.
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Largest accepted chunk size.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Default number of overwrite passes for secure erase.
pub const DEFAULT_PASSES: u32 = 3;

/// Explicit per-call configuration for the engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// PBKDF2 iterations for new containers. Decryption uses the stored value.
    pub iterations: u32,

    /// Bytes read, encrypted or overwritten per step.
    pub chunk_size: usize,

    /// Overwrite passes used when cleaning originals after encryption.
    pub passes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self { iterations: DEFAULT_ITERATIONS, chunk_size: CHUNK_SIZE, passes: DEFAULT_PASSES }
    }
}

impl Config {
    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn with_passes(mut self, passes: u32) -> Self {
        self.passes = passes;
        self
    }

    /// Rejects values outside the accepted ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WeakParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.iterations < MIN_ITERATIONS {
            return Err(Error::weak(format!("iterations must be at least {MIN_ITERATIONS}, got {}", self.iterations)));
        }

        if self.iterations > MAX_ITERATIONS {
            return Err(Error::weak(format!("iterations must be at most {MAX_ITERATIONS}, got {}", self.iterations)));
        }

        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(Error::weak(format!("chunk size must be between {MIN_CHUNK_SIZE} and {MAX_CHUNK_SIZE} bytes, got {}", self.chunk_size)));
        }

        if self.passes == 0 {
            return Err(Error::weak("pass count must be at least 1"));
        }

        Ok(())
    }
}
