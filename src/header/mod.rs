//! Container header and preamble.
//!
//! Every `.zesec` file opens with a fixed 44-byte preamble:
//!
//! ```text
//! [magic 4][version 1][algorithm 1][kdf 1][salt_len 1][nonce_len 1][reserved 3][iterations 4 BE]
//! [salt 16][nonce 12]
//! ```
//!
//! followed by the ciphertext and a 16-byte tag (see [`container`]). All
//! fixed-width fields come first, so parsing never scans or backtracks. The
//! whole preamble is passed to the AEAD as associated data, so a modified
//! header fails authentication even when it still parses.

use std::io::{ErrorKind, Read};
use std::path::Path;

use crate::config::{
    ALGORITHM_CHACHA20_POLY1305, CURRENT_VERSION, HEADER_SIZE, KDF_PBKDF2_SHA256, MAGIC_BYTES, MAX_ITERATIONS, NONCE_SIZE, PREAMBLE_SIZE, SALT_SIZE,
};
use crate::error::{Error, Result};

pub mod container;

pub use container::Container;

/// Format identifiers and KDF cost for one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub algorithm: u8,
    pub kdf: u8,
    pub iterations: u32,
}

impl Header {
    /// Header for a new container at the current format version.
    pub fn new(iterations: u32) -> Self {
        Self { version: CURRENT_VERSION, algorithm: ALGORITHM_CHACHA20_POLY1305, kdf: KDF_PBKDF2_SHA256, iterations }
    }

    pub fn serialize(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&MAGIC_BYTES);
        out[4] = self.version;
        out[5] = self.algorithm;
        out[6] = self.kdf;
        out[7] = SALT_SIZE as u8;
        out[8] = NONCE_SIZE as u8;
        // 9..12 reserved
        out[12..16].copy_from_slice(&self.iterations.to_be_bytes());
        out
    }

    /// Parses and validates the fixed header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedContainer`] for a wrong magic, an unknown
    /// version, algorithm or KDF, unexpected field lengths, non-zero reserved
    /// bytes, or an iteration count above [`MAX_ITERATIONS`].
    pub fn deserialize(bytes: &[u8; HEADER_SIZE]) -> Result<Self> {
        if bytes[0..4] != MAGIC_BYTES {
            return Err(Error::malformed("not a zesec container (bad magic)"));
        }

        let header = Self { version: bytes[4], algorithm: bytes[5], kdf: bytes[6], iterations: u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]) };

        if header.version != CURRENT_VERSION {
            return Err(Error::malformed(format!("unsupported version {}", header.version)));
        }

        if header.algorithm != ALGORITHM_CHACHA20_POLY1305 {
            return Err(Error::malformed(format!("unknown algorithm id {}", header.algorithm)));
        }

        if header.kdf != KDF_PBKDF2_SHA256 {
            return Err(Error::malformed(format!("unknown kdf id {}", header.kdf)));
        }

        if usize::from(bytes[7]) != SALT_SIZE || usize::from(bytes[8]) != NONCE_SIZE {
            return Err(Error::malformed(format!("unexpected salt/nonce length {}/{}", bytes[7], bytes[8])));
        }

        if bytes[9..12] != [0u8; 3] {
            return Err(Error::malformed("reserved bytes are not zero"));
        }

        if header.iterations > MAX_ITERATIONS {
            return Err(Error::malformed(format!("iteration count {} exceeds the limit of {MAX_ITERATIONS}", header.iterations)));
        }

        Ok(header)
    }
}

/// Header plus the salt and nonce: everything before the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    pub header: Header,
    pub salt: [u8; SALT_SIZE],
    pub nonce: [u8; NONCE_SIZE],
}

impl Preamble {
    pub fn new(header: Header, salt: [u8; SALT_SIZE], nonce: [u8; NONCE_SIZE]) -> Self {
        Self { header, salt, nonce }
    }

    /// Serialized form, also used verbatim as AEAD associated data.
    pub fn serialize(&self) -> [u8; PREAMBLE_SIZE] {
        let mut out = [0u8; PREAMBLE_SIZE];
        out[..HEADER_SIZE].copy_from_slice(&self.header.serialize());
        out[HEADER_SIZE..HEADER_SIZE + SALT_SIZE].copy_from_slice(&self.salt);
        out[HEADER_SIZE + SALT_SIZE..].copy_from_slice(&self.nonce);
        out
    }

    /// # Errors
    ///
    /// Returns [`Error::MalformedContainer`] if the header is invalid.
    pub fn deserialize(bytes: &[u8; PREAMBLE_SIZE]) -> Result<Self> {
        let (header, rest) = bytes.split_at(HEADER_SIZE);
        let (salt, nonce) = rest.split_at(SALT_SIZE);

        Ok(Self {
            header: Header::deserialize(header.try_into().map_err(|_| Error::malformed("truncated header"))?)?,
            salt: salt.try_into().map_err(|_| Error::malformed("truncated salt"))?,
            nonce: nonce.try_into().map_err(|_| Error::malformed("truncated nonce"))?,
        })
    }

    /// Reads the preamble from the front of a stream opened from `path`.
    ///
    /// # Errors
    ///
    /// A stream shorter than the preamble is [`Error::MalformedContainer`];
    /// any other read failure is [`Error::Io`] on `path`.
    pub fn read_from<R: Read>(reader: &mut R, path: &Path) -> Result<Self> {
        let mut bytes = [0u8; PREAMBLE_SIZE];
        match reader.read_exact(&mut bytes) {
            Ok(()) => Self::deserialize(&bytes),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(Error::malformed("container shorter than its preamble")),
            Err(e) => Err(Error::io(path, e)),
        }
    }
}
