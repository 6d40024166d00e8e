//! In-memory container codec.
//!
//! `[preamble 44][ciphertext ..][tag 16]`. Decoding checks the total length
//! against the fixed-width fields before slicing anything.

use crate::config::{MIN_CONTAINER_SIZE, NONCE_SIZE, PREAMBLE_SIZE, SALT_SIZE, TAG_SIZE};
use crate::error::{Error, Result};
use crate::header::{Header, Preamble};

/// A decoded container borrowing its ciphertext from the input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container<'a> {
    pub preamble: Preamble,
    pub ciphertext: &'a [u8],
    pub tag: [u8; TAG_SIZE],
}

impl<'a> Container<'a> {
    pub fn new(header: Header, salt: [u8; SALT_SIZE], nonce: [u8; NONCE_SIZE], ciphertext: &'a [u8], tag: [u8; TAG_SIZE]) -> Self {
        Self { preamble: Preamble::new(header, salt, nonce), ciphertext, tag }
    }

    pub fn header(&self) -> &Header {
        &self.preamble.header
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(MIN_CONTAINER_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.preamble.serialize());
        out.extend_from_slice(self.ciphertext);
        out.extend_from_slice(&self.tag);
        out
    }

    /// # Errors
    ///
    /// Returns [`Error::MalformedContainer`] if `bytes` is shorter than an
    /// empty container or its preamble is invalid.
    pub fn decode(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < MIN_CONTAINER_SIZE {
            return Err(Error::malformed(format!("container too short: need at least {MIN_CONTAINER_SIZE} bytes, got {}", bytes.len())));
        }

        let (preamble, rest) = bytes.split_at(PREAMBLE_SIZE);
        let (ciphertext, tag) = rest.split_at(rest.len() - TAG_SIZE);

        Ok(Self {
            preamble: Preamble::deserialize(preamble.try_into().map_err(|_| Error::malformed("truncated preamble"))?)?,
            ciphertext,
            tag: tag.try_into().map_err(|_| Error::malformed("truncated tag"))?,
        })
    }
}
