//! Incremental ChaCha20-Poly1305.
//!
//! The container holds a single tag over the whole plaintext, yet files are
//! processed in bounded chunks. This module runs the RFC 8439 AEAD
//! construction step by step so that the output of any chunking is
//! byte-identical to a one-shot `ChaCha20Poly1305::encrypt` of the full
//! message:
//!
//! - Poly1305 key = first 32 bytes of keystream block 0.
//! - Payload keystream starts at block 1.
//! - MAC input = AAD ‖ pad16 ‖ ciphertext ‖ pad16 ‖ le64(len(AAD)) ‖ le64(len(ciphertext)).
//!
//! Chunks may have any length; a partial Poly1305 block is carried over to
//! the next call so padding is only ever applied at the very end.

use chacha20::ChaCha20;
use chacha20::cipher::{KeyIvInit, StreamCipher, StreamCipherSeek};
use poly1305::Poly1305;
use poly1305::universal_hash::{KeyInit, UniversalHash};
use zeroize::Zeroize;

use crate::cipher::EncryptionKey;
use crate::config::{NONCE_SIZE, TAG_SIZE};
use crate::error::{Error, Result};

/// Poly1305 block size.
const BLOCK: usize = 16;

/// Offset of the first payload keystream byte (block 1).
const PAYLOAD_OFFSET: u64 = 64;

/// One AEAD message in flight, either sealing or opening.
pub struct Stream {
    cipher: ChaCha20,
    mac: Poly1305,
    carry: [u8; BLOCK],
    carry_len: usize,
    aad_len: u64,
    data_len: u64,
}

impl Stream {
    /// Starts a message under `key` and `nonce`, authenticating `aad` up front.
    pub fn new(key: &EncryptionKey, nonce: &[u8; NONCE_SIZE], aad: &[u8]) -> Self {
        let mut cipher = ChaCha20::new(chacha20::Key::from_slice(key.as_bytes()), chacha20::Nonce::from_slice(nonce));

        let mut mac_key = poly1305::Key::default();
        cipher.apply_keystream(&mut mac_key);
        let mut mac = Poly1305::new(&mac_key);
        mac_key.as_mut_slice().zeroize();

        cipher.seek(PAYLOAD_OFFSET);
        mac.update_padded(aad);

        Self { cipher, mac, carry: [0u8; BLOCK], carry_len: 0, aad_len: aad.len() as u64, data_len: 0 }
    }

    /// Encrypts `chunk` in place and feeds the ciphertext to the MAC.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EncryptionFailure`] once the 32-bit block counter
    /// would wrap (messages beyond 256 GiB).
    pub fn encrypt_chunk(&mut self, chunk: &mut [u8]) -> Result<()> {
        self.apply_keystream(chunk)?;
        self.absorb(chunk);
        Ok(())
    }

    /// Feeds the ciphertext `chunk` to the MAC, then decrypts it in place.
    ///
    /// The plaintext is unauthenticated until [`Stream::verify`] succeeds.
    ///
    /// # Errors
    ///
    /// Same as [`Stream::encrypt_chunk`].
    pub fn decrypt_chunk(&mut self, chunk: &mut [u8]) -> Result<()> {
        self.absorb(chunk);
        self.apply_keystream(chunk)
    }

    /// Finishes a sealed message and returns its tag.
    pub fn tag(mut self) -> [u8; TAG_SIZE] {
        self.absorb_lengths();
        let tag = self.mac.finalize();

        let mut out = [0u8; TAG_SIZE];
        out.copy_from_slice(&tag);
        out
    }

    /// Finishes an opened message and checks `expected` in constant time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] on mismatch.
    pub fn verify(mut self, expected: &[u8; TAG_SIZE]) -> Result<()> {
        self.absorb_lengths();
        self.mac.verify(poly1305::Block::from_slice(expected)).map_err(|_| Error::Authentication)
    }

    fn apply_keystream(&mut self, chunk: &mut [u8]) -> Result<()> {
        self.cipher.try_apply_keystream(chunk).map_err(|_| Error::EncryptionFailure("message exceeds the ChaCha20 keystream limit".to_owned()))
    }

    fn absorb(&mut self, mut data: &[u8]) {
        self.data_len += data.len() as u64;

        if self.carry_len > 0 {
            let take = (BLOCK - self.carry_len).min(data.len());
            self.carry[self.carry_len..self.carry_len + take].copy_from_slice(&data[..take]);
            self.carry_len += take;
            data = &data[take..];

            if self.carry_len < BLOCK {
                return;
            }

            self.mac.update_padded(&self.carry);
            self.carry_len = 0;
        }

        // Whole blocks only: update_padded adds no padding to an exact multiple.
        let whole = data.len() - data.len() % BLOCK;
        self.mac.update_padded(&data[..whole]);

        let rest = &data[whole..];
        self.carry[..rest.len()].copy_from_slice(rest);
        self.carry_len = rest.len();
    }

    fn absorb_lengths(&mut self) {
        if self.carry_len > 0 {
            self.mac.update_padded(&self.carry[..self.carry_len]);
            self.carry_len = 0;
        }

        let mut lengths = poly1305::Block::default();
        lengths[..8].copy_from_slice(&self.aad_len.to_le_bytes());
        lengths[8..].copy_from_slice(&self.data_len.to_le_bytes());
        self.mac.update(&[lengths]);
        self.carry.zeroize();
    }
}
