//! # Cryptographic Operations
//!
//! - [`derive`]: PBKDF2-HMAC-SHA256 key stretching with optional HKDF key-file mixing
//! - [`stream`]: incremental ChaCha20-Poly1305 producing one tag per message
//!
//! Both wrap audited RustCrypto primitives; nothing here implements a cipher
//! or hash of its own.

pub mod derive;
pub mod stream;

pub use derive::{Derive, EncryptionKey, derive, generate_nonce, generate_salt};
pub use stream::Stream;
