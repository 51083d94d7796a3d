//! File Envelope - Cryptographic Core
//!
//! PBKDF2-HMAC-SHA256 for password keys, AES-128-CBC + HMAC-SHA256 for tokens.

pub mod cbc;
pub mod kdf;
pub mod keys;

pub use kdf::{derive_key, derive_key_with, derive_symmetric_key, DerivedKey, KdfParams, Salt};
pub use keys::{generate_key, SymmetricKey, KEY_LEN};
