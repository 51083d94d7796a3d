//! File Envelope - Key Management
//!
//! A symmetric key is 32 bytes: the first half keys HMAC-SHA256, the second
//! half keys AES-128. Keys travel as url-safe base64 text.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::RngCore;
use secrecy::SecretString;
use zeroize::{Zeroizing, ZeroizeOnDrop};

use crate::error::{EnvelopeError, EnvelopeResult};

/// Raw key length
pub const KEY_LEN: usize = 32;

/// Length of each subkey (signing / encryption)
pub const SUBKEY_LEN: usize = 16;

/// IV length for AES-CBC
pub const IV_LEN: usize = 16;

/// Symmetric envelope key with automatic zeroization
#[derive(Clone, ZeroizeOnDrop)]
pub struct SymmetricKey {
    signing: [u8; SUBKEY_LEN],
    encryption: [u8; SUBKEY_LEN],
}

impl SymmetricKey {
    /// Create a key from 32 raw bytes
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        let bytes = Zeroizing::new(bytes);
        let mut signing = [0u8; SUBKEY_LEN];
        let mut encryption = [0u8; SUBKEY_LEN];
        signing.copy_from_slice(&bytes[..SUBKEY_LEN]);
        encryption.copy_from_slice(&bytes[SUBKEY_LEN..]);
        Self { signing, encryption }
    }

    /// Generate a random key
    pub fn generate() -> Self {
        Self::new(random_array())
    }

    /// Create a key from a raw byte slice
    pub fn from_slice(bytes: &[u8]) -> EnvelopeResult<Self> {
        let raw: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| EnvelopeError::InvalidKey { expected: KEY_LEN })?;
        Ok(Self::new(raw))
    }

    /// Parse the textual (url-safe base64) form of a key.
    ///
    /// Surrounding whitespace is ignored so keys read from files work as-is.
    pub fn from_encoded(encoded: &str) -> EnvelopeResult<Self> {
        let decoded = Zeroizing::new(
            URL_SAFE
                .decode(encoded.trim())
                .map_err(|_| EnvelopeError::InvalidKey { expected: KEY_LEN })?,
        );
        Self::from_slice(&decoded)
    }

    /// Textual (url-safe base64) form of the key
    pub fn to_encoded(&self) -> SecretString {
        let mut raw = Zeroizing::new([0u8; KEY_LEN]);
        raw[..SUBKEY_LEN].copy_from_slice(&self.signing);
        raw[SUBKEY_LEN..].copy_from_slice(&self.encryption);
        SecretString::from(URL_SAFE.encode(&*raw))
    }

    /// HMAC-SHA256 subkey
    pub fn signing_key(&self) -> &[u8; SUBKEY_LEN] {
        &self.signing
    }

    /// AES-128 subkey
    pub fn encryption_key(&self) -> &[u8; SUBKEY_LEN] {
        &self.encryption
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

/// Generate a new encoded key
pub fn generate_key() -> SecretString {
    SymmetricKey::generate().to_encoded()
}

/// Fill a fixed-size array from the thread-local CSPRNG
pub fn random_array<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Generate a random IV for AES-CBC
pub fn generate_iv() -> [u8; IV_LEN] {
    random_array()
}
