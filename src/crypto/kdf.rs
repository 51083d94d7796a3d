//! PBKDF2-HMAC-SHA256 derivation of envelope keys from passwords

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::RngCore;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::keys::{SymmetricKey, KEY_LEN};
use crate::error::{EnvelopeError, EnvelopeResult};

/// Default PBKDF2 iteration count
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Upper bound on iterations accepted from configuration
pub const MAX_ITERATIONS: u32 = 10_000_000;

/// Default salt length in bytes
pub const SALT_LEN: usize = 16;

/// PBKDF2 parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// Iterations (work factor)
    pub iterations: u32,
    /// Length of freshly generated salts
    pub salt_len: usize,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            salt_len: SALT_LEN,
        }
    }
}

impl KdfParams {
    fn validate(&self) -> EnvelopeResult<()> {
        if self.iterations == 0 || self.iterations > MAX_ITERATIONS {
            return Err(EnvelopeError::KeyDerivation(format!(
                "iterations must be within 1..={}, got {}",
                MAX_ITERATIONS, self.iterations
            )));
        }
        if self.salt_len == 0 {
            return Err(EnvelopeError::KeyDerivation(
                "salt length must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Non-secret salt stored alongside anything sealed with a derived key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt(Vec<u8>);

impl Salt {
    /// Generate a random salt of `len` bytes
    pub fn generate(len: usize) -> Self {
        let mut bytes = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap existing salt bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Parse a standard base64 salt
    pub fn from_base64(encoded: &str) -> EnvelopeResult<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| EnvelopeError::KeyDerivation(format!("invalid salt: {}", e)))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

/// Output of a password derivation: the encoded key plus the salt used
#[derive(Debug)]
pub struct DerivedKey {
    pub key: SecretString,
    pub salt: Salt,
}

/// Derive an encoded key from a password with the default parameters.
///
/// A fresh salt is generated when `salt` is `None`. An empty password is
/// accepted; strength policy belongs to the caller.
pub fn derive_key(password: &str, salt: Option<&[u8]>) -> EnvelopeResult<DerivedKey> {
    derive_key_with(password, salt, &KdfParams::default())
}

/// Derive an encoded key from a password with explicit parameters
pub fn derive_key_with(
    password: &str,
    salt: Option<&[u8]>,
    params: &KdfParams,
) -> EnvelopeResult<DerivedKey> {
    params.validate()?;

    let salt = match salt {
        Some([]) => {
            return Err(EnvelopeError::KeyDerivation("salt must not be empty".into()));
        }
        Some(bytes) => Salt::from_bytes(bytes),
        None => Salt::generate(params.salt_len),
    };

    let key = derive_symmetric_key(password, &salt, params.iterations)?;

    tracing::debug!(
        iterations = params.iterations,
        salt_len = salt.as_bytes().len(),
        "derived envelope key from password"
    );

    Ok(DerivedKey {
        key: key.to_encoded(),
        salt,
    })
}

/// Derive the raw key directly
pub fn derive_symmetric_key(
    password: &str,
    salt: &Salt,
    iterations: u32,
) -> EnvelopeResult<SymmetricKey> {
    if iterations == 0 {
        return Err(EnvelopeError::KeyDerivation(
            "PBKDF2 iterations must be >= 1".into(),
        ));
    }

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::<Hmac<Sha256>>(
        password.as_bytes(),
        salt.as_bytes(),
        iterations,
        &mut *output,
    )
    .map_err(|e| EnvelopeError::KeyDerivation(format!("PBKDF2 failed: {}", e)))?;

    Ok(SymmetricKey::new(*output))
}
