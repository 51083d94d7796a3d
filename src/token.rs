//! Envelope token format
//!
//! ```text
//! [VERSION 1B][0x80]
//! [TIMESTAMP 8B][seconds since epoch, big-endian]
//! [IV 16B][random]
//! [CIPHERTEXT variable][AES-128-CBC, PKCS#7]
//! [TAG 32B][HMAC-SHA256 of all above]
//! ```
//!
//! Text form is standard base64 of the bytes above. Url-safe base64 is
//! accepted when decoding.

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

use crate::crypto::cbc::{self, BLOCK_LEN};
use crate::crypto::keys::{generate_iv, SymmetricKey, IV_LEN, KEY_LEN};
use crate::error::{EnvelopeError, EnvelopeResult};

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Current format version
pub const VERSION: u8 = 0x80;

/// Timestamp field size
const TIMESTAMP_LEN: usize = 8;

/// HMAC-SHA256 size
pub const TAG_LEN: usize = 32;

/// Header size: VERSION(1) + TIMESTAMP(8) + IV(16)
const HEADER_LEN: usize = 1 + TIMESTAMP_LEN + IV_LEN;

/// Smallest well-formed token: header, one cipher block, tag
pub const MIN_TOKEN_LEN: usize = HEADER_LEN + BLOCK_LEN + TAG_LEN;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A sealed, immutable envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    bytes: Vec<u8>,
}

/// Authenticated token metadata
#[derive(Debug, Clone, Serialize)]
pub struct TokenInfo {
    pub version: u8,
    pub issued_at: DateTime<Utc>,
    pub ciphertext_len: usize,
}

impl Token {
    /// Seal plaintext with a fresh IV and the current time
    pub fn seal(key: &SymmetricKey, plaintext: &[u8]) -> Self {
        let now = Utc::now().timestamp().max(0) as u64;
        Self::seal_at(key, plaintext, now, generate_iv())
    }

    /// Seal with an explicit timestamp and IV.
    ///
    /// Reusing an IV under the same key leaks plaintext equality; only
    /// fixed test vectors should call this directly.
    pub fn seal_at(key: &SymmetricKey, plaintext: &[u8], timestamp: u64, iv: [u8; IV_LEN]) -> Self {
        let ciphertext = cbc::encrypt(key.encryption_key(), &iv, plaintext);

        let mut bytes = Vec::with_capacity(HEADER_LEN + ciphertext.len() + TAG_LEN);
        bytes.push(VERSION);
        bytes.extend_from_slice(&timestamp.to_be_bytes());
        bytes.extend_from_slice(&iv);
        bytes.extend_from_slice(&ciphertext);

        let tag = compute_tag(key, &bytes);
        bytes.extend_from_slice(&tag);

        Self { bytes }
    }

    /// Wrap raw token bytes. Only the length is checked here; everything
    /// else waits for authentication.
    pub fn from_bytes(bytes: Vec<u8>) -> EnvelopeResult<Self> {
        if bytes.len() < MIN_TOKEN_LEN {
            return Err(EnvelopeError::invalid_token(format!(
                "expected at least {} bytes, got {}",
                MIN_TOKEN_LEN,
                bytes.len()
            )));
        }
        Ok(Self { bytes })
    }

    /// Parse the text form (standard or url-safe base64)
    pub fn decode(text: &[u8]) -> EnvelopeResult<Self> {
        let text = std::str::from_utf8(text)
            .map_err(|_| EnvelopeError::invalid_token("token is not ASCII text"))?
            .trim();

        let bytes = match STANDARD.decode(text) {
            Ok(bytes) => bytes,
            Err(e) => URL_SAFE.decode(text).map_err(|_| EnvelopeError::from(e))?,
        };

        Self::from_bytes(bytes)
    }

    /// Standard base64 text form
    pub fn encode(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Url-safe base64 text form
    pub fn encode_url_safe(&self) -> String {
        URL_SAFE.encode(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Verify the tag in constant time. Runs before any field is trusted.
    fn verify(&self, key: &SymmetricKey) -> EnvelopeResult<()> {
        let tag_start = self.bytes.len() - TAG_LEN;

        let mut mac = <HmacSha256 as Mac>::new_from_slice(key.signing_key())
            .map_err(|_| EnvelopeError::InvalidKey { expected: KEY_LEN })?;
        mac.update(&self.bytes[..tag_start]);

        mac.verify_slice(&self.bytes[tag_start..]).map_err(|_| {
            tracing::warn!(token_len = self.bytes.len(), "token authentication failed");
            EnvelopeError::AuthenticationFailed
        })
    }

    /// Authenticate, then check the fixed fields
    fn authenticated_fields(&self, key: &SymmetricKey) -> EnvelopeResult<Fields<'_>> {
        self.verify(key)?;

        let version = self.bytes[0];
        if version != VERSION {
            return Err(EnvelopeError::invalid_token(format!(
                "unsupported version: {:#04x}",
                version
            )));
        }

        let mut timestamp = [0u8; TIMESTAMP_LEN];
        timestamp.copy_from_slice(&self.bytes[1..1 + TIMESTAMP_LEN]);

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&self.bytes[1 + TIMESTAMP_LEN..HEADER_LEN]);

        let ciphertext = &self.bytes[HEADER_LEN..self.bytes.len() - TAG_LEN];
        if ciphertext.len() % BLOCK_LEN != 0 {
            return Err(EnvelopeError::invalid_token(
                "ciphertext is not a whole number of blocks",
            ));
        }

        Ok(Fields {
            version,
            timestamp: u64::from_be_bytes(timestamp),
            iv,
            ciphertext,
        })
    }

    /// Authenticate and decrypt
    pub fn open(&self, key: &SymmetricKey) -> EnvelopeResult<Vec<u8>> {
        let fields = self.authenticated_fields(key)?;
        cbc::decrypt(key.encryption_key(), &fields.iv, fields.ciphertext)
    }

    /// Authenticated metadata without decrypting
    pub fn inspect(&self, key: &SymmetricKey) -> EnvelopeResult<TokenInfo> {
        let fields = self.authenticated_fields(key)?;
        Ok(TokenInfo {
            version: fields.version,
            issued_at: timestamp_to_datetime(fields.timestamp)?,
            ciphertext_len: fields.ciphertext.len(),
        })
    }

    /// Creation time recorded in the token. Staleness policy is the caller's.
    pub fn issued_at(&self, key: &SymmetricKey) -> EnvelopeResult<DateTime<Utc>> {
        self.inspect(key).map(|info| info.issued_at)
    }
}

struct Fields<'a> {
    version: u8,
    timestamp: u64,
    iv: [u8; IV_LEN],
    ciphertext: &'a [u8],
}

fn compute_tag(key: &SymmetricKey, data: &[u8]) -> [u8; TAG_LEN] {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key.signing_key())
        .expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

fn timestamp_to_datetime(secs: u64) -> EnvelopeResult<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or_else(|| EnvelopeError::invalid_token("timestamp out of range"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
