//! File Envelope - Error Types

use thiserror::Error;

/// Result type for envelope operations
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

/// Envelope error types
#[derive(Error, Debug)]
pub enum EnvelopeError {
    // ═══════════════════════════════════════════════════════════════
    // KEY ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Invalid key: expected {expected} url-safe base64-encoded bytes")]
    InvalidKey { expected: usize },

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    // ═══════════════════════════════════════════════════════════════
    // TOKEN ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Wrong key, tampering and transport corruption all land here.
    #[error("Token authentication failed")]
    AuthenticationFailed,

    // ═══════════════════════════════════════════════════════════════
    // CONFIG / IO ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EnvelopeError {
    /// Check if this is a security-critical error
    pub fn is_security_critical(&self) -> bool {
        matches!(self, EnvelopeError::AuthenticationFailed)
    }

    pub(crate) fn invalid_token(reason: impl Into<String>) -> Self {
        EnvelopeError::InvalidToken(reason.into())
    }
}

impl From<serde_json::Error> for EnvelopeError {
    fn from(e: serde_json::Error) -> Self {
        EnvelopeError::Config(e.to_string())
    }
}

impl From<base64::DecodeError> for EnvelopeError {
    fn from(e: base64::DecodeError) -> Self {
        EnvelopeError::InvalidToken(format!("malformed base64: {}", e))
    }
}
