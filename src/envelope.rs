//! File Envelope - Boundary API
//!
//! `seal` and `open` never return `Err` and never panic on caller input: every
//! internal error becomes [`OperationResult::Failure`].
//!
//! ```rust,ignore
//! use file_envelope::{generate_key, seal, open};
//! use secrecy::ExposeSecret;
//!
//! let key = generate_key();
//! let sealed = seal(b"photo bytes", key.expose_secret(), "photo.jpg");
//! let token = sealed.payload().unwrap();
//!
//! let opened = open(token.as_bytes(), key.expose_secret(), sealed.filename().unwrap());
//! assert_eq!(opened.filename(), Some("photo.jpg"));
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::crypto::SymmetricKey;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::result::OperationResult;
use crate::token::{Token, TokenInfo};

/// Suffix appended to sealed files
pub const SEALED_SUFFIX: &str = ".enc";

// ═══════════════════════════════════════════════════════════════════════════
// FILENAME POLICY
// ═══════════════════════════════════════════════════════════════════════════

/// `name` + `.enc`, always exactly one suffix appended
pub fn sealed_filename(original_name: &str) -> String {
    format!("{}{}", original_name, SEALED_SUFFIX)
}

/// Strip exactly one trailing `.enc`, if present
pub fn opened_filename(sealed_name: &str) -> String {
    sealed_name
        .strip_suffix(SEALED_SUFFIX)
        .unwrap_or(sealed_name)
        .to_string()
}

// ═══════════════════════════════════════════════════════════════════════════
// SEAL / OPEN
// ═══════════════════════════════════════════════════════════════════════════

/// Seal file bytes under an encoded key
pub fn seal(plaintext: &[u8], key: &str, original_name: &str) -> OperationResult {
    let result = seal_inner(plaintext, key, original_name);
    if let Err(ref e) = result {
        tracing::debug!(name = original_name, error = %e, "seal failed");
    }
    result.into()
}

fn seal_inner(plaintext: &[u8], key: &str, original_name: &str) -> EnvelopeResult<(String, String)> {
    let key = SymmetricKey::from_encoded(key)?;
    let token = Token::seal(&key, plaintext);

    tracing::debug!(
        name = original_name,
        plaintext_len = plaintext.len(),
        token_len = token.as_bytes().len(),
        "sealed payload"
    );

    Ok((token.encode(), sealed_filename(original_name)))
}

/// Open a token (text form) under an encoded key
pub fn open(token: &[u8], key: &str, original_name: &str) -> OperationResult {
    let result = open_inner(token, key, original_name);
    if let Err(ref e) = result {
        tracing::debug!(name = original_name, error = %e, "open failed");
    }
    result.into()
}

fn open_inner(token: &[u8], key: &str, original_name: &str) -> EnvelopeResult<(String, String)> {
    let key = SymmetricKey::from_encoded(key)?;
    let token = Token::decode(token)?;
    let plaintext = zeroize::Zeroizing::new(token.open(&key)?);

    tracing::debug!(
        name = original_name,
        plaintext_len = plaintext.len(),
        "opened payload"
    );

    Ok((STANDARD.encode(&*plaintext), opened_filename(original_name)))
}

// ═══════════════════════════════════════════════════════════════════════════
// TEXT MODE
// ═══════════════════════════════════════════════════════════════════════════

/// Seal a UTF-8 string, returning the token text
pub fn seal_text(text: &str, key: &str) -> EnvelopeResult<String> {
    let key = SymmetricKey::from_encoded(key)?;
    Ok(Token::seal(&key, text.as_bytes()).encode())
}

/// Open a token produced by [`seal_text`]
pub fn open_text(token: &str, key: &str) -> EnvelopeResult<String> {
    let key = SymmetricKey::from_encoded(key)?;
    let plaintext = Token::decode(token.as_bytes())?.open(&key)?;
    String::from_utf8(plaintext)
        .map_err(|_| EnvelopeError::invalid_token("plaintext is not valid UTF-8"))
}

/// Authenticated metadata of a token
pub fn inspect(token: &[u8], key: &str) -> EnvelopeResult<TokenInfo> {
    let key = SymmetricKey::from_encoded(key)?;
    Token::decode(token)?.inspect(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{derive_key, generate_key};
    use secrecy::ExposeSecret;

    #[test]
    fn test_filename_policy() {
        assert_eq!(sealed_filename("a.txt"), "a.txt.enc");
        assert_eq!(sealed_filename("a.txt.enc"), "a.txt.enc.enc");
        assert_eq!(sealed_filename(""), ".enc");

        assert_eq!(opened_filename("a.txt.enc"), "a.txt");
        assert_eq!(opened_filename("a.txt.enc.enc"), "a.txt.enc");
        assert_eq!(opened_filename("a.txt"), "a.txt");
        assert_eq!(opened_filename("a.ENC"), "a.ENC");
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = generate_key();
        let sealed = seal(b"file body", key.expose_secret(), "notes.md");

        assert!(sealed.is_success());
        assert_eq!(sealed.filename(), Some("notes.md.enc"));

        let opened = open(
            sealed.payload().unwrap().as_bytes(),
            key.expose_secret(),
            sealed.filename().unwrap(),
        );
        assert_eq!(opened.payload(), Some(STANDARD.encode(b"file body").as_str()));
        assert_eq!(opened.filename(), Some("notes.md"));
    }

    #[test]
    fn test_bad_key_is_failure_not_panic() {
        let sealed = seal(b"data", "short", "x");
        assert!(!sealed.is_success());
        assert!(sealed.error().unwrap().contains("Invalid key"));

        let opened = open(b"anything", "", "x.enc");
        assert!(!opened.is_success());
    }

    #[test]
    fn test_open_garbage_is_failure() {
        let key = generate_key();
        let result = open(b"@@@@", key.expose_secret(), "x.enc");
        assert!(result.error().unwrap().starts_with("Invalid token"));

        let short = STANDARD.encode([0x80u8; 10]);
        let result = open(short.as_bytes(), key.expose_secret(), "x.enc");
        assert!(result.error().unwrap().starts_with("Invalid token"));
    }

    #[test]
    fn test_scenario_with_derived_keys() {
        let k = derive_key("correct horse", Some(&[0u8; 16][..])).unwrap();
        let sealed = seal(b"hello", k.key.expose_secret(), "a.txt");
        assert_eq!(sealed.filename(), Some("a.txt.enc"));

        let token = sealed.payload().unwrap().as_bytes();
        let opened = open(token, k.key.expose_secret(), "a.txt.enc");
        let plaintext = STANDARD.decode(opened.payload().unwrap()).unwrap();
        assert_eq!(plaintext, b"hello");
        assert_eq!(opened.filename(), Some("a.txt"));

        let other = derive_key("correct horse", Some(&[1u8; 16][..])).unwrap();
        let rejected = open(token, other.key.expose_secret(), "a.txt.enc");
        assert_eq!(rejected.error(), Some("Token authentication failed"));
    }

    #[test]
    fn test_text_mode() {
        let key = generate_key();
        let token = seal_text("zażółć gęślą jaźń", key.expose_secret()).unwrap();
        assert_eq!(
            open_text(&token, key.expose_secret()).unwrap(),
            "zażółć gęślą jaźń"
        );

        let binary = seal(&[0xC3, 0x28], key.expose_secret(), "bin");
        assert!(matches!(
            open_text(binary.payload().unwrap(), key.expose_secret()),
            Err(EnvelopeError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_inspect_requires_key() {
        let key = generate_key();
        let token = seal_text("meta", key.expose_secret()).unwrap();

        let info = inspect(token.as_bytes(), key.expose_secret()).unwrap();
        assert_eq!(info.ciphertext_len, 16);
        assert!(inspect(token.as_bytes(), generate_key().expose_secret()).is_err());
    }
}
