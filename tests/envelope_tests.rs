use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use file_envelope::{
    derive_key, generate_key, open, open_text, seal, seal_text, EnvelopeError, OperationRecord,
    OperationResult, Token,
};
use proptest::prelude::*;
use secrecy::ExposeSecret;

fn opened_bytes(result: &OperationResult) -> Vec<u8> {
    STANDARD
        .decode(result.payload().expect("expected success"))
        .unwrap()
}

#[test]
fn password_scenario_roundtrip() {
    let derived = derive_key("correct horse", Some(&[0u8; 16][..])).unwrap();
    let key = derived.key.expose_secret();

    let sealed = seal(b"hello", key, "a.txt");
    assert!(sealed.is_success());
    assert_eq!(sealed.filename(), Some("a.txt.enc"));

    let opened = open(sealed.payload().unwrap().as_bytes(), key, sealed.filename().unwrap());
    assert_eq!(opened_bytes(&opened), b"hello");
    assert_eq!(opened.filename(), Some("a.txt"));

    let other = derive_key("battery staple", Some(&[0u8; 16][..])).unwrap();
    let failed = open(
        sealed.payload().unwrap().as_bytes(),
        other.key.expose_secret(),
        "a.txt.enc",
    );
    assert!(!failed.is_success());
    assert_eq!(failed.error(), Some("Token authentication failed"));
}

#[test]
fn same_password_and_salt_give_same_key() {
    let a = derive_key("correct horse", Some(&[7u8; 16][..])).unwrap();
    let b = derive_key("correct horse", Some(&a.salt.as_bytes()[..])).unwrap();
    assert_eq!(a.key.expose_secret(), b.key.expose_secret());

    let fresh = derive_key("correct horse", None).unwrap();
    assert_eq!(fresh.salt.as_bytes().len(), 16);
    assert_ne!(fresh.key.expose_secret(), a.key.expose_secret());
}

#[test]
fn empty_payload_roundtrip() {
    let key = generate_key();
    let sealed = seal(b"", key.expose_secret(), "empty");
    let opened = open(
        sealed.payload().unwrap().as_bytes(),
        key.expose_secret(),
        sealed.filename().unwrap(),
    );
    assert!(opened_bytes(&opened).is_empty());
    assert_eq!(opened.filename(), Some("empty"));
}

#[test]
fn filename_policy_at_boundary() {
    let key = generate_key();
    let sealed = seal(b"x", key.expose_secret(), "report.enc");
    assert_eq!(sealed.filename(), Some("report.enc.enc"));

    let token = sealed.payload().unwrap().as_bytes();
    assert_eq!(
        open(token, key.expose_secret(), "report.enc.enc").filename(),
        Some("report.enc")
    );
    assert_eq!(
        open(token, key.expose_secret(), "renamed.bin").filename(),
        Some("renamed.bin")
    );
}

#[test]
fn url_safe_token_text_is_accepted() {
    let key = generate_key();
    let sealed = seal(&[0xfb; 64], key.expose_secret(), "blob");
    let raw = STANDARD.decode(sealed.payload().unwrap()).unwrap();
    let url_safe = URL_SAFE.encode(raw);

    let opened = open(url_safe.as_bytes(), key.expose_secret(), "blob.enc");
    assert_eq!(opened_bytes(&opened), vec![0xfb; 64]);
}

#[test]
fn bad_inputs_become_failures() {
    let key = generate_key();

    let bad_key = seal(b"data", "not-a-key", "f");
    assert!(bad_key.error().unwrap().starts_with("Invalid key"));

    let garbage = open(b"%%%not base64%%%", key.expose_secret(), "f.enc");
    assert!(garbage.error().unwrap().starts_with("Invalid token"));

    let short = open(STANDARD.encode([0x80; 10]).as_bytes(), key.expose_secret(), "f.enc");
    assert!(short.error().unwrap().starts_with("Invalid token"));
}

#[test]
fn failure_record_shape() {
    let record = OperationRecord::from(open(b"", "", "x.enc"));
    let json = serde_json::to_value(&record).unwrap();

    assert_eq!(json["success"], false);
    assert!(json["data"].is_null());
    assert!(json["filename"].is_null());
    assert!(json["error"].as_str().is_some());
}

#[test]
fn text_mode_roundtrip() {
    let key = generate_key();
    let token = seal_text("zażółć gęślą jaźń", key.expose_secret()).unwrap();
    assert_eq!(
        open_text(&token, key.expose_secret()).unwrap(),
        "zażółć gęślą jaźń"
    );

    let other = generate_key();
    assert!(matches!(
        open_text(&token, other.expose_secret()),
        Err(EnvelopeError::AuthenticationFailed)
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn seal_open_roundtrip(plaintext in proptest::collection::vec(any::<u8>(), 0..512)) {
        let key = generate_key();
        let sealed = seal(&plaintext, key.expose_secret(), "p.bin");
        let opened = open(sealed.payload().unwrap().as_bytes(), key.expose_secret(), "p.bin.enc");

        prop_assert_eq!(opened_bytes(&opened), plaintext);
        prop_assert_eq!(opened.filename(), Some("p.bin"));
    }

    #[test]
    fn any_single_bit_flip_fails(
        plaintext in proptest::collection::vec(any::<u8>(), 0..128),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8
    ) {
        let key = generate_key();
        let sealed = seal(&plaintext, key.expose_secret(), "p.bin");
        let mut raw = Token::decode(sealed.payload().unwrap().as_bytes()).unwrap().into_bytes();

        let i = position.index(raw.len());
        raw[i] ^= 1 << bit;

        let opened = open(STANDARD.encode(&raw).as_bytes(), key.expose_secret(), "p.bin.enc");
        prop_assert!(!opened.is_success());
    }
}
