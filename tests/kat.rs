//! Known answers: OpenSSL/CryptoJS `Salted__` payloads and v1 wire layout.

use bastion_envelope::legacy::{open_openssl, seal_openssl};
use bastion_envelope::wire::{
    self, AES_PREFIX_BYTES, DES_PREFIX_BYTES, FLAGS_V1, GCM_TAG_BYTES, HMAC_TAG_BYTES, KDF_ARGON2ID,
    MIN_AES_BYTES, PROTOCOL_VERSION, SUITE_AES256GCM, SUITE_DES_CBC_HMAC_SHA256,
};
use bastion_envelope::{
    accept_user_secret, inspect, Algorithm, EncryptedArtifact, Engine, Error, KdfParams,
    KeyMaterial, PayloadFormat,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;

const PASS: &str = "correct-horse-battery-staple";

// echo -n "hello world" | openssl enc -aes-256-cbc -md md5 -S 0102030405060708 \
//     -pass pass:correct-horse-battery-staple, prefixed with "Salted__" || salt
const OPENSSL_AES: &str = "U2FsdGVkX18BAgMEBQYHCBriapLBt7guoORRdNM8x64=";
// same, -des-cbc
const OPENSSL_DES: &str = "U2FsdGVkX18BAgMEBQYHCIqVXbB+DF41e/dk99Ee5Qw=";

fn key(algorithm: Algorithm, secret: &str) -> KeyMaterial {
    KeyMaterial::symmetric(algorithm, accept_user_secret(secret).unwrap()).unwrap()
}

fn legacy_artifact(algorithm: Algorithm, ciphertext: &str) -> EncryptedArtifact {
    EncryptedArtifact::new(ciphertext.into(), algorithm, "photo.png.encrypted", 11, Utc::now())
}

#[test]
fn engine_opens_cryptojs_payloads() {
    let eng = Engine::new();
    let aes = legacy_artifact(Algorithm::Aes, OPENSSL_AES);
    let des = legacy_artifact(Algorithm::Des, OPENSSL_DES);
    assert_eq!(eng.decrypt(&aes, &key(Algorithm::Aes, PASS)).unwrap(), b"hello world");
    assert_eq!(eng.decrypt(&des, &key(Algorithm::Des, PASS)).unwrap(), b"hello world");
}

#[test]
fn cryptojs_payload_under_wrong_algorithm_fails() {
    let eng = Engine::new();
    let mislabelled = legacy_artifact(Algorithm::Des, OPENSSL_AES);
    assert_eq!(
        eng.decrypt(&mislabelled, &key(Algorithm::Des, PASS)),
        Err(Error::DecryptionFailed)
    );
}

#[test]
fn cryptojs_wrong_passphrase_fails() {
    // Unauthenticated format: rejection relies on padding + UTF-8 checks.
    // These specific wrong keys are known to be rejected.
    for wrong in ["wrong", "correct-horse-battery-stapl", "Correct-horse-battery-staple"] {
        assert_eq!(
            open_openssl(Algorithm::Aes, OPENSSL_AES, wrong.as_bytes()),
            Err(Error::DecryptionFailed),
            "{wrong}"
        );
    }
}

#[test]
fn openssl_export_roundtrip() {
    for algorithm in [Algorithm::Aes, Algorithm::Des] {
        let b64 = seal_openssl(algorithm, b"export me", b"pw").unwrap();
        assert!(b64.starts_with("U2FsdGVkX1"));
        assert_eq!(open_openssl(algorithm, &b64, b"pw").unwrap(), b"export me");
    }
}

#[test]
fn inspect_reports_format() {
    let openssl = inspect(&legacy_artifact(Algorithm::Aes, OPENSSL_AES)).unwrap();
    assert_eq!(openssl.format, PayloadFormat::OpenSsl);
    assert!(openssl.kdf.is_none());

    let eng = Engine::with_kdf_params(KdfParams::insecure_fast());
    let v1 = eng.encrypt(b"abc", &key(Algorithm::Des, "pw"), Algorithm::Des).unwrap();
    let info = inspect(&v1).unwrap();
    assert_eq!(info.format, PayloadFormat::V1);
    assert_eq!(info.suite, "DES-CBC-HMAC-SHA256");
    assert_eq!(info.kdf, Some(KdfParams::insecure_fast()));
    assert_eq!(info.source_size, 3);
    assert!(info.to_string().contains("argon2id"));
}

#[test]
fn test_wire_format_structure() {
    let eng = Engine::with_kdf_params(KdfParams::insecure_fast());

    let aes = eng.encrypt(b"", &key(Algorithm::Aes, "pw"), Algorithm::Aes).unwrap();
    let aes_raw = STANDARD.decode(aes.ciphertext()).unwrap();
    assert_eq!(aes_raw.len(), MIN_AES_BYTES);
    let parts = wire::decode_wire(&aes_raw).unwrap();
    assert_eq!(parts.version, PROTOCOL_VERSION);
    assert_eq!(parts.suite, SUITE_AES256GCM);
    assert_eq!(parts.kdf, KDF_ARGON2ID);
    assert_eq!(parts.flags, FLAGS_V1);
    assert_eq!(parts.body.len(), GCM_TAG_BYTES);
    assert_eq!(parts.prefix.len(), AES_PREFIX_BYTES);

    let des = eng.encrypt(b"1234567", &key(Algorithm::Des, "pw"), Algorithm::Des).unwrap();
    let des_raw = STANDARD.decode(des.ciphertext()).unwrap();
    let parts = wire::decode_wire(&des_raw).unwrap();
    assert_eq!(parts.suite, SUITE_DES_CBC_HMAC_SHA256);
    assert_eq!(parts.iv.len(), 8);
    assert_eq!(des_raw.len(), DES_PREFIX_BYTES + 8 + HMAC_TAG_BYTES);
}
