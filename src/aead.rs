//! AES: passphrase -> Argon2id -> HKDF -> AES-256-GCM

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use getrandom::getrandom;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::kdf::{self, KdfParams};
use crate::wire::{self, GCM_NONCE_BYTES, SALT_BYTES, SUITE_AES256GCM};

/// Fill a fresh random buffer. Used during encryption only.
pub fn random<const N: usize>() -> Result<[u8; N]> {
    let mut n = [0u8; N];
    getrandom(&mut n).map_err(|_| Error::EncryptionFailed)?;
    Ok(n)
}

fn cipher_key(passphrase: &[u8], salt: &[u8], params: &KdfParams) -> Option<Zeroizing<[u8; 32]>> {
    let master = kdf::derive_master(passphrase, salt, params).ok()?;
    let mut key = Zeroizing::new([0u8; 32]);
    kdf::expand(master.as_slice(), b"|enc|", SUITE_AES256GCM, &mut key[..]).ok()?;
    Some(key)
}

/// Seal plaintext under a passphrase. Returns the full wire payload.
pub fn seal(passphrase: &[u8], plaintext: &[u8], params: &KdfParams) -> Result<Vec<u8>> {
    let salt: [u8; SALT_BYTES] = random()?;
    let nonce: [u8; GCM_NONCE_BYTES] = random()?;
    let key = cipher_key(passphrase, &salt, params).ok_or(Error::EncryptionFailed)?;

    let mut out = wire::encode_prefix(SUITE_AES256GCM, params, &salt, &nonce)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| Error::EncryptionFailed)?;
    let payload = Payload {
        msg: plaintext,
        aad: &out,
    };
    let ct = cipher
        .encrypt(Nonce::from_slice(&nonce), payload)
        .map_err(|_| Error::EncryptionFailed)?;
    out.extend_from_slice(&ct);
    Ok(out)
}

/// Open a parsed payload. Every failure is `DecryptionFailed`.
pub fn open(passphrase: &[u8], parts: &wire::WireComponents<'_>) -> Result<Vec<u8>> {
    if parts.suite != SUITE_AES256GCM {
        return Err(Error::DecryptionFailed);
    }
    let key = cipher_key(passphrase, parts.salt, &parts.kdf_params).ok_or(Error::DecryptionFailed)?;
    let cipher = Aes256Gcm::new_from_slice(key.as_slice()).map_err(|_| Error::DecryptionFailed)?;
    let payload = Payload {
        msg: parts.body,
        aad: parts.prefix,
    };
    cipher
        .decrypt(Nonce::from_slice(parts.iv), payload)
        .map_err(|_| Error::DecryptionFailed)
}
