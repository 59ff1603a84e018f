//! RSA-OAEP with SHA-256. Single-shot, no chunking.

use rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::error::{Error, Result};

/// SHA-256 output size; OAEP spends two of these plus two bytes per block.
const HASH_BYTES: usize = 32;

/// Largest message OAEP-SHA256 can carry under `key` (190 bytes at 2048 bits).
pub fn max_payload(key: &RsaPublicKey) -> usize {
    key.size().saturating_sub(2 * HASH_BYTES + 2)
}

pub fn encrypt(key: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let max = max_payload(key);
    if plaintext.len() > max {
        return Err(Error::PayloadTooLarge {
            len: plaintext.len(),
            max,
        });
    }
    key.encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
        .map_err(|_| Error::EncryptionFailed)
}

pub fn decrypt(key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
    key.decrypt(Oaep::new::<Sha256>(), ciphertext)
        .map_err(|_| Error::DecryptionFailed)
}
