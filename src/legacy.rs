//! OpenSSL `Salted__` payloads, as produced by CryptoJS passphrase mode.
//!
//! Format: base64( "Salted__" || salt[8] || CBC/PKCS#7 ciphertext )
//! Key and IV come from EVP_BytesToKey with MD5 and a single iteration:
//!
//!   D_1 = MD5(passphrase || salt)
//!   D_i = MD5(D_{i-1} || passphrase || salt)
//!   key || iv = D_1 || D_2 || ...
//!
//! There is no integrity tag. A wrong passphrase is only detected when the
//! padding is invalid or the output is not UTF-8, so a small fraction of wrong
//! keys will still produce "valid" garbage.

use aes::Aes256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use des::Des;
use md5::{Digest, Md5};
use zeroize::Zeroizing;

use crate::aead::random;
use crate::algorithm::Algorithm;
use crate::error::{Error, Result};

pub const MAGIC: &[u8; 8] = b"Salted__";
pub const SALT_BYTES: usize = 8;

struct Geometry {
    key: usize,
    iv: usize,
}

fn geometry(algorithm: Algorithm) -> Result<Geometry> {
    match algorithm {
        Algorithm::Aes => Ok(Geometry { key: 32, iv: 16 }),
        Algorithm::Des => Ok(Geometry { key: 8, iv: 8 }),
        Algorithm::Rsa => Err(Error::UnsupportedAlgorithm(
            "RSA has no OpenSSL passphrase format".into(),
        )),
    }
}

/// OpenSSL EVP_BytesToKey (MD5, count = 1).
fn evp_bytes_to_key(passphrase: &[u8], salt: &[u8], len: usize) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(Vec::with_capacity(len + 16));
    let mut prev: Option<[u8; 16]> = None;
    while out.len() < len {
        let mut h = Md5::new();
        if let Some(p) = prev {
            h.update(p);
        }
        h.update(passphrase);
        h.update(salt);
        let block: [u8; 16] = h.finalize().into();
        out.extend_from_slice(&block);
        prev = Some(block);
    }
    out.truncate(len);
    out
}

/// Whether a decoded payload carries the OpenSSL magic.
pub fn is_openssl(raw: &[u8]) -> bool {
    raw.len() >= MAGIC.len() + SALT_BYTES && raw.starts_with(MAGIC)
}

pub(crate) fn seal_with_salt(
    algorithm: Algorithm,
    plaintext: &[u8],
    passphrase: &[u8],
    salt: &[u8; SALT_BYTES],
) -> Result<String> {
    let g = geometry(algorithm)?;
    let material = evp_bytes_to_key(passphrase, salt, g.key + g.iv);
    let (key, iv) = material.split_at(g.key);

    let ct = match algorithm {
        Algorithm::Aes => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|_| Error::EncryptionFailed)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        _ => cbc::Encryptor::<Des>::new_from_slices(key, iv)
            .map_err(|_| Error::EncryptionFailed)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    };

    let mut raw = Vec::with_capacity(MAGIC.len() + SALT_BYTES + ct.len());
    raw.extend_from_slice(MAGIC);
    raw.extend_from_slice(salt);
    raw.extend_from_slice(&ct);
    Ok(STANDARD.encode(raw))
}

/// Encrypt in the format the old web client reads.
pub fn seal_openssl(algorithm: Algorithm, plaintext: &[u8], passphrase: &[u8]) -> Result<String> {
    let salt: [u8; SALT_BYTES] = random()?;
    seal_with_salt(algorithm, plaintext, passphrase, &salt)
}

/// Decrypt already base64-decoded OpenSSL bytes.
pub(crate) fn open_raw(algorithm: Algorithm, raw: &[u8], passphrase: &[u8]) -> Result<Vec<u8>> {
    let g = geometry(algorithm)?;
    if !is_openssl(raw) {
        return Err(Error::DecryptionFailed);
    }
    let salt = &raw[MAGIC.len()..MAGIC.len() + SALT_BYTES];
    let ct = &raw[MAGIC.len() + SALT_BYTES..];
    let block = if algorithm == Algorithm::Aes { 16 } else { 8 };
    if ct.is_empty() || ct.len() % block != 0 {
        return Err(Error::DecryptionFailed);
    }

    let material = evp_bytes_to_key(passphrase, salt, g.key + g.iv);
    let (key, iv) = material.split_at(g.key);

    let pt = match algorithm {
        Algorithm::Aes => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|_| Error::DecryptionFailed)?
            .decrypt_padded_vec_mut::<Pkcs7>(ct),
        _ => cbc::Decryptor::<Des>::new_from_slices(key, iv)
            .map_err(|_| Error::DecryptionFailed)?
            .decrypt_padded_vec_mut::<Pkcs7>(ct),
    }
    .map_err(|_| Error::DecryptionFailed)?;

    // The only wrong-key signal this format offers.
    if core::str::from_utf8(&pt).is_err() {
        return Err(Error::DecryptionFailed);
    }
    Ok(pt)
}

/// Decrypt a base64 OpenSSL/CryptoJS string.
pub fn open_openssl(algorithm: Algorithm, encoded: &str, passphrase: &[u8]) -> Result<Vec<u8>> {
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|_| Error::DecryptionFailed)?;
    open_raw(algorithm, &raw, passphrase)
}
