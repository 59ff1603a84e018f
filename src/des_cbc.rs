//! DES: passphrase -> Argon2id -> HKDF -> DES-CBC/PKCS#7, then HMAC-SHA256
//! over `header || salt || iv || ct` (encrypt-then-MAC).

use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::aead::random;
use crate::error::{Error, Result};
use crate::kdf::{self, KdfParams};
use crate::wire::{
    self, DES_BLOCK_BYTES, DES_IV_BYTES, HMAC_TAG_BYTES, SALT_BYTES, SUITE_DES_CBC_HMAC_SHA256,
};

type DesCbcEnc = cbc::Encryptor<des::Des>;
type DesCbcDec = cbc::Decryptor<des::Des>;
type HmacSha256 = Hmac<Sha256>;

pub const DES_KEY_BYTES: usize = 8;

struct DesKeys {
    cipher: Zeroizing<[u8; DES_KEY_BYTES]>,
    mac: Zeroizing<[u8; 32]>,
}

fn derive(passphrase: &[u8], salt: &[u8], params: &KdfParams) -> Option<DesKeys> {
    let master = kdf::derive_master(passphrase, salt, params).ok()?;
    let mut keys = DesKeys {
        cipher: Zeroizing::new([0u8; DES_KEY_BYTES]),
        mac: Zeroizing::new([0u8; 32]),
    };
    kdf::expand(master.as_slice(), b"|enc|", SUITE_DES_CBC_HMAC_SHA256, &mut keys.cipher[..]).ok()?;
    kdf::expand(master.as_slice(), b"|mac|", SUITE_DES_CBC_HMAC_SHA256, &mut keys.mac[..]).ok()?;
    Some(keys)
}

fn mac(key: &[u8], data: &[u8]) -> Option<HmacSha256> {
    let mut m = HmacSha256::new_from_slice(key).ok()?;
    m.update(data);
    Some(m)
}

pub fn seal(passphrase: &[u8], plaintext: &[u8], params: &KdfParams) -> Result<Vec<u8>> {
    let salt: [u8; SALT_BYTES] = random()?;
    let iv: [u8; DES_IV_BYTES] = random()?;
    let keys = derive(passphrase, &salt, params).ok_or(Error::EncryptionFailed)?;

    let ct = DesCbcEnc::new_from_slices(keys.cipher.as_slice(), &iv)
        .map_err(|_| Error::EncryptionFailed)?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut out = wire::encode_prefix(SUITE_DES_CBC_HMAC_SHA256, params, &salt, &iv)?;
    out.extend_from_slice(&ct);
    let tag = mac(keys.mac.as_slice(), &out)
        .ok_or(Error::EncryptionFailed)?
        .finalize()
        .into_bytes();
    out.extend_from_slice(&tag);
    Ok(out)
}

pub fn open(passphrase: &[u8], parts: &wire::WireComponents<'_>) -> Result<Vec<u8>> {
    if parts.suite != SUITE_DES_CBC_HMAC_SHA256
        || parts.body.len() < DES_BLOCK_BYTES + HMAC_TAG_BYTES
    {
        return Err(Error::DecryptionFailed);
    }
    let (ct, tag) = parts.body.split_at(parts.body.len() - HMAC_TAG_BYTES);
    if ct.len() % DES_BLOCK_BYTES != 0 {
        return Err(Error::DecryptionFailed);
    }

    let keys = derive(passphrase, parts.salt, &parts.kdf_params).ok_or(Error::DecryptionFailed)?;

    // MAC first: nothing is decrypted unless the whole payload authenticates.
    let mut m = mac(keys.mac.as_slice(), parts.prefix).ok_or(Error::DecryptionFailed)?;
    m.update(ct);
    m.verify_slice(tag).map_err(|_| Error::DecryptionFailed)?;

    DesCbcDec::new_from_slices(keys.cipher.as_slice(), parts.iv)
        .map_err(|_| Error::DecryptionFailed)?
        .decrypt_padded_vec_mut::<Pkcs7>(ct)
        .map_err(|_| Error::DecryptionFailed)
}
