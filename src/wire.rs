//! Wire format for passphrase-encrypted payloads (v1)
//!
//! Format (v1):
//!   version[1] || suite[1] || kdf[1] || flags[1]
//!   || m_cost[4] || t_cost[4] || p_cost[4]       (big-endian)
//!   || salt[16] || iv[12 | 8] || body
//!
//! AES-256-GCM body  = ct || tag[16]
//! DES-CBC-HMAC body = ct[8n, n >= 1] || hmac_sha256[32]

use crate::algorithm::Algorithm;
use crate::error::{Error, Result};
use crate::kdf::KdfParams;

/// Protocol identifier for KDF domain separation (v1)
pub const PROTOCOL_ID: &[u8] = b"bastion-env-v1";

/// Version byte for v1
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Suite identifiers (on-wire)
pub const SUITE_AES256GCM: u8 = 0xC1;
pub const SUITE_DES_CBC_HMAC_SHA256: u8 = 0xC2;

/// KDF identifiers (on-wire)
pub const KDF_ARGON2ID: u8 = 0x01;

/// Flags (reserved for future use)
pub const FLAGS_V1: u8 = 0x00;

// ---------------------------------------------------------------------------
// Component sizes
// ---------------------------------------------------------------------------

pub const SALT_BYTES: usize = 16;
pub const GCM_NONCE_BYTES: usize = 12;
pub const GCM_TAG_BYTES: usize = 16;
pub const DES_IV_BYTES: usize = 8;
pub const DES_BLOCK_BYTES: usize = 8;
pub const HMAC_TAG_BYTES: usize = 32;

/// version + suite + kdf + flags + three u32 cost parameters
pub const HEADER_BYTES: usize = 4 + 4 * 3; // 16

/// Everything before the body for each suite.
pub const AES_PREFIX_BYTES: usize = HEADER_BYTES + SALT_BYTES + GCM_NONCE_BYTES; // 44
pub const DES_PREFIX_BYTES: usize = HEADER_BYTES + SALT_BYTES + DES_IV_BYTES; // 40

/// Smallest valid payload per suite (empty plaintext still pads to one DES block).
pub const MIN_AES_BYTES: usize = AES_PREFIX_BYTES + GCM_TAG_BYTES;
pub const MIN_DES_BYTES: usize = DES_PREFIX_BYTES + DES_BLOCK_BYTES + HMAC_TAG_BYTES;

// ---------------------------------------------------------------------------
// Decoding limits (a header must not be able to demand unbounded work)
// ---------------------------------------------------------------------------

/// 256 MiB, about 13x the Argon2id default.
pub const MAX_MEMORY_KIB: u32 = 256 * 1024;
pub const MAX_ITERATIONS: u32 = 10;
pub const MAX_PARALLELISM: u32 = 8;

/// Map a symmetric algorithm to its on-wire suite byte.
pub fn suite_for(algorithm: Algorithm) -> Option<u8> {
    match algorithm {
        Algorithm::Aes => Some(SUITE_AES256GCM),
        Algorithm::Des => Some(SUITE_DES_CBC_HMAC_SHA256),
        Algorithm::Rsa => None,
    }
}

fn iv_len(suite: u8) -> Option<usize> {
    match suite {
        SUITE_AES256GCM => Some(GCM_NONCE_BYTES),
        SUITE_DES_CBC_HMAC_SHA256 => Some(DES_IV_BYTES),
        _ => None,
    }
}

/// Borrowed view of a parsed payload.
#[derive(Debug, Clone, Copy)]
pub struct WireComponents<'a> {
    pub version: u8,
    pub suite: u8,
    pub kdf: u8,
    pub flags: u8,
    pub kdf_params: KdfParams,
    pub salt: &'a [u8; SALT_BYTES],
    pub iv: &'a [u8],
    pub body: &'a [u8],
    /// header || salt || iv, authenticated alongside the body.
    pub prefix: &'a [u8],
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

pub fn decode_wire(data: &[u8]) -> Result<WireComponents<'_>> {
    if data.len() < HEADER_BYTES {
        return Err(Error::DecryptionFailed);
    }

    let version = data[0];
    let suite = data[1];
    let kdf = data[2];
    let flags = data[3];

    if version != PROTOCOL_VERSION || kdf != KDF_ARGON2ID || flags != FLAGS_V1 {
        return Err(Error::DecryptionFailed);
    }
    let iv_len = iv_len(suite).ok_or(Error::DecryptionFailed)?;

    let kdf_params = KdfParams {
        memory_kib: read_u32(data, 4),
        iterations: read_u32(data, 8),
        parallelism: read_u32(data, 12),
    };
    if kdf_params.memory_kib > MAX_MEMORY_KIB
        || kdf_params.iterations == 0
        || kdf_params.iterations > MAX_ITERATIONS
        || kdf_params.parallelism == 0
        || kdf_params.parallelism > MAX_PARALLELISM
    {
        return Err(Error::DecryptionFailed);
    }

    let min = match suite {
        SUITE_AES256GCM => MIN_AES_BYTES,
        _ => MIN_DES_BYTES,
    };
    if data.len() < min {
        return Err(Error::DecryptionFailed);
    }

    let salt_start = HEADER_BYTES;
    let iv_start = salt_start + SALT_BYTES;
    let body_start = iv_start + iv_len;

    let salt: &[u8; SALT_BYTES] = data[salt_start..iv_start]
        .try_into()
        .map_err(|_| Error::DecryptionFailed)?;

    Ok(WireComponents {
        version,
        suite,
        kdf,
        flags,
        kdf_params,
        salt,
        iv: &data[iv_start..body_start],
        body: &data[body_start..],
        prefix: &data[..body_start],
    })
}

/// Build `header || salt || iv`; the caller appends the body.
pub fn encode_prefix(
    suite: u8,
    params: &KdfParams,
    salt: &[u8; SALT_BYTES],
    iv: &[u8],
) -> Result<Vec<u8>> {
    if iv_len(suite) != Some(iv.len()) {
        return Err(Error::EncryptionFailed);
    }

    let mut out = Vec::with_capacity(HEADER_BYTES + SALT_BYTES + iv.len());
    out.push(PROTOCOL_VERSION);
    out.push(suite);
    out.push(KDF_ARGON2ID);
    out.push(FLAGS_V1);
    out.extend_from_slice(&params.memory_kib.to_be_bytes());
    out.extend_from_slice(&params.iterations.to_be_bytes());
    out.extend_from_slice(&params.parallelism.to_be_bytes());
    out.extend_from_slice(salt);
    out.extend_from_slice(iv);
    Ok(out)
}
