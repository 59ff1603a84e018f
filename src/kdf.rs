//! KDF (v1)
//!
//! master = Argon2id(passphrase, salt, m_cost, t_cost, p_cost, len=32)
//! info   = PROTOCOL_ID || b"|enc|" || suite        (cipher key)
//!        | PROTOCOL_ID || b"|mac|" || suite        (HMAC key, DES only)
//! key    = HKDF-SHA256(master, salt=None, info=info, len)

use argon2::{Argon2, Params, Version};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::wire::{MAX_ITERATIONS, MAX_MEMORY_KIB, MAX_PARALLELISM, PROTOCOL_ID};

pub const MASTER_KEY_BYTES: usize = 32;

/// Argon2id cost parameters. Written into every payload header so decryption
/// never has to guess them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl KdfParams {
    /// Cheapest parameters Argon2 accepts. Tests and fuzzing only.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn to_argon2(self) -> core::result::Result<Params, argon2::Error> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(MASTER_KEY_BYTES),
        )
    }

    /// Argon2 accepts the parameters and they fit the header's decode limits.
    pub fn validate(&self) -> Result<()> {
        if self.memory_kib > MAX_MEMORY_KIB
            || self.iterations > MAX_ITERATIONS
            || self.parallelism > MAX_PARALLELISM
        {
            return Err(Error::InvalidKey(format!(
                "kdf parameters: above limits \
                 (m <= {MAX_MEMORY_KIB} KiB, t <= {MAX_ITERATIONS}, p <= {MAX_PARALLELISM})"
            )));
        }
        self.to_argon2()
            .map(|_| ())
            .map_err(|e| Error::InvalidKey(format!("kdf parameters: {e}")))
    }
}

/// Stretch a passphrase into a 32-byte master secret.
pub fn derive_master(
    passphrase: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> core::result::Result<Zeroizing<[u8; MASTER_KEY_BYTES]>, argon2::Error> {
    let argon = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params.to_argon2()?);
    let mut out = Zeroizing::new([0u8; MASTER_KEY_BYTES]);
    argon.hash_password_into(passphrase, salt, &mut out[..])?;
    Ok(out)
}

/// Expand the master secret into a purpose-bound subkey.
pub fn expand(master: &[u8], label: &[u8], suite: u8, out: &mut [u8]) -> Result<()> {
    let mut info = Vec::with_capacity(PROTOCOL_ID.len() + label.len() + 1);
    info.extend_from_slice(PROTOCOL_ID);
    info.extend_from_slice(label);
    info.push(suite);

    let hk = Hkdf::<Sha256>::new(None, master);
    hk.expand(&info, out).map_err(|_| Error::EncryptionFailed)
}
