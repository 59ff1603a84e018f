//! Key material: passphrases and RSA key pairs.
//!
//! Nothing here is persisted. Callers own the association between a key and
//! the artifacts it protects.

use core::fmt;

use rand_core::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::algorithm::{Algorithm, KeyFamily};
use crate::error::{Error, Result};

/// RSA modulus size for generated keys.
pub const RSA_KEY_BITS: usize = 2048;

/// RSA public exponent for generated keys.
pub const RSA_PUBLIC_EXPONENT: u64 = 65537;

// ---------------------------------------------------------------------------
// Passphrase
// ---------------------------------------------------------------------------

/// A symmetric secret. Zeroized on drop, never printed.
#[derive(Clone)]
pub struct Passphrase(Zeroizing<String>);

impl Passphrase {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(<redacted>)")
    }
}

impl PartialEq for Passphrase {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Passphrase {}

/// Generate a random passphrase: a UUID v4 in hyphenated form (122 random bits).
pub fn generate_symmetric_key() -> Passphrase {
    Passphrase(Zeroizing::new(uuid::Uuid::new_v4().hyphenated().to_string()))
}

/// Accept a user-typed secret. Empty or whitespace-only input is rejected;
/// anything else is kept exactly as typed.
pub fn accept_user_secret(input: &str) -> Result<Passphrase> {
    if input.trim().is_empty() {
        return Err(Error::InvalidKey("passphrase must not be empty".into()));
    }
    Ok(Passphrase(Zeroizing::new(input.to_owned())))
}

// ---------------------------------------------------------------------------
// RSA
// ---------------------------------------------------------------------------

/// A freshly generated key pair, PEM-encoded.
///
/// The public key is SPKI (`BEGIN PUBLIC KEY`); the private key is PKCS#1
/// (`BEGIN RSA PRIVATE KEY`).
#[derive(Clone)]
pub struct RsaKeyPair {
    pub public_pem: String,
    pub private_pem: Zeroizing<String>,
}

impl fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKeyPair")
            .field("public_pem", &self.public_pem)
            .field("private_pem", &"<redacted>")
            .finish()
    }
}

/// Generate a 2048-bit RSA key pair with e = 65537.
///
/// CPU-bound (hundreds of milliseconds to seconds). Interactive callers should
/// run it off their event loop; see `bastion_store::keygen`.
pub fn generate_rsa_keypair() -> Result<RsaKeyPair> {
    let exp = BigUint::from(RSA_PUBLIC_EXPONENT);
    let private = RsaPrivateKey::new_with_exp(&mut OsRng, RSA_KEY_BITS, &exp)
        .map_err(|e| Error::KeyGeneration(e.to_string()))?;
    let public = RsaPublicKey::from(&private);

    let public_pem = public
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| Error::KeyGeneration(e.to_string()))?;
    let private_pem = private
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| Error::KeyGeneration(e.to_string()))?;

    tracing::debug!(bits = RSA_KEY_BITS, "generated rsa key pair");
    Ok(RsaKeyPair {
        public_pem,
        private_pem,
    })
}

pub(crate) fn parse_public_pem(pem: &str) -> Result<RsaPublicKey> {
    let pem = pem.trim();
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|_| Error::InvalidKey("unrecognized RSA public key PEM".into()))
}

pub(crate) fn parse_private_pem(pem: &str) -> Result<RsaPrivateKey> {
    let pem = pem.trim();
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|_| Error::InvalidKey("unrecognized RSA private key PEM".into()))
}

/// Parsed RSA keys. Either half may be absent; a private key implies its
/// public key.
#[derive(Clone)]
pub struct RsaKeys {
    public: Option<RsaPublicKey>,
    private: Option<RsaPrivateKey>,
}

impl RsaKeys {
    pub fn public(&self) -> Option<&RsaPublicKey> {
        self.public.as_ref()
    }

    pub fn private(&self) -> Option<&RsaPrivateKey> {
        self.private.as_ref()
    }
}

impl fmt::Debug for RsaKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKeys")
            .field("public", &self.public.is_some())
            .field("private", &self.private.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// KeyMaterial
// ---------------------------------------------------------------------------

/// The secret or key pair handed to the engines on every call.
#[derive(Clone, Debug)]
pub enum KeyMaterial {
    Symmetric {
        algorithm: Algorithm,
        secret: Passphrase,
    },
    Rsa(RsaKeys),
}

impl KeyMaterial {
    /// Wrap a passphrase for AES or DES.
    pub fn symmetric(algorithm: Algorithm, secret: Passphrase) -> Result<Self> {
        match algorithm.family() {
            KeyFamily::Symmetric => Ok(Self::Symmetric { algorithm, secret }),
            KeyFamily::Asymmetric => Err(Error::InvalidKey(format!(
                "{algorithm} does not take a passphrase"
            ))),
        }
    }

    /// Parse PEM input. At least one half must be supplied.
    pub fn rsa_from_pem(public_pem: Option<&str>, private_pem: Option<&str>) -> Result<Self> {
        let private = private_pem.map(parse_private_pem).transpose()?;
        let public = match public_pem {
            Some(pem) => Some(parse_public_pem(pem)?),
            None => private.as_ref().map(RsaPublicKey::from),
        };
        if public.is_none() {
            return Err(Error::MissingKey("no RSA public or private key supplied"));
        }
        Ok(Self::Rsa(RsaKeys { public, private }))
    }

    pub fn from_keypair(pair: &RsaKeyPair) -> Result<Self> {
        Self::rsa_from_pem(Some(&pair.public_pem), Some(pair.private_pem.as_str()))
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Symmetric { algorithm, .. } => *algorithm,
            Self::Rsa(_) => Algorithm::Rsa,
        }
    }

    pub fn family(&self) -> KeyFamily {
        self.algorithm().family()
    }
}
