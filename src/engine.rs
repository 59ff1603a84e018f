//! Encryption and decryption engines.

use core::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;

use crate::algorithm::Algorithm;
use crate::artifact::EncryptedArtifact;
use crate::error::{Error, Result};
use crate::kdf::KdfParams;
use crate::keys::{KeyMaterial, Passphrase};
use crate::wire::{self, SUITE_AES256GCM, SUITE_DES_CBC_HMAC_SHA256};
use crate::{aead, des_cbc, legacy, oaep};

/// Encryption engine.
///
/// Holds only the Argon2id cost parameters used for new symmetric artifacts;
/// decryption reads the parameters from each payload's header.
///
/// # Example
///
/// ```
/// use bastion_envelope::{accept_user_secret, Algorithm, Engine, KdfParams, KeyMaterial};
///
/// let engine = Engine::with_kdf_params(KdfParams::insecure_fast());
/// let key = KeyMaterial::symmetric(Algorithm::Aes, accept_user_secret("pw")?)?;
///
/// let artifact = engine.encrypt_named(b"secret data", "notes.txt", &key, Algorithm::Aes)?;
/// assert_eq!(engine.decrypt(&artifact, &key)?, b"secret data");
/// # Ok::<(), bastion_envelope::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Engine {
    kdf: KdfParams,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kdf_params(kdf: KdfParams) -> Self {
        Self { kdf }
    }

    pub fn kdf_params(&self) -> &KdfParams {
        &self.kdf
    }

    /// Encrypt with no original file name recorded.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        key: &KeyMaterial,
        algorithm: Algorithm,
    ) -> Result<EncryptedArtifact> {
        self.encrypt_named(plaintext, "", key, algorithm)
    }

    /// Encrypt plaintext and wrap it in an envelope.
    ///
    /// # Errors
    ///
    /// - `KeyAlgorithmMismatch` if the key family does not fit `algorithm`
    /// - `MissingKey` if RSA key material has no public half
    /// - `PayloadTooLarge` if an RSA message exceeds the OAEP limit
    pub fn encrypt_named(
        &self,
        plaintext: &[u8],
        original_name: &str,
        key: &KeyMaterial,
        algorithm: Algorithm,
    ) -> Result<EncryptedArtifact> {
        check_family(algorithm, key)?;

        let raw = match (algorithm, key) {
            (Algorithm::Aes, KeyMaterial::Symmetric { secret, .. }) => {
                self.kdf.validate()?;
                aead::seal(secret.as_bytes(), plaintext, &self.kdf)?
            }
            (Algorithm::Des, KeyMaterial::Symmetric { secret, .. }) => {
                self.kdf.validate()?;
                des_cbc::seal(secret.as_bytes(), plaintext, &self.kdf)?
            }
            (Algorithm::Rsa, KeyMaterial::Rsa(keys)) => {
                let public = keys
                    .public()
                    .ok_or(Error::MissingKey("RSA encryption needs a public key"))?;
                oaep::encrypt(public, plaintext)?
            }
            _ => return Err(mismatch(algorithm, key)),
        };

        tracing::debug!(
            algorithm = %algorithm,
            plaintext_bytes = plaintext.len(),
            ciphertext_bytes = raw.len(),
            "encrypted artifact"
        );

        Ok(EncryptedArtifact::new(
            STANDARD.encode(raw),
            algorithm,
            original_name,
            plaintext.len() as u64,
            Utc::now(),
        ))
    }

    /// Decrypt an artifact with caller-supplied key material.
    ///
    /// # Error Behavior
    ///
    /// Wrong key, tampered or truncated ciphertext, and header/algorithm
    /// disagreement all return the same `DecryptionFailed`.
    pub fn decrypt(&self, artifact: &EncryptedArtifact, key: &KeyMaterial) -> Result<Vec<u8>> {
        let algorithm = artifact.algorithm();
        check_family(algorithm, key)?;

        let raw = STANDARD
            .decode(artifact.ciphertext().trim())
            .map_err(|_| Error::DecryptionFailed)?;

        let result = match key {
            KeyMaterial::Symmetric { secret, .. } => open_symmetric(algorithm, &raw, secret),
            KeyMaterial::Rsa(keys) => {
                let private = keys
                    .private()
                    .ok_or(Error::MissingKey("RSA decryption needs a private key"))?;
                oaep::decrypt(private, &raw)
            }
        };

        match &result {
            Ok(pt) => tracing::debug!(
                algorithm = %algorithm,
                plaintext_bytes = pt.len(),
                "decrypted artifact"
            ),
            Err(e) => tracing::debug!(algorithm = %algorithm, error = %e, "decryption rejected"),
        }
        result
    }
}

fn open_symmetric(algorithm: Algorithm, raw: &[u8], secret: &Passphrase) -> Result<Vec<u8>> {
    if legacy::is_openssl(raw) {
        return legacy::open_raw(algorithm, raw, secret.as_bytes());
    }
    let parts = wire::decode_wire(raw)?;
    if Some(parts.suite) != wire::suite_for(algorithm) {
        return Err(Error::DecryptionFailed);
    }
    match algorithm {
        Algorithm::Aes => aead::open(secret.as_bytes(), &parts),
        Algorithm::Des => des_cbc::open(secret.as_bytes(), &parts),
        Algorithm::Rsa => Err(Error::DecryptionFailed),
    }
}

fn check_family(algorithm: Algorithm, key: &KeyMaterial) -> Result<()> {
    if algorithm.family() != key.family() {
        return Err(mismatch(algorithm, key));
    }
    Ok(())
}

fn mismatch(algorithm: Algorithm, key: &KeyMaterial) -> Error {
    Error::KeyAlgorithmMismatch {
        artifact: algorithm,
        key: key.algorithm(),
    }
}

// ---------------------------------------------------------------------------
// Free-function contract
// ---------------------------------------------------------------------------

/// `encrypt(plaintext, key, algorithm)` with default KDF costs.
pub fn encrypt(
    plaintext: &[u8],
    key: &KeyMaterial,
    algorithm: Algorithm,
) -> Result<EncryptedArtifact> {
    Engine::new().encrypt(plaintext, key, algorithm)
}

/// `decrypt(artifact, key)`.
pub fn decrypt(artifact: &EncryptedArtifact, key: &KeyMaterial) -> Result<Vec<u8>> {
    Engine::new().decrypt(artifact, key)
}

// ---------------------------------------------------------------------------
// Inspection utilities (for ops/debugging)
// ---------------------------------------------------------------------------

/// How an artifact's ciphertext is laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadFormat {
    /// Bastion v1 authenticated payload.
    V1,
    /// OpenSSL `Salted__` (CryptoJS) payload, unauthenticated.
    OpenSsl,
    /// Raw RSA-OAEP block.
    RsaOaep,
}

/// Artifact metadata, extracted without a key.
#[derive(Clone, Debug)]
pub struct ArtifactInfo {
    pub format: PayloadFormat,
    pub suite: &'static str,
    /// Argon2id costs, for v1 payloads.
    pub kdf: Option<KdfParams>,
    pub ciphertext_bytes: usize,
    pub source_size: u64,
}

impl fmt::Display for ArtifactInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} | {} | {} ciphertext bytes ({} plaintext)",
            self.format, self.suite, self.ciphertext_bytes, self.source_size
        )?;
        if let Some(k) = &self.kdf {
            write!(f, " | argon2id m={}KiB t={} p={}", k.memory_kib, k.iterations, k.parallelism)?;
        }
        Ok(())
    }
}

/// Inspect an artifact without decrypting. Does NOT reveal secret information.
pub fn inspect(artifact: &EncryptedArtifact) -> Result<ArtifactInfo> {
    let raw = STANDARD
        .decode(artifact.ciphertext().trim())
        .map_err(|_| Error::DecryptionFailed)?;

    let (format, suite, kdf) = match artifact.algorithm() {
        Algorithm::Rsa => (PayloadFormat::RsaOaep, "RSA-OAEP-SHA256", None),
        Algorithm::Aes if legacy::is_openssl(&raw) => {
            (PayloadFormat::OpenSsl, "AES-256-CBC (EVP_BytesToKey)", None)
        }
        Algorithm::Des if legacy::is_openssl(&raw) => {
            (PayloadFormat::OpenSsl, "DES-CBC (EVP_BytesToKey)", None)
        }
        Algorithm::Aes | Algorithm::Des => {
            let parts = wire::decode_wire(&raw)?;
            let suite = match parts.suite {
                SUITE_AES256GCM => "AES-256-GCM",
                SUITE_DES_CBC_HMAC_SHA256 => "DES-CBC-HMAC-SHA256",
                _ => "unknown",
            };
            (PayloadFormat::V1, suite, Some(parts.kdf_params))
        }
    };

    Ok(ArtifactInfo {
        format,
        suite,
        kdf,
        ciphertext_bytes: raw.len(),
        source_size: artifact.source_size(),
    })
}
