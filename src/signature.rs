//! RSA signatures over text messages: RSASSA-PKCS1-v1_5 with SHA-256,
//! base64-encoded.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use sha2::Sha256;

use crate::error::{Error, Result};
use crate::keys::{parse_private_pem, parse_public_pem};

/// Sign `message` with a PEM private key. Returns the base64 signature.
pub fn sign(message: &[u8], private_pem: &str) -> Result<String> {
    let key = parse_private_pem(private_pem)?;
    let signing_key = SigningKey::<Sha256>::new(key);
    let sig = signing_key
        .try_sign(message)
        .map_err(|e| Error::InvalidKey(format!("signing failed: {e}")))?;
    Ok(STANDARD.encode(sig.to_bytes()))
}

/// Verify a base64 signature. A bad or undecodable signature is `Ok(false)`;
/// only an unusable public key is an error.
pub fn verify(message: &[u8], signature_b64: &str, public_pem: &str) -> Result<bool> {
    let key = parse_public_pem(public_pem)?;
    let verifying_key = VerifyingKey::<Sha256>::new(key);

    let Ok(bytes) = STANDARD.decode(signature_b64.trim()) else {
        return Ok(false);
    };
    let Ok(sig) = Signature::try_from(bytes.as_slice()) else {
        return Ok(false);
    };
    Ok(verifying_key.verify(message, &sig).is_ok())
}

/// A signed message bundled for export as a text file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedMessage {
    pub message: String,
    pub signature: String,
    pub public_pem: String,
}

impl SignedMessage {
    pub fn create(message: &str, private_pem: &str, public_pem: &str) -> Result<Self> {
        Ok(Self {
            message: message.to_string(),
            signature: sign(message.as_bytes(), private_pem)?,
            public_pem: public_pem.to_string(),
        })
    }

    pub fn verify(&self) -> Result<bool> {
        verify(self.message.as_bytes(), &self.signature, &self.public_pem)
    }

    /// `Message: ...\nSignature: ...\nPublic Key: ...`
    pub fn to_text(&self) -> String {
        format!(
            "Message: {}\nSignature: {}\nPublic Key: {}",
            self.message, self.signature, self.public_pem
        )
    }
}
