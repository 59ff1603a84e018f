//! Unified error type for Bastion Envelope.

use crate::algorithm::Algorithm;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Empty, whitespace-only, or unparsable key input.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The half of the key material the operation needs was not supplied.
    #[error("missing key material: {0}")]
    MissingKey(&'static str),

    /// Algorithm tag outside {AES, DES, RSA}.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// RSA input exceeds what OAEP can carry for this modulus.
    #[error("payload too large: {len} bytes exceeds the {max}-byte limit")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("key algorithm mismatch: artifact uses {artifact}, key is for {key}")]
    KeyAlgorithmMismatch { artifact: Algorithm, key: Algorithm },

    /// Wrong key, corrupted ciphertext, or padding failure. Deliberately opaque.
    #[error("decryption failed")]
    DecryptionFailed,

    /// The envelope itself could not be parsed.
    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("key generation failed: {0}")]
    KeyGeneration(String),
}

impl Error {
    /// Text suitable for showing to an end user.
    ///
    /// Keeps "you typed the wrong key" apart from "that is not an encrypted
    /// file", which the single `DecryptionFailed` kind cannot do on its own.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidKey(_) => "The key you entered is empty or not a valid key.",
            Self::MissingKey(_) => "A key is required for this operation.",
            Self::UnsupportedAlgorithm(_) => "That encryption algorithm is not supported.",
            Self::PayloadTooLarge { .. } => {
                "The data is too large for RSA; use AES or DES for files."
            }
            Self::KeyAlgorithmMismatch { .. } => {
                "This key is the wrong type for the selected file."
            }
            Self::DecryptionFailed => "Wrong key, or the file is damaged.",
            Self::InvalidArtifact(_) => "This is not an encrypted file.",
            Self::EncryptionFailed | Self::KeyGeneration(_) => {
                "Something went wrong while encrypting. Please try again."
            }
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
