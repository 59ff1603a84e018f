//! # Bastion Envelope
//!
//! Client-side encryption for files headed to untrusted object storage.
//!
//! ## Quick Start
//!
//! ```rust
//! use bastion_envelope::{generate_symmetric_key, Algorithm, Engine, KdfParams, KeyMaterial};
//!
//! let engine = Engine::with_kdf_params(KdfParams::insecure_fast());
//! let key = KeyMaterial::symmetric(Algorithm::Aes, generate_symmetric_key()).unwrap();
//!
//! let artifact = engine.encrypt_named(b"secret", "a.txt", &key, Algorithm::Aes).unwrap();
//! let plaintext = engine.decrypt(&artifact, &key).unwrap();
//!
//! assert_eq!(plaintext, b"secret");
//! ```
//!
//! ## Algorithms
//!
//! - **AES**: passphrase → Argon2id → HKDF-SHA256 → AES-256-GCM
//! - **DES**: passphrase → Argon2id → HKDF-SHA256 → DES-CBC + HMAC-SHA256
//! - **RSA**: 2048-bit RSA-OAEP-SHA256, single block (190 bytes max)
//!
//! ## Security Properties
//!
//! - **Authenticated**: symmetric payloads carry a tag; wrong keys fail closed
//! - **Uniform errors**: wrong key, tampering and truncation are one error
//! - **Self-describing**: salt, IV and KDF costs travel in the payload header
//! - **Legacy reads**: OpenSSL `Salted__` payloads from CryptoJS still decrypt
//!
//! ## What's NOT Provided
//!
//! - Key storage or key-to-artifact bookkeeping
//! - Streaming or chunked encryption
//! - Blob storage (see `bastion-store`)

#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/bastion-envelope/0.1.0")]

// ---------------------------------------------------------------------------
// Internal modules (not part of public API)
// ---------------------------------------------------------------------------

mod aead;
mod des_cbc;
mod oaep;

// Wire module is public for inspection tooling and tests
// but should not be considered stable API
#[doc(hidden)]
pub mod wire;

pub mod algorithm;
pub mod artifact;
pub mod engine;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod legacy;
pub mod signature;

// ---------------------------------------------------------------------------
// Public interface
// ---------------------------------------------------------------------------

pub use algorithm::{Algorithm, KeyFamily};
pub use artifact::{Download, EncryptedArtifact, OutputFormat};
pub use engine::{decrypt, encrypt, inspect, ArtifactInfo, Engine, PayloadFormat};
pub use error::{Error, Result};
pub use kdf::KdfParams;
pub use keys::{
    accept_user_secret, generate_rsa_keypair, generate_symmetric_key, KeyMaterial, Passphrase,
    RsaKeyPair, RsaKeys, RSA_KEY_BITS, RSA_PUBLIC_EXPONENT,
};
pub use oaep::max_payload as rsa_max_payload;
pub use signature::SignedMessage;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Payload format version for new symmetric artifacts.
pub const PROTOCOL_VERSION: u8 = wire::PROTOCOL_VERSION;
