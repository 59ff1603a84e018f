//! The artifact envelope and its presentation helpers.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithm::Algorithm;
use crate::error::{Error, Result};

/// Ciphertext plus everything needed to attempt decryption and to present
/// the result. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedArtifact {
    ciphertext: String,
    algorithm: Algorithm,
    original_name: String,
    source_size: u64,
    created_at: DateTime<Utc>,
}

/// Wire shape, with the algorithm still an unchecked string.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    ciphertext: String,
    algorithm: String,
    #[serde(default)]
    original_name: String,
    #[serde(default)]
    source_size: u64,
    created_at: DateTime<Utc>,
}

impl EncryptedArtifact {
    pub fn new(
        ciphertext: String,
        algorithm: Algorithm,
        original_name: impl Into<String>,
        source_size: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            ciphertext,
            algorithm,
            original_name: original_name.into(),
            source_size,
            created_at,
        }
    }

    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn source_size(&self) -> u64 {
        self.source_size
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidArtifact(e.to_string()))
    }

    /// Parse a stored envelope. Unknown algorithm tags surface as
    /// `UnsupportedAlgorithm`; anything else malformed as `InvalidArtifact`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawArtifact =
            serde_json::from_str(json).map_err(|e| Error::InvalidArtifact(e.to_string()))?;
        Ok(Self {
            algorithm: raw.algorithm.parse()?,
            ciphertext: raw.ciphertext,
            original_name: raw.original_name,
            source_size: raw.source_size,
            created_at: raw.created_at,
        })
    }

    /// Filename to offer when handing decrypted bytes back to a user.
    ///
    /// Drops a trailing `.encrypted`/`.enc`, then swaps the extension for the
    /// requested output format. `OutputFormat::None` keeps the name as stored.
    pub fn suggested_filename(&self, format: OutputFormat) -> String {
        let name = strip_encrypted_suffix(self.original_name.trim());
        let name = if name.is_empty() { "decrypted_file" } else { name };

        match format.extension() {
            None => name.to_string(),
            Some(ext) => {
                let stem = match name.rfind('.') {
                    Some(0) | None => name,
                    Some(dot) => &name[..dot],
                };
                format!("{stem}.{ext}")
            }
        }
    }
}

fn strip_encrypted_suffix(name: &str) -> &str {
    [".encrypted", ".enc"]
        .iter()
        .find_map(|s| name.strip_suffix(s))
        .unwrap_or(name)
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

/// Output type hint for a download.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    None,
    Jpg,
    Png,
    Mp3,
    Mp4,
    Txt,
}

impl OutputFormat {
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Jpg => Some("jpg"),
            Self::Png => Some("png"),
            Self::Mp3 => Some("mp3"),
            Self::Mp4 => Some("mp4"),
            Self::Txt => Some("txt"),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::None => "application/octet-stream",
            Self::Jpg => "image/jpeg",
            Self::Png => "image/png",
            Self::Mp3 => "audio/mpeg",
            Self::Mp4 => "video/mp4",
            Self::Txt => "text/plain",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension().unwrap_or("none"))
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "png" => Ok(Self::Png),
            "mp3" => Ok(Self::Mp3),
            "mp4" => Ok(Self::Mp4),
            "txt" => Ok(Self::Txt),
            other => Err(Error::InvalidArtifact(format!("unknown output format: {other}"))),
        }
    }
}

/// Decrypted bytes ready for the presentation layer.
#[derive(Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn new(artifact: &EncryptedArtifact, bytes: Vec<u8>, format: OutputFormat) -> Self {
        Self {
            filename: artifact.suggested_filename(format),
            mime_type: format.mime_type(),
            bytes,
        }
    }
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}
