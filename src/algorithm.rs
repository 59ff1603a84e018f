//! The closed set of algorithm families.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Algorithm an artifact was produced with.
///
/// Parsed once at the boundary; everything inside the crate matches on it
/// exhaustively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Algorithm {
    Aes,
    Des,
    Rsa,
}

/// Whether an algorithm is keyed by a passphrase or a key pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyFamily {
    Symmetric,
    Asymmetric,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Aes, Algorithm::Des, Algorithm::Rsa];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Aes => "AES",
            Algorithm::Des => "DES",
            Algorithm::Rsa => "RSA",
        }
    }

    pub fn family(&self) -> KeyFamily {
        match self {
            Algorithm::Aes | Algorithm::Des => KeyFamily::Symmetric,
            Algorithm::Rsa => KeyFamily::Asymmetric,
        }
    }

    pub fn is_symmetric(&self) -> bool {
        self.family() == KeyFamily::Symmetric
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AES" => Ok(Algorithm::Aes),
            "DES" => Ok(Algorithm::Des),
            "RSA" => Ok(Algorithm::Rsa),
            _ => Err(Error::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl TryFrom<String> for Algorithm {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Algorithm> for &'static str {
    fn from(a: Algorithm) -> Self {
        a.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags_case_insensitively() {
        assert_eq!("aes".parse::<Algorithm>().unwrap(), Algorithm::Aes);
        assert_eq!(" DES ".parse::<Algorithm>().unwrap(), Algorithm::Des);
        assert_eq!("Rsa".parse::<Algorithm>().unwrap(), Algorithm::Rsa);
    }

    #[test]
    fn rejects_unknown_tags() {
        for tag in ["TripleDES", "", "aes-128", "chacha20"] {
            assert!(matches!(
                tag.parse::<Algorithm>(),
                Err(Error::UnsupportedAlgorithm(_))
            ));
        }
    }

    #[test]
    fn families() {
        assert!(Algorithm::Aes.is_symmetric());
        assert!(Algorithm::Des.is_symmetric());
        assert_eq!(Algorithm::Rsa.family(), KeyFamily::Asymmetric);
    }

    #[test]
    fn serde_uses_uppercase_tags() {
        let json = serde_json::to_string(&Algorithm::Des).unwrap();
        assert_eq!(json, "\"DES\"");
        let back: Algorithm = serde_json::from_str("\"rsa\"").unwrap();
        assert_eq!(back, Algorithm::Rsa);
        assert!(serde_json::from_str::<Algorithm>("\"Rabbit\"").is_err());
    }
}
