//! Vault configuration, from defaults or `BASTION_*` environment variables.
//!
//! Environment variables:
//!   BASTION_ROOT_PREFIX       - Top-level blob prefix (default: StoredSecure)
//!   BASTION_DATA_DIR          - Directory for the file backend (unset: in-memory)
//!   BASTION_KDF_MEMORY_KIB    - Argon2id memory cost for new artifacts
//!   BASTION_KDF_ITERATIONS    - Argon2id time cost
//!   BASTION_KDF_PARALLELISM   - Argon2id lanes
//!   BASTION_LOG_FORMAT        - "json" for structured logging, "pretty" for dev

use crate::error::{Result, StoreError};
use crate::identity::DEFAULT_ROOT;
use crate::logging::LogFormat;

use bastion_envelope::KdfParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub root_prefix: String,
    pub data_dir: Option<PathBuf>,
    pub kdf: KdfParams,
    pub log_format: LogFormat,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root_prefix: DEFAULT_ROOT.to_string(),
            data_dir: None,
            kdf: KdfParams::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl VaultConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through `lookup`; unset or blank variables keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(root) = get("BASTION_ROOT_PREFIX") {
            config.root_prefix = root;
        }
        if let Some(dir) = get("BASTION_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(v) = get("BASTION_KDF_MEMORY_KIB") {
            config.kdf.memory_kib = parse("BASTION_KDF_MEMORY_KIB", &v)?;
        }
        if let Some(v) = get("BASTION_KDF_ITERATIONS") {
            config.kdf.iterations = parse("BASTION_KDF_ITERATIONS", &v)?;
        }
        if let Some(v) = get("BASTION_KDF_PARALLELISM") {
            config.kdf.parallelism = parse("BASTION_KDF_PARALLELISM", &v)?;
        }
        if let Some(v) = get("BASTION_LOG_FORMAT") {
            config.log_format = v.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        crate::identity::Layout::new(self.root_prefix.as_str())
            .map_err(|e| StoreError::Config(format!("BASTION_ROOT_PREFIX: {e}")))?;
        self.kdf
            .validate()
            .map_err(|e| StoreError::Config(e.to_string()))
    }
}

fn parse<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| StoreError::Config(format!("{name} is not a valid number: {value:?}")))
}
