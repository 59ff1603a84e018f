//! Process-wide `tracing` subscriber setup.

use crate::error::{Result, StoreError};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Log output style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line, for log shippers.
    Json,
}

impl FromStr for LogFormat {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(StoreError::Config(format!(
                "log format must be \"pretty\" or \"json\", got {other:?}"
            ))),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info`
/// filter. Fails if a subscriber is already installed.
pub fn init(format: LogFormat) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let installed = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(env_filter).try_init(),
    };
    installed.map_err(|e| StoreError::Config(format!("logging: {e}")))
}
