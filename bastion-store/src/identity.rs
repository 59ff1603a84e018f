//! Who owns a file, and where their files live.

use crate::error::{Result, StoreError};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier, used only to namespace blob paths.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.contains('/') || id.contains('\\') || id.starts_with('.') {
            return Err(StoreError::InvalidUserId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Which half of a user's space a file sits in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Encrypted,
    Trash,
}

impl Area {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encrypted => "encrypted",
            Self::Trash => "trash",
        }
    }
}

/// Blob path construction: `{root}/{uid}/{area}/{handle}`.
#[derive(Clone, Debug)]
pub struct Layout {
    root: String,
}

impl Layout {
    pub fn new(root: impl Into<String>) -> Result<Self> {
        let root = root.into().trim_matches('/').to_string();
        crate::blob::validate_path(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn dir(&self, user: &UserId, area: Area) -> String {
        format!("{}/{}/{}", self.root, user, area.as_str())
    }

    pub fn file(&self, user: &UserId, area: Area, handle: &str) -> Result<String> {
        validate_handle(handle)?;
        Ok(format!("{}/{}", self.dir(user, area), handle))
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
        }
    }
}

/// Root prefix used when none is configured.
pub const DEFAULT_ROOT: &str = "StoredSecure";

/// A handle is a single path segment: `{uuid}-{name}`.
pub fn validate_handle(handle: &str) -> Result<()> {
    if handle.is_empty()
        || handle.contains('/')
        || handle.contains('\\')
        || handle.starts_with('.')
    {
        return Err(StoreError::InvalidPath(handle.to_string()));
    }
    Ok(())
}

/// Fresh handle for an uploaded file. Directory components of `name` are
/// dropped; an empty or hidden base name is rejected.
pub fn new_handle(name: &str) -> Result<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if base.is_empty() || base.starts_with('.') {
        return Err(StoreError::InvalidPath(name.to_string()));
    }
    Ok(format!("{}-{}", uuid::Uuid::new_v4(), base))
}

/// The original file name inside a handle (everything after the UUID).
pub fn name_from_handle(handle: &str) -> &str {
    // hyphenated UUID is 36 chars, then '-'
    handle.get(37..).filter(|n| !n.is_empty()).unwrap_or(handle)
}
