//! Blob backends: where encrypted artifacts live.
//!
//! Paths are `/`-separated relative keys such as
//! `StoredSecure/alice/encrypted/3f2c...-notes.txt`.

use crate::error::{Result, StoreError};

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// One object returned by [`BlobStore::list`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobEntry {
    pub path: String,
    pub size: u64,
    pub updated_at: DateTime<Utc>,
    pub url: String,
}

impl BlobEntry {
    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Backend for persisting opaque blobs.
///
/// Implement this for your infrastructure:
/// - InMemoryBlobStore (testing)
/// - FileBlobStore (development, single host)
/// - An object store client (production)
pub trait BlobStore: Send + Sync {
    /// Write `bytes` at `path`, replacing any existing object. Returns a URL
    /// for the stored object.
    fn put(&self, path: &str, bytes: &[u8]) -> Result<String>;
    /// `NotFound` if nothing is stored at `path`.
    fn get(&self, path: &str) -> Result<Vec<u8>>;
    /// Objects directly under `prefix` (no recursion), sorted by path.
    fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>>;
    /// `NotFound` if nothing is stored at `path`.
    fn delete(&self, path: &str) -> Result<()>;
}

/// Reject paths that could escape the store root or collide with temp files.
pub fn validate_path(path: &str) -> Result<()> {
    let bad = |why: &str| Err(StoreError::InvalidPath(format!("{path:?}: {why}")));
    if path.is_empty() {
        return bad("empty");
    }
    if path.starts_with('/') || path.contains('\\') {
        return bad("must be relative and '/'-separated");
    }
    for segment in path.split('/') {
        if segment.is_empty() {
            return bad("empty segment");
        }
        if segment.starts_with('.') {
            return bad("segments may not start with '.'");
        }
    }
    Ok(())
}

fn prefix_dir(prefix: &str) -> Result<&str> {
    let prefix = prefix.trim_end_matches('/');
    validate_path(prefix)?;
    Ok(prefix)
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

struct MemBlob {
    bytes: Vec<u8>,
    updated_at: DateTime<Utc>,
}

/// In-memory storage (for testing and ephemeral use).
pub struct InMemoryBlobStore {
    blobs: RwLock<BTreeMap<String, MemBlob>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(BTreeMap::new()),
        }
    }

    fn url(path: &str) -> String {
        format!("mem://{path}")
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("lock poisoned".into())
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<String> {
        validate_path(path)?;
        let mut blobs = self.blobs.write().map_err(poisoned)?;
        blobs.insert(
            path.to_string(),
            MemBlob {
                bytes: bytes.to_vec(),
                updated_at: Utc::now(),
            },
        );
        Ok(Self::url(path))
    }

    fn get(&self, path: &str) -> Result<Vec<u8>> {
        validate_path(path)?;
        let blobs = self.blobs.read().map_err(poisoned)?;
        blobs
            .get(path)
            .map(|b| b.bytes.clone())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>> {
        let dir = format!("{}/", prefix_dir(prefix)?);
        let blobs = self.blobs.read().map_err(poisoned)?;
        Ok(blobs
            .range(dir.clone()..)
            .take_while(|(path, _)| path.starts_with(&dir))
            .filter(|(path, _)| !path[dir.len()..].contains('/'))
            .map(|(path, blob)| BlobEntry {
                path: path.clone(),
                size: blob.bytes.len() as u64,
                updated_at: blob.updated_at,
                url: Self::url(path),
            })
            .collect())
    }

    fn delete(&self, path: &str) -> Result<()> {
        validate_path(path)?;
        let mut blobs = self.blobs.write().map_err(poisoned)?;
        blobs
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// File-based storage: one file per blob under a root directory.
///
/// Directory layout mirrors the blob path:
/// ```text
/// {root}/
///   StoredSecure/{uid}/encrypted/{uuid}-{name}
///   StoredSecure/{uid}/trash/{uuid}-{name}
/// ```
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> Result<PathBuf> {
        validate_path(path)?;
        Ok(path.split('/').fold(self.root.clone(), |acc, seg| acc.join(seg)))
    }

    fn url(full: &Path) -> String {
        format!("file://{}", full.display())
    }

    fn not_found(path: &str, e: std::io::Error) -> StoreError {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(path.to_string())
        } else {
            StoreError::Io(e)
        }
    }
}

impl BlobStore for FileBlobStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<String> {
        let full = self.full_path(path)?;
        let (Some(parent), Some(name)) = (full.parent(), full.file_name()) else {
            return Err(StoreError::InvalidPath(path.to_string()));
        };
        std::fs::create_dir_all(parent)?;
        // Atomic write: write to a hidden temp file, then rename
        let tmp = parent.join(format!(".{}.tmp", name.to_string_lossy()));
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &full)?;
        Ok(Self::url(&full))
    }

    fn get(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.full_path(path)?;
        std::fs::read(&full).map_err(|e| Self::not_found(path, e))
    }

    fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>> {
        let dir = prefix_dir(prefix)?;
        let full_dir = self.full_path(dir)?;
        let entries = match std::fs::read_dir(&full_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry?;
            let meta = entry.metadata()?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !meta.is_file() || name.starts_with('.') {
                continue;
            }
            out.push(BlobEntry {
                path: format!("{dir}/{name}"),
                size: meta.len(),
                updated_at: meta.modified().map(DateTime::<Utc>::from)?,
                url: Self::url(&entry.path()),
            });
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let full = self.full_path(path)?;
        std::fs::remove_file(&full).map_err(|e| Self::not_found(path, e))
    }
}
