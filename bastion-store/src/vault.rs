//! The vault: per-user encrypted files, trash, and usage over a blob store.

use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::blob::{BlobEntry, BlobStore, FileBlobStore, InMemoryBlobStore};
use crate::config::VaultConfig;
use crate::error::{Result, StoreError};
use crate::identity::{self, Area, Layout, UserId};
use crate::keygen;

use bastion_envelope::{
    Algorithm, Download, EncryptedArtifact, Engine, KeyMaterial, OutputFormat, RsaKeyPair,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Listing types
// ---------------------------------------------------------------------------

/// One stored file as shown in a listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    /// Name the file was uploaded under.
    pub name: String,
    /// Stable blob handle, `{uuid}-{name}`. Pass back to the other operations.
    pub handle: String,
    pub area: Area,
    pub algorithm: Algorithm,
    /// Bytes occupied in the blob store.
    pub size: u64,
    /// Plaintext length at encryption time.
    pub source_size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub url: String,
}

/// Totals for a user's encrypted area. Informational only; nothing enforces a quota.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StorageUsage {
    pub bytes: u64,
    pub files: usize,
}

impl fmt::Display for StorageUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.files == 1 { "" } else { "s" };
        write!(f, "{} in {} file{}", format_size(self.bytes), self.files, plural)
    }
}

/// `512 B`, `1.50 KB`, `2.00 MB`, `1.25 GB` (powers of 1024).
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if bytes < 1024 {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.2} KB", b / KB)
    } else if b < KB * KB * KB {
        format!("{:.2} MB", b / (KB * KB))
    } else {
        format!("{:.2} GB", b / (KB * KB * KB))
    }
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

pub struct Vault {
    blobs: Arc<dyn BlobStore>,
    audit: Arc<dyn AuditSink>,
    engine: Engine,
    layout: Layout,
}

impl Vault {
    /// Vault with default Argon2id costs and the `StoredSecure` root.
    pub fn new(blobs: Arc<dyn BlobStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            blobs,
            audit,
            engine: Engine::new(),
            layout: Layout::default(),
        }
    }

    /// Build from configuration: a file backend when `data_dir` is set,
    /// otherwise in-memory.
    pub fn from_config(config: &VaultConfig, audit: Arc<dyn AuditSink>) -> Result<Self> {
        config.validate()?;
        let blobs: Arc<dyn BlobStore> = match &config.data_dir {
            Some(dir) => Arc::new(FileBlobStore::new(dir.clone())?),
            None => Arc::new(InMemoryBlobStore::new()),
        };
        tracing::info!(
            root = %config.root_prefix,
            backend = if config.data_dir.is_some() { "file" } else { "memory" },
            "vault configured"
        );
        Ok(Self::new(blobs, audit)
            .with_layout(Layout::new(config.root_prefix.as_str())?)
            .with_engine(Engine::with_kdf_params(config.kdf)))
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    // -----------------------------------------------------------------------
    // Upload and download
    // -----------------------------------------------------------------------

    /// Encrypt `plaintext` and store it in the user's encrypted area.
    ///
    /// Only the artifact is stored; no plaintext copy is ever written.
    pub async fn store_file(
        &self,
        user: &UserId,
        name: &str,
        plaintext: Vec<u8>,
        key: &KeyMaterial,
        algorithm: Algorithm,
    ) -> Result<StoredFile> {
        let handle = identity::new_handle(name)?;
        let base_name = identity::name_from_handle(&handle).to_string();
        let path = self.layout.file(user, Area::Encrypted, &handle)?;

        let engine = self.engine.clone();
        let key = key.clone();
        let file_name = base_name.clone();
        let encrypted =
            blocking(move || engine.encrypt_named(&plaintext, &file_name, &key, algorithm)).await;
        let artifact = match encrypted {
            Ok(artifact) => artifact,
            Err(e) => {
                self.audit.record(
                    AuditEvent::file_event(user, &handle, AuditAction::FileStored { algorithm })
                        .with_failure()
                        .with_detail(e.to_string()),
                );
                return Err(e);
            }
        };

        let json = artifact.to_json()?;
        let url = self.blobs.put(&path, json.as_bytes())?;

        tracing::info!(
            user = %user,
            handle = %handle,
            algorithm = %algorithm,
            bytes = json.len(),
            "stored encrypted file"
        );
        self.audit.record(AuditEvent::file_event(
            user,
            &handle,
            AuditAction::FileStored { algorithm },
        ));

        Ok(StoredFile {
            name: base_name,
            handle,
            area: Area::Encrypted,
            algorithm,
            size: json.len() as u64,
            source_size: artifact.source_size(),
            uploaded_at: artifact.created_at(),
            url,
        })
    }

    /// The stored artifact, for callers that decrypt it themselves.
    pub async fn fetch_artifact(&self, user: &UserId, handle: &str) -> Result<EncryptedArtifact> {
        let path = self.layout.file(user, Area::Encrypted, handle)?;
        let bytes = self.blobs.get(&path)?;
        parse_artifact(&bytes)
    }

    /// Decrypt a stored file and package it for download as `format`.
    pub async fn open_file(
        &self,
        user: &UserId,
        handle: &str,
        key: &KeyMaterial,
        format: OutputFormat,
    ) -> Result<Download> {
        let artifact = self.fetch_artifact(user, handle).await?;
        let algorithm = artifact.algorithm();

        let engine = self.engine.clone();
        let key = key.clone();
        let sealed = artifact.clone();
        match blocking(move || engine.decrypt(&sealed, &key)).await {
            Ok(plaintext) => {
                tracing::info!(user = %user, handle, %format, "opened encrypted file");
                self.audit.record(AuditEvent::file_event(
                    user,
                    handle,
                    AuditAction::FileOpened { algorithm },
                ));
                Ok(Download::new(&artifact, plaintext, format))
            }
            Err(e) => {
                tracing::warn!(user = %user, handle, error = %e, "could not open file");
                let action = AuditAction::DecryptionFailed { algorithm };
                self.audit.record(
                    AuditEvent::file_event(user, handle, action)
                        .with_failure()
                        .with_detail(e.to_string()),
                );
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    /// Files in the encrypted area, newest first.
    pub async fn list_files(&self, user: &UserId) -> Result<Vec<StoredFile>> {
        self.list(user, Area::Encrypted)
    }

    /// Files in the trash, newest first.
    pub async fn list_trash(&self, user: &UserId) -> Result<Vec<StoredFile>> {
        self.list(user, Area::Trash)
    }

    fn list(&self, user: &UserId, area: Area) -> Result<Vec<StoredFile>> {
        let mut files = Vec::new();
        for entry in self.blobs.list(&self.layout.dir(user, area))? {
            match self.describe(&entry, area) {
                Ok(file) => files.push(file),
                // Objects someone else put under the prefix
                Err(StoreError::Crypto(e)) => {
                    tracing::warn!(path = %entry.path, error = %e, "skipping unreadable blob");
                }
                Err(e) => return Err(e),
            }
        }
        files.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(files)
    }

    fn describe(&self, entry: &BlobEntry, area: Area) -> Result<StoredFile> {
        let artifact = parse_artifact(&self.blobs.get(&entry.path)?)?;
        let handle = entry.file_name().to_string();
        let name = match artifact.original_name() {
            "" => identity::name_from_handle(&handle).to_string(),
            name => name.to_string(),
        };
        Ok(StoredFile {
            name,
            handle,
            area,
            algorithm: artifact.algorithm(),
            size: entry.size,
            source_size: artifact.source_size(),
            uploaded_at: artifact.created_at(),
            url: entry.url.clone(),
        })
    }

    /// Total size and count of the user's encrypted area (trash excluded).
    pub async fn usage(&self, user: &UserId) -> Result<StorageUsage> {
        let entries = self.blobs.list(&self.layout.dir(user, Area::Encrypted))?;
        Ok(StorageUsage {
            bytes: entries.iter().map(|e| e.size).sum(),
            files: entries.len(),
        })
    }

    // -----------------------------------------------------------------------
    // Trash
    // -----------------------------------------------------------------------

    pub async fn move_to_trash(&self, user: &UserId, handle: &str) -> Result<()> {
        self.relocate(user, handle, Area::Encrypted, Area::Trash)?;
        self.audit
            .record(AuditEvent::file_event(user, handle, AuditAction::MovedToTrash));
        Ok(())
    }

    pub async fn restore(&self, user: &UserId, handle: &str) -> Result<()> {
        self.relocate(user, handle, Area::Trash, Area::Encrypted)?;
        self.audit
            .record(AuditEvent::file_event(user, handle, AuditAction::Restored));
        Ok(())
    }

    /// Permanently delete a file from the trash.
    pub async fn purge(&self, user: &UserId, handle: &str) -> Result<()> {
        let path = self.layout.file(user, Area::Trash, handle)?;
        self.blobs.delete(&path)?;
        tracing::info!(user = %user, handle, "purged file");
        self.audit
            .record(AuditEvent::file_event(user, handle, AuditAction::Purged));
        Ok(())
    }

    // Copy then delete; a failure between the two leaves a duplicate, never a loss.
    fn relocate(&self, user: &UserId, handle: &str, from: Area, to: Area) -> Result<()> {
        let src = self.layout.file(user, from, handle)?;
        let dst = self.layout.file(user, to, handle)?;
        let bytes = self.blobs.get(&src)?;
        self.blobs.put(&dst, &bytes)?;
        self.blobs.delete(&src)?;
        tracing::info!(user = %user, handle, from = from.as_str(), to = to.as_str(), "moved file");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    /// Generate an RSA key pair for the user to keep. Nothing is stored.
    pub async fn generate_key_pair(&self, cancel: CancellationToken) -> Result<RsaKeyPair> {
        let pair = keygen::generate_rsa_keypair(cancel).await?;
        self.audit
            .record(AuditEvent::system_event(AuditAction::KeyPairGenerated));
        Ok(pair)
    }
}

fn parse_artifact(bytes: &[u8]) -> Result<EncryptedArtifact> {
    let json = std::str::from_utf8(bytes).map_err(|_| {
        bastion_envelope::Error::InvalidArtifact("stored artifact is not UTF-8".into())
    })?;
    Ok(EncryptedArtifact::from_json(json)?)
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> bastion_envelope::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let joined = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?;
    Ok(joined?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(2 * 1024 * 1024), "2.00 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024 / 4), "1.25 GB");
    }

    #[test]
    fn usage_display() {
        let usage = StorageUsage { bytes: 2048, files: 1 };
        assert_eq!(usage.to_string(), "2.00 KB in 1 file");
        assert_eq!(StorageUsage::default().to_string(), "0 B in 0 files");
    }
}
