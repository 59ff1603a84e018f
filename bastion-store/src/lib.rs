//! # Bastion Store
//!
//! Per-user encrypted file vault.
//!
//! Files are encrypted client-side with `bastion-envelope` and only the
//! resulting artifact JSON reaches the blob store. Each user gets an
//! `encrypted/` area and a `trash/` area under a configurable root:
//!
//! ```text
//! StoredSecure/{uid}/encrypted/{uuid}-{name}
//! StoredSecure/{uid}/trash/{uuid}-{name}
//! ```
//!
//! Keys are never stored. The caller supplies key material on every upload
//! and download.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bastion_envelope::{generate_symmetric_key, Algorithm, KeyMaterial, OutputFormat};
//! use bastion_store::{InMemoryBlobStore, TracingAuditSink, UserId, Vault};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let vault = Vault::new(Arc::new(InMemoryBlobStore::new()), Arc::new(TracingAuditSink));
//!     let user = UserId::new("alice")?;
//!     let key = KeyMaterial::symmetric(Algorithm::Aes, generate_symmetric_key())?;
//!
//!     let file = vault
//!         .store_file(&user, "notes.txt", b"secret".to_vec(), &key, Algorithm::Aes)
//!         .await?;
//!     let download = vault
//!         .open_file(&user, &file.handle, &key, OutputFormat::Txt)
//!         .await?;
//!     assert_eq!(download.bytes, b"secret");
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod blob;
pub mod config;
pub mod error;
pub mod identity;
pub mod keygen;
pub mod logging;
pub mod vault;

// Re-export main types for convenience
pub use audit::{AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use blob::{BlobEntry, BlobStore, FileBlobStore, InMemoryBlobStore};
pub use config::VaultConfig;
pub use error::{Result, StoreError};
pub use identity::{Area, Layout, UserId};
pub use logging::LogFormat;
pub use vault::{format_size, StorageUsage, StoredFile, Vault};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_envelope::{
        accept_user_secret, generate_rsa_keypair, Algorithm, Engine, Error, KdfParams,
        KeyMaterial, OutputFormat,
    };
    use std::sync::Arc;
    use std::sync::OnceLock;
    use tokio_util::sync::CancellationToken;

    fn test_vault() -> (Vault, Arc<InMemoryBlobStore>, Arc<InMemoryAuditSink>) {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let audit = Arc::new(InMemoryAuditSink::new());
        let vault = Vault::new(blobs.clone(), audit.clone())
            .with_engine(Engine::with_kdf_params(KdfParams::insecure_fast()));
        (vault, blobs, audit)
    }

    fn alice() -> UserId {
        UserId::new("alice").unwrap()
    }

    fn pass(secret: &str) -> KeyMaterial {
        KeyMaterial::symmetric(Algorithm::Aes, accept_user_secret(secret).unwrap()).unwrap()
    }

    fn rsa_key() -> &'static KeyMaterial {
        static KEY: OnceLock<KeyMaterial> = OnceLock::new();
        KEY.get_or_init(|| KeyMaterial::from_keypair(&generate_rsa_keypair().unwrap()).unwrap())
    }

    // === Upload / download ===

    #[tokio::test]
    async fn test_store_and_open() {
        let (vault, blobs, _) = test_vault();
        let user = alice();
        let file = vault
            .store_file(&user, "notes.txt", b"hello world".to_vec(), &pass("pw"), Algorithm::Aes)
            .await
            .unwrap();

        assert_eq!(file.name, "notes.txt");
        assert!(file.handle.ends_with("-notes.txt"));
        assert_eq!(file.area, Area::Encrypted);
        assert_eq!(file.source_size, 11);
        assert!(file.url.starts_with("mem://StoredSecure/alice/encrypted/"));

        // Only ciphertext is at rest
        let stored = blobs
            .get(&format!("StoredSecure/alice/encrypted/{}", file.handle))
            .unwrap();
        assert!(!String::from_utf8_lossy(&stored).contains("hello world"));

        let download = vault
            .open_file(&user, &file.handle, &pass("pw"), OutputFormat::Txt)
            .await
            .unwrap();
        assert_eq!(download.bytes, b"hello world");
        assert_eq!(download.filename, "notes.txt");
        assert_eq!(download.mime_type, "text/plain");
    }

    #[tokio::test]
    async fn test_store_all_algorithms() {
        let (vault, _, _) = test_vault();
        let user = alice();
        let des =
            KeyMaterial::symmetric(Algorithm::Des, accept_user_secret("pw").unwrap()).unwrap();
        for (algorithm, key) in [
            (Algorithm::Aes, pass("pw")),
            (Algorithm::Des, des),
            (Algorithm::Rsa, rsa_key().clone()),
        ] {
            let file = vault
                .store_file(&user, "a.bin", vec![7u8; 64], &key, algorithm)
                .await
                .unwrap();
            assert_eq!(file.algorithm, algorithm);
            let download = vault
                .open_file(&user, &file.handle, &key, OutputFormat::None)
                .await
                .unwrap();
            assert_eq!(download.bytes, vec![7u8; 64]);
        }
    }

    #[tokio::test]
    async fn test_open_with_wrong_key_is_audited() {
        let (vault, _, audit) = test_vault();
        let user = alice();
        let file = vault
            .store_file(&user, "a.txt", b"x".to_vec(), &pass("right"), Algorithm::Aes)
            .await
            .unwrap();

        let result = vault
            .open_file(&user, &file.handle, &pass("wrong"), OutputFormat::None)
            .await;
        assert!(matches!(result, Err(StoreError::Crypto(Error::DecryptionFailed))));

        let events = audit.events();
        let last = events.last().unwrap();
        assert_eq!(last.action, AuditAction::DecryptionFailed { algorithm: Algorithm::Aes });
        assert!(!last.success);
    }

    #[tokio::test]
    async fn test_oversized_rsa_upload_is_rejected() {
        let (vault, blobs, audit) = test_vault();
        let user = alice();
        let result = vault
            .store_file(&user, "big.bin", vec![0u8; 191], rsa_key(), Algorithm::Rsa)
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Crypto(Error::PayloadTooLarge { len: 191, max: 190 }))
        ));
        assert!(blobs.list("StoredSecure/alice/encrypted").unwrap().is_empty());
        assert!(!audit.events()[0].success);
    }

    #[tokio::test]
    async fn test_rsa_file_with_passphrase_is_mismatch() {
        let (vault, _, _) = test_vault();
        let user = alice();
        let file = vault
            .store_file(&user, "m.txt", b"attack at dawn".to_vec(), rsa_key(), Algorithm::Rsa)
            .await
            .unwrap();
        let result = vault
            .open_file(&user, &file.handle, &pass("pw"), OutputFormat::Txt)
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Crypto(Error::KeyAlgorithmMismatch { .. }))
        ));
    }

    #[tokio::test]
    async fn test_invalid_names() {
        let (vault, _, _) = test_vault();
        let user = alice();
        for name in ["", "dir/", ".hidden"] {
            let result = vault
                .store_file(&user, name, b"x".to_vec(), &pass("pw"), Algorithm::Aes)
                .await;
            assert!(matches!(result, Err(StoreError::InvalidPath(_))), "{name:?}");
        }
        assert!(matches!(
            vault.fetch_artifact(&user, "../bob/encrypted/x").await,
            Err(StoreError::InvalidPath(_))
        ));
    }

    // === Listing / usage ===

    #[tokio::test]
    async fn test_list_is_per_user() {
        let (vault, _, _) = test_vault();
        let alice = alice();
        let bob = UserId::new("bob").unwrap();
        vault.store_file(&alice, "a1", b"1".to_vec(), &pass("pw"), Algorithm::Aes).await.unwrap();
        vault.store_file(&alice, "a2", b"2".to_vec(), &pass("pw"), Algorithm::Aes).await.unwrap();
        vault.store_file(&bob, "b1", b"3".to_vec(), &pass("pw"), Algorithm::Aes).await.unwrap();

        let mut names: Vec<_> = vault
            .list_files(&alice)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        names.sort();
        assert_eq!(names, ["a1", "a2"]);
        assert_eq!(vault.list_files(&bob).await.unwrap().len(), 1);
        assert!(vault.list_trash(&bob).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_uploads_are_all_audited() {
        let (vault, _, audit) = test_vault();
        let vault = Arc::new(vault);
        let uploads: Vec<_> = (0..32u8)
            .map(|i| {
                let vault = Arc::clone(&vault);
                tokio::spawn(async move {
                    let name = format!("f{i}.txt");
                    vault
                        .store_file(&alice(), &name, vec![i; 8], &pass("pw"), Algorithm::Aes)
                        .await
                })
            })
            .collect();
        for upload in uploads {
            upload.await.unwrap().unwrap();
        }

        assert_eq!(audit.len(), 32);
        assert_eq!(vault.list_files(&alice()).await.unwrap().len(), 32);
    }

    #[tokio::test]
    async fn test_list_skips_foreign_blobs() {
        let (vault, blobs, _) = test_vault();
        let user = alice();
        blobs.put("StoredSecure/alice/encrypted/junk", b"not json").unwrap();
        vault
            .store_file(&user, "ok.txt", b"x".to_vec(), &pass("pw"), Algorithm::Aes)
            .await
            .unwrap();

        let files = vault.list_files(&user).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "ok.txt");
    }

    #[tokio::test]
    async fn test_usage() {
        let (vault, _, _) = test_vault();
        let user = alice();
        assert_eq!(vault.usage(&user).await.unwrap(), StorageUsage::default());

        let a = vault
            .store_file(&user, "a", vec![0; 10], &pass("pw"), Algorithm::Aes)
            .await
            .unwrap();
        let b = vault
            .store_file(&user, "b", vec![0; 20], &pass("pw"), Algorithm::Aes)
            .await
            .unwrap();
        let usage = vault.usage(&user).await.unwrap();
        assert_eq!(usage.files, 2);
        assert_eq!(usage.bytes, a.size + b.size);

        // Trash does not count
        vault.move_to_trash(&user, &a.handle).await.unwrap();
        assert_eq!(vault.usage(&user).await.unwrap().bytes, b.size);
    }

    // === Trash ===

    #[tokio::test]
    async fn test_trash_restore_purge() {
        let (vault, _, audit) = test_vault();
        let user = alice();
        let key = pass("pw");
        let file = vault
            .store_file(&user, "t.txt", b"keep".to_vec(), &key, Algorithm::Aes)
            .await
            .unwrap();

        vault.move_to_trash(&user, &file.handle).await.unwrap();
        assert!(vault.list_files(&user).await.unwrap().is_empty());
        let trash = vault.list_trash(&user).await.unwrap();
        assert_eq!(trash.len(), 1);
        assert_eq!(trash[0].area, Area::Trash);
        assert_eq!(trash[0].handle, file.handle);

        // Trashed files cannot be opened until restored
        assert!(matches!(
            vault.open_file(&user, &file.handle, &key, OutputFormat::None).await,
            Err(StoreError::NotFound(_))
        ));

        vault.restore(&user, &file.handle).await.unwrap();
        let download = vault
            .open_file(&user, &file.handle, &key, OutputFormat::None)
            .await
            .unwrap();
        assert_eq!(download.bytes, b"keep");

        vault.move_to_trash(&user, &file.handle).await.unwrap();
        vault.purge(&user, &file.handle).await.unwrap();
        assert!(vault.list_trash(&user).await.unwrap().is_empty());
        assert!(matches!(
            vault.restore(&user, &file.handle).await,
            Err(StoreError::NotFound(_))
        ));

        assert_eq!(
            audit.actions(),
            [
                AuditAction::FileStored { algorithm: Algorithm::Aes },
                AuditAction::MovedToTrash,
                AuditAction::Restored,
                AuditAction::FileOpened { algorithm: Algorithm::Aes },
                AuditAction::MovedToTrash,
                AuditAction::Purged,
            ]
        );
    }

    #[tokio::test]
    async fn test_purge_requires_trash() {
        let (vault, _, _) = test_vault();
        let user = alice();
        let file = vault
            .store_file(&user, "x", b"x".to_vec(), &pass("pw"), Algorithm::Aes)
            .await
            .unwrap();
        assert!(matches!(
            vault.purge(&user, &file.handle).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(vault.list_files(&user).await.unwrap().len(), 1);
    }

    // === Config / keys ===

    #[tokio::test]
    async fn test_from_config_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = VaultConfig {
            root_prefix: "Vault".into(),
            data_dir: Some(dir.path().to_path_buf()),
            kdf: KdfParams::insecure_fast(),
            ..VaultConfig::default()
        };
        let vault = Vault::from_config(&config, Arc::new(TracingAuditSink)).unwrap();
        let user = alice();
        let file = vault
            .store_file(&user, "disk.txt", b"on disk".to_vec(), &pass("pw"), Algorithm::Aes)
            .await
            .unwrap();

        assert!(dir.path().join("Vault/alice/encrypted").join(&file.handle).is_file());
        assert!(file.url.starts_with("file://"));
        let download = vault
            .open_file(&user, &file.handle, &pass("pw"), OutputFormat::Txt)
            .await
            .unwrap();
        assert_eq!(download.bytes, b"on disk");
    }

    #[tokio::test]
    async fn test_generate_key_pair_is_audited() {
        let (vault, _, audit) = test_vault();
        let pair = vault.generate_key_pair(CancellationToken::new()).await.unwrap();
        assert!(KeyMaterial::from_keypair(&pair).is_ok());
        assert_eq!(audit.actions(), [AuditAction::KeyPairGenerated]);
    }
}
