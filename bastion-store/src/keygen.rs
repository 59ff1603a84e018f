//! RSA key-pair generation off the async runtime.
//!
//! Generation is CPU-bound and can take seconds, so it runs on the blocking
//! pool. Cancelling returns immediately; the computation finishes in the
//! background and its result is dropped.

use crate::error::{Result, StoreError};

use bastion_envelope::RsaKeyPair;
use tokio_util::sync::CancellationToken;

/// Generate a 2048-bit RSA key pair (e = 65537) without blocking the caller's
/// executor thread.
///
/// # Errors
///
/// - `Cancelled` if `cancel` fires first
/// - `Crypto(KeyGeneration)` if the RNG or prime search fails
/// - `Task` if the blocking task panics
pub async fn generate_rsa_keypair(cancel: CancellationToken) -> Result<RsaKeyPair> {
    let pair = cancellable(cancel, bastion_envelope::generate_rsa_keypair).await?;
    tracing::info!(bits = bastion_envelope::RSA_KEY_BITS, "generated rsa key pair");
    Ok(pair)
}

/// Run `work` on the blocking pool, returning `Cancelled` as soon as `cancel`
/// fires whether or not `work` has started.
async fn cancellable<T, F>(cancel: CancellationToken, work: F) -> Result<T>
where
    F: FnOnce() -> bastion_envelope::Result<T> + Send + 'static,
    T: Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }

    let task = tokio::task::spawn_blocking(work);

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::info!("rsa key generation cancelled");
            Err(StoreError::Cancelled)
        }
        joined = task => Ok(joined.map_err(|e| StoreError::Task(e.to_string()))??),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn generates_usable_pair() {
        let pair = generate_rsa_keypair(CancellationToken::new()).await.unwrap();
        assert!(pair.public_pem.contains("BEGIN PUBLIC KEY"));
        assert!(bastion_envelope::KeyMaterial::from_keypair(&pair).is_ok());
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            generate_rsa_keypair(cancel).await,
            Err(StoreError::Cancelled)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_while_running() {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let cancel = CancellationToken::new();

        let run = tokio::spawn(cancellable(cancel.clone(), move || {
            let _ = started_tx.send(());
            // Blocks until the test lets go, so only cancellation can finish the call.
            let _ = release_rx.recv();
            Ok(())
        }));

        started_rx.await.unwrap();
        cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("cancellation did not interrupt the running task")
            .unwrap();
        assert!(matches!(result, Err(StoreError::Cancelled)));

        release_tx.send(()).unwrap();
    }

    #[tokio::test]
    async fn work_errors_pass_through() {
        let result: Result<()> = cancellable(CancellationToken::new(), || {
            Err(bastion_envelope::Error::KeyGeneration("no entropy".into()))
        })
        .await;
        assert!(matches!(
            result,
            Err(StoreError::Crypto(bastion_envelope::Error::KeyGeneration(_)))
        ));
    }
}
