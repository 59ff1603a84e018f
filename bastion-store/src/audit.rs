//! Audit logging: every vault operation emits a structured event.

use crate::identity::UserId;
use bastion_envelope::Algorithm;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

// ---------------------------------------------------------------------------
// Audit events
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum AuditAction {
    FileStored { algorithm: Algorithm },
    FileOpened { algorithm: Algorithm },
    DecryptionFailed { algorithm: Algorithm },
    MovedToTrash,
    Restored,
    Purged,
    KeyPairGenerated,
}

/// A structured audit event. Never carries key material or plaintext.
#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub user: Option<UserId>,
    /// Blob handle the operation touched.
    pub handle: Option<String>,
    pub action: AuditAction,
    pub success: bool,
    pub detail: Option<String>,
}

impl AuditEvent {
    /// An event about one of `user`'s files.
    pub fn file_event(user: &UserId, handle: &str, action: AuditAction) -> Self {
        Self {
            timestamp: Utc::now(),
            user: Some(user.clone()),
            handle: Some(handle.to_string()),
            action,
            success: true,
            detail: None,
        }
    }

    /// An event not tied to a stored file.
    pub fn system_event(action: AuditAction) -> Self {
        Self {
            timestamp: Utc::now(),
            user: None,
            handle: None,
            action,
            success: true,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.success = false;
        self
    }
}

// ---------------------------------------------------------------------------
// Audit sink trait
// ---------------------------------------------------------------------------

/// Where audit events go.
///
/// Synchronous so backends can call it from blocking sections.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

// ---------------------------------------------------------------------------
// Built-in sinks
// ---------------------------------------------------------------------------

/// Logs events via the `tracing` crate.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let user = event.user.as_ref().map(UserId::as_str).unwrap_or("-");
        let handle = event.handle.as_deref().unwrap_or("-");
        if event.success {
            tracing::info!(
                timestamp = %event.timestamp,
                user,
                handle,
                action = ?event.action,
                detail = ?event.detail,
                "audit"
            );
        } else {
            tracing::warn!(
                timestamp = %event.timestamp,
                user,
                handle,
                action = ?event.action,
                detail = ?event.detail,
                "audit"
            );
        }
    }
}

/// Collects events in memory (for tests).
///
/// The lock is only held for a push or a copy, never across an `.await`.
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Vec<AuditEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.guard().clone()
    }

    pub fn actions(&self) -> Vec<AuditAction> {
        self.guard().iter().map(|e| e.action.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }
}

impl Default for InMemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.guard().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_every_event_under_contention() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let user = UserId::new("uid-1").unwrap();

        let writers: Vec<_> = (0..8)
            .map(|_| {
                let sink = Arc::clone(&sink);
                let user = user.clone();
                std::thread::spawn(move || {
                    for _ in 0..5_000 {
                        sink.record(AuditEvent::file_event(&user, "h", AuditAction::Purged));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(sink.len(), 40_000);
    }

    #[test]
    fn survives_a_poisoned_lock() {
        let sink = Arc::new(InMemoryAuditSink::new());
        let poisoner = Arc::clone(&sink);
        let _ = std::thread::spawn(move || {
            let _held = poisoner.events.lock().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        sink.record(AuditEvent::system_event(AuditAction::KeyPairGenerated));
        assert_eq!(sink.actions(), [AuditAction::KeyPairGenerated]);
    }

    #[test]
    fn failures_are_flagged() {
        let sink = InMemoryAuditSink::new();
        assert!(sink.is_empty());
        let user = UserId::new("uid-1").unwrap();
        sink.record(
            AuditEvent::file_event(&user, "h", AuditAction::DecryptionFailed {
                algorithm: Algorithm::Aes,
            })
            .with_failure()
            .with_detail("wrong key"),
        );
        let events = sink.events();
        assert!(!events[0].success);
        assert_eq!(events[0].detail.as_deref(), Some("wrong key"));
    }
}
