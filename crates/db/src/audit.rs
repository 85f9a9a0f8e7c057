//! Audit outbox.
//!
//! Repositories publish an [`AuditRecord`] after their transaction commits.
//! Records go into a bounded channel drained by one dispatcher task that
//! forwards them to an [`AuditSink`]. Publishing never blocks and never
//! fails the caller: a full or closed channel drops the record with a
//! warning, and sink errors are logged and swallowed. Delivery is therefore
//! at-most-once, in publish order per process.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use bursar_core::audit::AuditRecord;
use bursar_core::ports::{AuditSink, CollaboratorError};

/// Non-blocking publisher handle. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AuditOutbox {
    sender: mpsc::Sender<AuditRecord>,
}

impl AuditOutbox {
    /// Starts a dispatcher task forwarding records to `sink`.
    ///
    /// The task ends once every outbox handle is dropped and the channel has
    /// drained.
    #[must_use]
    pub fn spawn(sink: Arc<dyn AuditSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (outbox, mut receiver) = Self::channel(capacity);
        let handle = tokio::spawn(async move {
            while let Some(record) = receiver.recv().await {
                let action = record.action.as_str();
                let entity_id = record.entity_id;
                if let Err(e) = sink.record(record).await {
                    warn!(action, %entity_id, error = %e, "audit sink failed, record dropped");
                }
            }
        });
        (outbox, handle)
    }

    /// An outbox and the receiving end of its channel, for custom dispatch.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AuditRecord>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Queues a record without waiting.
    pub fn publish(&self, record: AuditRecord) {
        match self.sender.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                warn!(
                    action = record.action.as_str(),
                    entity_id = %record.entity_id,
                    "audit outbox full, record dropped"
                );
            }
            Err(TrySendError::Closed(record)) => {
                warn!(
                    action = record.action.as_str(),
                    entity_id = %record.entity_id,
                    "audit outbox closed, record dropped"
                );
            }
        }
    }
}

/// Sink writing each record as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), CollaboratorError> {
        info!(
            target: "bursar::audit",
            action = record.action.as_str(),
            severity = ?record.severity,
            actor = ?record.actor,
            entity_type = %record.entity_type,
            entity_id = %record.entity_id,
            before = ?record.before,
            after = ?record.after,
            "audit"
        );
        Ok(())
    }
}
