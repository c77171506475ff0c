// src/device/mirror.rs

use async_trait::async_trait;

use super::{CompletionRecord, DeviceError};

/// Remote copy of completion records.
///
/// Writes are insert-only and nothing reads them back for gating, so an
/// implementation may fail freely; the tracker only logs the error.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    async fn record_completion(&self, record: &CompletionRecord) -> Result<(), DeviceError>;
}

/// Mirror that drops every record. Used when no record store is reachable.
#[derive(Debug, Clone, Default)]
pub struct NoopMirror;

#[async_trait]
impl RemoteMirror for NoopMirror {
    async fn record_completion(&self, record: &CompletionRecord) -> Result<(), DeviceError> {
        tracing::debug!(user_id = %record.user_id, "no remote mirror configured, skipping");
        Ok(())
    }
}
