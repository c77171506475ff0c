// src/device/tracker.rs

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::{runtime::Handle, task::JoinHandle};

use super::{
    CompletionRecord, DeviceError, DeviceFingerprint, EnvironmentProbe, LocalStorage,
    RemoteMirror, generate_fingerprint,
};
use crate::config::COMPLETION_STORAGE_KEY;

/// Outcome of the returning-device check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturningUser {
    pub is_returning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_user_id: Option<String>,
}

impl ReturningUser {
    fn no() -> Self {
        Self {
            is_returning: false,
            previous_user_id: None,
        }
    }
}

/// Lenient view of the stored record. Every field is optional so that a
/// partially written blob can still be inspected.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCompletion {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    device_fingerprint: Option<String>,
    #[serde(default)]
    completed_at: Option<f64>,
}

/// Gates guest attempts to one per device.
///
/// Local storage is the source of truth; the remote mirror is written after
/// the fact and never consulted.
#[derive(Clone)]
pub struct CompletionTracker {
    storage: Arc<dyn LocalStorage>,
    mirror: Arc<dyn RemoteMirror>,
    probe: Arc<dyn EnvironmentProbe>,
}

impl CompletionTracker {
    pub fn new(
        storage: Arc<dyn LocalStorage>,
        mirror: Arc<dyn RemoteMirror>,
        probe: Arc<dyn EnvironmentProbe>,
    ) -> Self {
        Self {
            storage,
            mirror,
            probe,
        }
    }

    /// Fingerprint of the device as it looks right now.
    pub fn current_fingerprint(&self) -> Result<DeviceFingerprint, DeviceError> {
        generate_fingerprint(self.probe.as_ref())
    }

    /// Whether this device already finished a quiz.
    ///
    /// Absent, unreadable or malformed state all count as "not completed".
    pub fn has_completed_quiz(&self) -> bool {
        self.read_record()
            .and_then(|r| r.completed_at)
            .is_some_and(|ts| ts.is_finite() && ts > 0.0)
    }

    /// Records a finished run.
    ///
    /// The local write happens before this returns and its failure is returned.
    /// The remote write runs on a detached task; its failure is only logged.
    /// The returned handle may be dropped. Outside a tokio runtime the remote
    /// write is skipped and `None` is returned.
    pub fn mark_completed(
        &self,
        user_id: &str,
        fingerprint: &DeviceFingerprint,
    ) -> Result<Option<JoinHandle<()>>, DeviceError> {
        let record = CompletionRecord::new(user_id, fingerprint);

        self.storage
            .set_item(COMPLETION_STORAGE_KEY, &serde_json::to_string(&record)?)?;
        tracing::info!(user_id = %record.user_id, fingerprint = %record.device_fingerprint, "quiz completion recorded locally");

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(user_id = %record.user_id, "Skipping quiz completion mirror: {}", e);
                return Ok(None);
            }
        };

        let mirror = Arc::clone(&self.mirror);
        Ok(Some(runtime.spawn(async move {
            if let Err(e) = mirror.record_completion(&record).await {
                tracing::error!(user_id = %record.user_id, "Error mirroring quiz completion: {}", e);
            }
        })))
    }

    /// Compares the stored fingerprint with a freshly computed one.
    ///
    /// Only a probe failure is an error; missing or malformed state is
    /// "not returning".
    pub fn is_returning_user(&self) -> Result<ReturningUser, DeviceError> {
        let Some(stored) = self.read_record() else {
            return Ok(ReturningUser::no());
        };

        let current = self.current_fingerprint()?;

        let previous = match stored.device_fingerprint.as_deref().map(DeviceFingerprint::parse) {
            Some(Ok(fp)) => fp,
            Some(Err(e)) => {
                tracing::warn!("Ignoring stored quiz completion: {}", e);
                return Ok(ReturningUser::no());
            }
            None => return Ok(ReturningUser::no()),
        };

        if previous == current {
            return Ok(ReturningUser {
                is_returning: true,
                previous_user_id: stored.user_id,
            });
        }

        Ok(ReturningUser::no())
    }

    /// Forgets the local record, as clearing browser data would.
    pub fn reset(&self) -> Result<(), DeviceError> {
        self.storage.remove_item(COMPLETION_STORAGE_KEY)
    }

    fn read_record(&self) -> Option<StoredCompletion> {
        let raw = match self.storage.get_item(COMPLETION_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Error reading quiz completion data: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(stored) => Some(stored),
            Err(e) => {
                tracing::warn!("Error parsing quiz completion data: {}", e);
                None
            }
        }
    }
}
