// src/device/mod.rs

//! Device revisit heuristic.
//!
//! A device is identified by a SHA-256 fingerprint of its environment
//! attributes. When a quiz run finishes, a [`CompletionRecord`] is written to
//! the device's local storage (the gate) and mirrored to the record store
//! (best effort). Clearing local storage resets the gate.

pub mod fingerprint;
pub mod mirror;
pub mod storage;
pub mod tracker;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fingerprint::{
    DeviceFingerprint, EnvironmentProbe, FingerprintComponents, HostProbe, StaticProbe,
    generate_fingerprint,
};
pub use mirror::{NoopMirror, RemoteMirror};
pub use storage::{FileStorage, LocalStorage, MemoryStorage};
pub use tracker::{CompletionTracker, ReturningUser};

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("environment probe failed: {0}")]
    Probe(String),

    #[error("invalid device fingerprint: {0:?}")]
    InvalidFingerprint(String),

    #[error("local storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("local storage holds malformed data: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("local storage lock poisoned")]
    StoragePoisoned,

    #[error("remote mirror write failed: {0}")]
    Mirror(String),
}

/// Proof that this device finished one quiz attempt.
///
/// Serialized in camelCase with `completedAt` in Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub user_id: String,
    pub device_fingerprint: String,
    pub completed_at: i64,
}

impl CompletionRecord {
    pub fn new(user_id: &str, fingerprint: &DeviceFingerprint) -> Self {
        Self {
            user_id: user_id.to_string(),
            device_fingerprint: fingerprint.to_string(),
            completed_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
