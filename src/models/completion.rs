// src/models/completion.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quiz_completions' table in the database.
/// Insert-only mirror of the device-local completion records.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizCompletion {
    pub id: i64,
    pub user_id: String,
    pub device_fingerprint: String,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for mirroring a completion.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompletionRequest {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    /// Hex SHA-256 digest; stored lowercased.
    pub device_fingerprint: String,
    /// Unix milliseconds; the server clock is used when absent.
    pub completed_at: Option<i64>,
}
