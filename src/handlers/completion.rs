// src/handlers/completion.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    device::DeviceFingerprint,
    error::AppError,
    models::completion::{CompletionRequest, QuizCompletion},
    utils::jwt::Claims,
};

/// Stores a mirrored completion record. Insert-only.
///
/// Callers may only write records for themselves.
pub async fn record_completion(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CompletionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload.user_id != claims.user_id() {
        return Err(AppError::Forbidden(
            "Cannot record a completion for another user".to_string(),
        ));
    }

    let fingerprint = DeviceFingerprint::parse(&payload.device_fingerprint)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let completed_at = match payload.completed_at {
        Some(ms) => DateTime::<Utc>::from_timestamp_millis(ms)
            .ok_or(AppError::BadRequest("completed_at is out of range".to_string()))?,
        None => Utc::now(),
    };

    let completion = sqlx::query_as::<_, QuizCompletion>(
        r#"
        INSERT INTO quiz_completions (user_id, device_fingerprint, completed_at)
        VALUES (?, ?, ?)
        RETURNING id, user_id, device_fingerprint, completed_at
        "#,
    )
    .bind(&payload.user_id)
    .bind(fingerprint.as_str())
    .bind(completed_at)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Error marking quiz completed: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(
        user_id = %completion.user_id,
        fingerprint = %completion.device_fingerprint,
        "quiz completion mirrored"
    );

    Ok((StatusCode::CREATED, Json(completion)))
}
