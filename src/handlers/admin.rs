// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::scenario::{SCENARIO_COLUMNS, scenario_messages},
    models::scenario::{CreateScenarioRequest, ScenarioRow},
    utils::html::clean_text,
};

/// Creates a scenario and its messages in one transaction.
/// Admin only.
pub async fn create_scenario(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateScenarioRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = pool.begin().await?;

    let scenario = sqlx::query_as::<_, ScenarioRow>(&format!(
        r#"
        INSERT INTO scenarios (title, description, scenario_type, correct_answer)
        VALUES (?, ?, ?, ?)
        RETURNING {SCENARIO_COLUMNS}
        "#
    ))
    .bind(clean_text(&payload.title))
    .bind(clean_text(&payload.description))
    .bind(&payload.scenario_type)
    .bind(&payload.correct_answer)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create scenario: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    for (order_index, msg) in payload.messages.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO scenario_messages (scenario_id, message, sender, order_index)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(scenario.id)
        .bind(clean_text(&msg.message))
        .bind(&msg.sender)
        .bind(order_index as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let messages = scenario_messages(&pool, scenario.id).await?;
    tracing::info!(scenario_id = scenario.id, "scenario created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "scenario": scenario,
            "messages": messages,
        })),
    ))
}

/// Deletes a scenario; its messages and answers cascade.
/// Admin only.
pub async fn delete_scenario(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM scenarios WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete scenario: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Scenario {} not found", id)));
    }

    Ok(StatusCode::NO_CONTENT)
}
