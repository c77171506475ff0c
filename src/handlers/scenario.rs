// src/handlers/scenario.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::scenario::{PublicScenario, ScenarioMessage, ScenarioRow},
};

pub(crate) const SCENARIO_COLUMNS: &str =
    "id, title, description, scenario_type, correct_answer";

/// Lists every scenario with its conversation, messages in display order.
pub async fn list_scenarios(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, ScenarioRow>(&format!(
        "SELECT {SCENARIO_COLUMNS} FROM scenarios ORDER BY id"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch scenarios: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    // One query for all messages instead of one per scenario.
    let messages = sqlx::query_as::<_, ScenarioMessage>(
        r#"
        SELECT id, scenario_id, message, sender, order_index
        FROM scenario_messages
        ORDER BY scenario_id, order_index
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch scenario messages: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let mut by_scenario: HashMap<i64, Vec<ScenarioMessage>> = HashMap::new();
    for message in messages {
        by_scenario.entry(message.scenario_id).or_default().push(message);
    }

    let scenarios: Vec<PublicScenario> = rows
        .into_iter()
        .map(|row| {
            let messages = by_scenario.remove(&row.id).unwrap_or_default();
            PublicScenario::from_parts(row, messages)
        })
        .collect();

    Ok(Json(scenarios))
}

/// Returns one scenario with its conversation.
pub async fn get_scenario(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let row = find_scenario(&pool, id)
        .await?
        .ok_or(AppError::NotFound(format!("Scenario {} not found", id)))?;

    let messages = scenario_messages(&pool, id).await?;

    Ok(Json(PublicScenario::from_parts(row, messages)))
}

pub(crate) async fn find_scenario(pool: &SqlitePool, id: i64) -> Result<Option<ScenarioRow>, AppError> {
    let row = sqlx::query_as::<_, ScenarioRow>(&format!(
        "SELECT {SCENARIO_COLUMNS} FROM scenarios WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub(crate) async fn scenario_messages(
    pool: &SqlitePool,
    scenario_id: i64,
) -> Result<Vec<ScenarioMessage>, AppError> {
    let messages = sqlx::query_as::<_, ScenarioMessage>(
        r#"
        SELECT id, scenario_id, message, sender, order_index
        FROM scenario_messages
        WHERE scenario_id = ?
        ORDER BY order_index
        "#,
    )
    .bind(scenario_id)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}
