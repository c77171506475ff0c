// src/handlers/quiz.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::{ANSWER_SCAM, SCAM_WARNING_SIGNS},
    error::AppError,
    handlers::scenario::find_scenario,
    models::response::{AnswerFeedback, AnswerRequest, ResultSummary, ScenarioResult, UserResponse},
    utils::jwt::Claims,
};

/// Builds the feedback shown after an answer.
pub fn feedback_for(scenario_id: i64, user_answer: &str, correct_answer: &str) -> AnswerFeedback {
    let is_correct = user_answer == correct_answer;

    let message = if is_correct {
        "Correct! You identified this correctly.".to_string()
    } else {
        format!("Incorrect. This was actually a {}.", correct_answer)
    };

    let warning_signs = if correct_answer == ANSWER_SCAM {
        SCAM_WARNING_SIGNS.iter().map(|s| s.to_string()).collect()
    } else {
        Vec::new()
    };

    AnswerFeedback {
        scenario_id,
        user_answer: user_answer.to_string(),
        is_correct,
        correct_answer: correct_answer.to_string(),
        message,
        warning_signs,
    }
}

/// Records the caller's answer to one scenario.
///
/// * 404 if the scenario does not exist.
/// * 409 if the caller already answered it; the first answer is kept.
/// * A failure while looking for an earlier answer is a 500, never a 409.
pub async fn submit_answer(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id();

    let scenario = find_scenario(&pool, payload.scenario_id)
        .await?
        .ok_or(AppError::NotFound(format!(
            "Scenario {} not found",
            payload.scenario_id
        )))?;

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM user_responses WHERE user_id = ? AND scenario_id = ?",
    )
    .bind(user_id)
    .bind(scenario.id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to check existing response: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if existing.is_some() {
        tracing::warn!(user_id, scenario_id = scenario.id, "scenario already answered");
        return Err(AppError::Conflict("Scenario already answered".to_string()));
    }

    let feedback = feedback_for(scenario.id, &payload.answer, &scenario.correct_answer);

    // A concurrent request may have inserted in between; the unique key decides.
    let saved = sqlx::query_as::<_, UserResponse>(
        r#"
        INSERT INTO user_responses (user_id, scenario_id, user_answer, is_correct)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id, scenario_id) DO NOTHING
        RETURNING id, user_id, scenario_id, user_answer, is_correct, created_at
        "#,
    )
    .bind(user_id)
    .bind(scenario.id)
    .bind(&feedback.user_answer)
    .bind(feedback.is_correct)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save response: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::Conflict("Scenario already answered".to_string()))?;

    tracing::info!(
        response_id = saved.id,
        user_id = %saved.user_id,
        scenario_id = saved.scenario_id,
        is_correct = saved.is_correct,
        "answer recorded"
    );

    Ok(Json(feedback))
}

/// Summarizes the caller's answers.
pub async fn get_results(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let results = sqlx::query_as::<_, ScenarioResult>(
        r#"
        SELECT
            r.scenario_id,
            s.title,
            r.is_correct,
            r.user_answer,
            s.correct_answer
        FROM user_responses r
        JOIN scenarios s ON s.id = r.scenario_id
        WHERE r.user_id = ?
        ORDER BY r.scenario_id
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch results: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(ResultSummary::from_results(results)))
}
