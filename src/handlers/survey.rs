// src/handlers/survey.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::survey::{SurveyRequest, SurveyResponse},
    utils::{html::clean_text, jwt::Claims},
};

const SURVEY_COLUMNS: &str =
    "user_id, age_group, gender, education_level, tech_familiarity, feedback, created_at";

/// Saves the caller's survey; a second submission replaces the first.
pub async fn submit_survey(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SurveyRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let survey = sqlx::query_as::<_, SurveyResponse>(&format!(
        r#"
        INSERT INTO survey_responses
            (user_id, age_group, gender, education_level, tech_familiarity, feedback)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            age_group = excluded.age_group,
            gender = excluded.gender,
            education_level = excluded.education_level,
            tech_familiarity = excluded.tech_familiarity,
            feedback = excluded.feedback
        RETURNING {SURVEY_COLUMNS}
        "#
    ))
    .bind(claims.user_id())
    .bind(&payload.age_group)
    .bind(&payload.gender)
    .bind(&payload.education_level)
    .bind(payload.tech_familiarity)
    .bind(clean_text(&payload.feedback))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save survey: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(survey))
}

/// Returns the caller's survey.
pub async fn get_survey(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let survey = sqlx::query_as::<_, SurveyResponse>(&format!(
        "SELECT {SURVEY_COLUMNS} FROM survey_responses WHERE user_id = ?"
    ))
    .bind(claims.user_id())
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("No survey submitted".to_string()))?;

    Ok(Json(survey))
}
