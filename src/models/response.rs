// src/models/response.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::scenario::validate_answer;

/// Represents the 'user_responses' table in the database.
/// At most one row per (user, scenario).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub user_id: String,
    pub scenario_id: i64,
    pub user_answer: String,
    pub is_correct: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for answering one scenario.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnswerRequest {
    pub scenario_id: i64,
    #[validate(custom(function = validate_answer))]
    pub answer: String,
}

/// Feedback shown after answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerFeedback {
    pub scenario_id: i64,
    pub user_answer: String,
    pub is_correct: bool,
    pub correct_answer: String,
    pub message: String,
    /// Only filled for scam scenarios.
    pub warning_signs: Vec<String>,
}

/// One answered scenario, joined with the scenario's title and key.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScenarioResult {
    #[sqlx(rename = "scenario_id")]
    pub id: i64,
    pub title: String,
    pub is_correct: bool,
    pub user_answer: String,
    pub correct_answer: String,
}

/// Score summary for one participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total_scenarios: usize,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    /// Rounded percentage of correct answers.
    pub score: u32,
    pub rating: String,
    pub scenario_results: Vec<ScenarioResult>,
}

impl ResultSummary {
    pub fn from_results(scenario_results: Vec<ScenarioResult>) -> Self {
        let total_scenarios = scenario_results.len();
        let correct_answers = scenario_results.iter().filter(|r| r.is_correct).count();
        let score = score_percentage(correct_answers, total_scenarios);

        Self {
            total_scenarios,
            correct_answers,
            incorrect_answers: total_scenarios - correct_answers,
            score,
            rating: rating_for(score).to_string(),
            scenario_results,
        }
    }
}

/// Percentage of correct answers rounded half up, 0 when nothing was answered.
pub fn score_percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u32
}

pub fn rating_for(score: u32) -> &'static str {
    if score >= 80 {
        "Excellent!"
    } else if score >= 60 {
        "Good job!"
    } else {
        "Keep learning!"
    }
}
