// src/models/scenario.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::config::{ANSWER_SAFE, ANSWER_SCAM};

/// Represents the 'scenarios' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub id: i64,
    pub title: String,
    pub description: String,

    /// Presentation hint for the conversation (e.g. "sms", "chat", "email").
    pub scenario_type: String,

    /// 'safe' or 'scam'.
    pub correct_answer: String,
}

/// Represents the 'scenario_messages' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScenarioMessage {
    pub id: i64,
    pub scenario_id: i64,
    pub message: String,
    pub sender: String,
    pub order_index: i64,
}

/// DTO for sending a scenario to participants (excludes the correct answer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicScenario {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub scenario_type: String,
    /// Ordered by `order_index`.
    pub messages: Vec<ScenarioMessage>,
}

impl PublicScenario {
    pub fn from_parts(row: ScenarioRow, messages: Vec<ScenarioMessage>) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            scenario_type: row.scenario_type,
            messages,
        }
    }
}

/// DTO for creating a scenario together with its conversation.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateScenarioRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[validate(length(min = 1, max = 50))]
    pub scenario_type: String,
    #[validate(custom(function = validate_answer))]
    pub correct_answer: String,
    /// Stored in the given order.
    #[validate(length(min = 1, max = 100))]
    #[validate(nested)]
    pub messages: Vec<CreateMessageRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateMessageRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    #[validate(length(min = 1, max = 50))]
    pub sender: String,
}

/// Accepts only 'safe' or 'scam'.
pub fn validate_answer(answer: &str) -> Result<(), validator::ValidationError> {
    if answer == ANSWER_SAFE || answer == ANSWER_SCAM {
        Ok(())
    } else {
        Err(validator::ValidationError::new("answer_must_be_safe_or_scam"))
    }
}
