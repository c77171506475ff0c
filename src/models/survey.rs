// src/models/survey.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::config::{AGE_GROUPS, DEFAULT_TECH_FAMILIARITY, EDUCATION_LEVELS, GENDERS};

/// Represents the 'survey_responses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub user_id: String,
    pub age_group: String,
    pub gender: String,
    pub education_level: String,
    pub tech_familiarity: i64,
    pub feedback: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for the post-quiz survey.
///
/// Select fields may be left empty; a non-empty value must be one of the
/// listed options.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SurveyRequest {
    #[serde(default)]
    #[validate(custom(function = validate_age_group))]
    pub age_group: String,
    #[serde(default)]
    #[validate(custom(function = validate_gender))]
    pub gender: String,
    #[serde(default)]
    #[validate(custom(function = validate_education_level))]
    pub education_level: String,
    #[serde(default = "default_tech_familiarity")]
    #[validate(range(min = 1, max = 5))]
    pub tech_familiarity: i64,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub feedback: String,
}

fn default_tech_familiarity() -> i64 {
    DEFAULT_TECH_FAMILIARITY
}

fn one_of(value: &str, allowed: &[&str], code: &'static str) -> Result<(), validator::ValidationError> {
    if value.is_empty() || allowed.contains(&value) {
        Ok(())
    } else {
        Err(validator::ValidationError::new(code))
    }
}

fn validate_age_group(value: &str) -> Result<(), validator::ValidationError> {
    one_of(value, &AGE_GROUPS, "unknown_age_group")
}

fn validate_gender(value: &str) -> Result<(), validator::ValidationError> {
    one_of(value, &GENDERS, "unknown_gender")
}

fn validate_education_level(value: &str) -> Result<(), validator::ValidationError> {
    one_of(value, &EDUCATION_LEVELS, "unknown_education_level")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let req: SurveyRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.tech_familiarity, 3);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_options() {
        let req: SurveyRequest = serde_json::from_value(serde_json::json!({
            "age_group": "18-24",
            "gender": "robot",
            "education_level": "masters",
            "tech_familiarity": 4
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_familiarity() {
        let req: SurveyRequest = serde_json::from_value(serde_json::json!({
            "tech_familiarity": 6
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }
}
