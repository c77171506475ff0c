// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Storage key of the local completion record.
pub const COMPLETION_STORAGE_KEY: &str = "quizCompletionData";

/// Storage key of the persisted guest session.
pub const GUEST_SESSION_STORAGE_KEY: &str = "guestSession";

/// The only two answers a participant can give.
pub const ANSWER_SAFE: &str = "safe";
pub const ANSWER_SCAM: &str = "scam";

/// Hints shown after a scam scenario has been answered.
pub const SCAM_WARNING_SIGNS: [&str; 4] = [
    "Urgent requests for personal information",
    "Suspicious links or attachments",
    "Poor grammar or spelling",
    "Threats or unusual promises",
];

/// Allowed survey values.
pub const AGE_GROUPS: [&str; 7] = ["under18", "18-24", "25-34", "35-44", "45-54", "55-64", "65+"];
pub const GENDERS: [&str; 4] = ["male", "female", "non-binary", "prefer-not-to-say"];
pub const EDUCATION_LEVELS: [&str; 6] = [
    "high-school",
    "some-college",
    "bachelors",
    "masters",
    "doctorate",
    "other",
];
pub const DEFAULT_TECH_FAMILIARITY: i64 = 3;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub listen_addr: String,
    pub cors_origins: Vec<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://scam_quiz.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let listen_addr = env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let cors_origins = parse_origins(
            &env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string()),
        );

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            listen_addr,
            cors_origins,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
