// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
/// Registered (email) and guest participants share this table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    /// UUID, also the JWT subject.
    pub id: String,

    /// Only set for email accounts.
    pub email: Option<String>,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: Option<String>,

    /// 'email' or 'guest'.
    pub auth_provider: String,

    pub provider_id: String,

    pub display_name: String,

    /// User role: 'user' or 'admin'.
    pub role: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn is_guest(&self) -> bool {
        self.auth_provider == "guest"
    }
}

/// DTO for creating a new email account (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for email login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Returned by login and guest sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub user_id: String,
    pub display_name: String,
    pub is_guest: bool,
}

/// Display name for a guest: `Guest-` plus the first six characters of the id.
pub fn guest_display_name(id: &str) -> String {
    let prefix: String = id.chars().take(6).collect();
    format!("Guest-{}", prefix)
}

/// Display name for an email account: the local part of the address.
pub fn email_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
