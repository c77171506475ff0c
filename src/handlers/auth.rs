// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{
        AuthResponse, CreateUserRequest, LoginRequest, User, email_display_name,
        guest_display_name,
    },
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

const USER_COLUMNS: &str =
    "id, email, password, auth_provider, provider_id, display_name, role, created_at";

fn auth_response(user: &User, config: &Config) -> Result<AuthResponse, AppError> {
    let token = sign_jwt(&user.id, &user.role, &config.jwt_secret, config.jwt_expiration)?;

    Ok(AuthResponse {
        token,
        token_type: "Bearer".to_string(),
        user_id: user.id.clone(),
        display_name: user.display_name.clone(),
        is_guest: user.is_guest(),
    })
}

/// Registers a new email account.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;
    let id = Uuid::new_v4().to_string();
    let email = payload.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, email, password, auth_provider, provider_id, display_name)
        VALUES (?, ?, ?, 'email', ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&id)
    .bind(&email)
    .bind(&hashed_password)
    .bind(&id)
    .bind(email_display_name(&email))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Email '{}' is already registered", email))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(user_id = %user.id, "email account registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates an email account and returns a JWT token.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ? AND auth_provider = 'email'"
    ))
    .bind(payload.email.trim().to_lowercase())
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::AuthError("Invalid email or password".to_string()))?;

    let stored_hash = user
        .password
        .as_deref()
        .ok_or(AppError::AuthError("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, stored_hash)? {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    Ok(Json(auth_response(&user, &config)?))
}

/// Creates a guest participant and signs a token for it.
///
/// Whether this device may start another guest attempt is decided on the
/// device itself; the server only issues the identity.
pub async fn guest_login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
) -> Result<impl IntoResponse, AppError> {
    let id = Uuid::new_v4().to_string();

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, auth_provider, provider_id, display_name)
        VALUES (?, 'guest', ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&id)
    .bind(&id)
    .bind(guest_display_name(&id))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create guest account: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!(user_id = %user.id, "guest account created");

    Ok((StatusCode::CREATED, Json(auth_response(&user, &config)?)))
}

/// Returns the authenticated user.
pub async fn me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user(&pool, claims.user_id())
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

pub async fn find_user(pool: &SqlitePool, id: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Creates the configured admin account if it does not exist yet.
pub async fn seed_admin_user(pool: &SqlitePool, config: &Config) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };
    let email = email.trim().to_lowercase();

    let exists = sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool)
        .await?;

    if exists.is_some() {
        return Ok(());
    }

    tracing::info!("Seeding admin user: {}", email);
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password, auth_provider, provider_id, display_name, role)
        VALUES (?, ?, ?, 'email', ?, ?, 'admin')
        "#,
    )
    .bind(&id)
    .bind(&email)
    .bind(hash_password(password)?)
    .bind(&id)
    .bind(email_display_name(&email))
    .execute(pool)
    .await?;

    tracing::info!("Admin user created successfully.");
    Ok(())
}
