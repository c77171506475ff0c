// tests/common/mod.rs

#![allow(dead_code)]

use scam_quiz::{
    config::Config, db::memory_pool, handlers::auth::seed_admin_user, routes, state::AppState,
};
use sqlx::SqlitePool;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
}

/// Spawns the app on a random port over a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    let pool = memory_pool().await.expect("Failed to create test database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        admin_email: Some(ADMIN_EMAIL.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
    };

    seed_admin_user(&pool, &config)
        .await
        .expect("Failed to seed admin user");

    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
    }
}

/// Inserts a scenario with a short conversation, returning its id.
pub async fn seed_scenario(pool: &SqlitePool, title: &str, correct_answer: &str) -> i64 {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO scenarios (title, description, scenario_type, correct_answer)
        VALUES (?, ?, 'sms', ?)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(format!("{} description", title))
    .bind(correct_answer)
    .fetch_one(pool)
    .await
    .unwrap();

    // Inserted out of order to check the API sorts by order_index.
    for (order_index, text) in [(1, "second"), (0, "first"), (2, "third")] {
        sqlx::query(
            "INSERT INTO scenario_messages (scenario_id, message, sender, order_index) VALUES (?, ?, 'them', ?)",
        )
        .bind(id)
        .bind(text)
        .bind(order_index)
        .execute(pool)
        .await
        .unwrap();
    }

    id
}

/// Creates a guest and returns (token, user_id).
pub async fn guest_token(client: &reqwest::Client, address: &str) -> (String, String) {
    let body: serde_json::Value = client
        .post(format!("{}/api/auth/guest", address))
        .send()
        .await
        .expect("Guest login failed")
        .json()
        .await
        .unwrap();

    (
        body["token"].as_str().unwrap().to_string(),
        body["user_id"].as_str().unwrap().to_string(),
    )
}

pub async fn login_token(client: &reqwest::Client, address: &str, email: &str, password: &str) -> String {
    let body: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .unwrap();

    body["token"].as_str().expect("Token not found").to_string()
}
