// tests/api_tests.rs

mod common;

use common::{ADMIN_EMAIL, ADMIN_PASSWORD, guest_token, login_token, seed_scenario, spawn_app};

#[tokio::test]
async fn unknown_path_is_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for path in [
        "/random_path_that_does_not_exist",
        "/api/quiz/unknown",
        "/api/auth/unknown",
        "/api/admin/unknown",
    ] {
        let response = client
            .get(format!("{}{}", app.address, path))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status().as_u16(), 404, "{}", path);
    }
}

#[tokio::test]
async fn register_and_login() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let email = format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);

    let register = |email: String, password: &'static str| {
        let client = client.clone();
        let url = format!("{}/api/auth/register", app.address);
        async move {
            client
                .post(url)
                .json(&serde_json::json!({ "email": email, "password": password }))
                .send()
                .await
                .expect("Failed to execute request")
        }
    };

    let created = register(email.clone(), "password123").await;
    assert_eq!(created.status().as_u16(), 201);
    let user: serde_json::Value = created.json().await.unwrap();
    assert_eq!(user["auth_provider"], "email");
    assert!(user.get("password").is_none(), "password hash must not leak");

    assert_eq!(register(email.to_uppercase(), "password123").await.status().as_u16(), 409);
    assert_eq!(register("not-an-email".to_string(), "password123").await.status().as_u16(), 400);
    assert_eq!(register("short@example.com".to_string(), "123").await.status().as_u16(), 400);

    let wrong = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status().as_u16(), 401);

    let token = login_token(&client, &app.address, &email, "password123").await;
    let me: serde_json::Value = client
        .get(format!("{}/api/auth/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["email"], email);
    assert_eq!(me["display_name"], email.split('@').next().unwrap());
}

#[tokio::test]
async fn guest_login_issues_identity() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/guest", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    let user_id = body["user_id"].as_str().unwrap();
    assert_eq!(body["is_guest"], true);
    assert_eq!(body["type"], "Bearer");
    assert_eq!(body["display_name"], format!("Guest-{}", &user_id[..6]));

    let me: serde_json::Value = client
        .get(format!("{}/api/auth/me", app.address))
        .bearer_auth(body["token"].as_str().unwrap())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["auth_provider"], "guest");
}

#[tokio::test]
async fn participant_routes_require_token() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    for path in ["/api/results", "/api/survey", "/api/auth/me"] {
        let response = client
            .get(format!("{}{}", app.address, path))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 401, "{}", path);
    }

    let forged = client
        .get(format!("{}/api/results", app.address))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(forged.status().as_u16(), 401);
}

#[tokio::test]
async fn scenarios_hide_answers_and_order_messages() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let id = seed_scenario(&app.pool, "Parcel held at customs", "scam").await;
    seed_scenario(&app.pool, "Bank statement ready", "safe").await;

    let scenarios: Vec<serde_json::Value> = client
        .get(format!("{}/api/scenarios", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(scenarios.len(), 2);
    assert!(scenarios[0].get("correct_answer").is_none());
    let texts: Vec<&str> = scenarios[0]["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["message"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["first", "second", "third"]);

    let one = client
        .get(format!("{}/api/scenarios/{}", app.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(one.status().as_u16(), 200);

    let missing = client
        .get(format!("{}/api/scenarios/9999", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn answering_scenarios() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let scam = seed_scenario(&app.pool, "Prize winner", "scam").await;
    let safe = seed_scenario(&app.pool, "Delivery slot", "safe").await;
    let (token, _) = guest_token(&client, &app.address).await;

    let answer = |scenario_id: i64, answer: &'static str| {
        let client = client.clone();
        let url = format!("{}/api/quiz/answers", app.address);
        let token = token.clone();
        async move {
            client
                .post(url)
                .bearer_auth(token)
                .json(&serde_json::json!({ "scenario_id": scenario_id, "answer": answer }))
                .send()
                .await
                .unwrap()
        }
    };

    let first = answer(scam, "scam").await;
    assert_eq!(first.status().as_u16(), 200);
    let feedback: serde_json::Value = first.json().await.unwrap();
    assert_eq!(feedback["is_correct"], true);
    assert_eq!(feedback["warning_signs"].as_array().unwrap().len(), 4);

    // The first answer stands.
    assert_eq!(answer(scam, "safe").await.status().as_u16(), 409);

    let wrong: serde_json::Value = answer(safe, "scam").await.json().await.unwrap();
    assert_eq!(wrong["is_correct"], false);
    assert_eq!(wrong["message"], "Incorrect. This was actually a safe.");

    assert_eq!(answer(9999, "safe").await.status().as_u16(), 404);
    assert_eq!(answer(safe, "maybe").await.status().as_u16(), 400);

    let results: serde_json::Value = client
        .get(format!("{}/api/results", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(results["total_scenarios"], 2);
    assert_eq!(results["correct_answers"], 1);
    assert_eq!(results["incorrect_answers"], 1);
    assert_eq!(results["score"], 50);
    assert_eq!(results["rating"], "Keep learning!");
    assert_eq!(results["scenario_results"][0]["title"], "Prize winner");
    assert_eq!(results["scenario_results"][0]["user_answer"], "scam");
}

#[tokio::test]
async fn survey_upsert_and_validation() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, user_id) = guest_token(&client, &app.address).await;
    let url = format!("{}/api/survey", app.address);

    let none_yet = client.get(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(none_yet.status().as_u16(), 404);

    let invalid = client
        .post(&url)
        .bearer_auth(&token)
        .json(&serde_json::json!({ "age_group": "18-24", "tech_familiarity": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status().as_u16(), 400);

    let saved: serde_json::Value = client
        .post(&url)
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "age_group": "25-34",
            "gender": "prefer-not-to-say",
            "education_level": "bachelors",
            "feedback": "<script>alert(1)</script>Nice quiz & 10/10 <i>would</i> learn again"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved["user_id"], user_id);
    assert_eq!(saved["tech_familiarity"], 3);
    assert_eq!(saved["feedback"], "Nice quiz & 10/10 would learn again");

    client
        .post(&url)
        .bearer_auth(&token)
        .json(&serde_json::json!({ "age_group": "65+", "tech_familiarity": 5 }))
        .send()
        .await
        .unwrap();

    let current: serde_json::Value = client
        .get(&url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["age_group"], "65+");
    assert_eq!(current["tech_familiarity"], 5);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM survey_responses WHERE user_id = ?")
        .bind(&user_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn completions_are_insert_only_and_owned() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (token, user_id) = guest_token(&client, &app.address).await;
    let (_, other_user) = guest_token(&client, &app.address).await;
    let url = format!("{}/api/completions", app.address);
    let fingerprint = "a".repeat(64);

    for _ in 0..2 {
        let created = client
            .post(&url)
            .bearer_auth(&token)
            .json(&serde_json::json!({
                "user_id": user_id,
                "device_fingerprint": fingerprint,
                "completed_at": 1_700_000_000_000i64
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(created.status().as_u16(), 201);
    }

    let garbled = client
        .post(&url)
        .bearer_auth(&token)
        .json(&serde_json::json!({ "user_id": user_id, "device_fingerprint": "not-a-digest" }))
        .send()
        .await
        .unwrap();
    assert_eq!(garbled.status().as_u16(), 400);

    let uppercase = client
        .post(&url)
        .bearer_auth(&token)
        .json(&serde_json::json!({ "user_id": user_id, "device_fingerprint": "B".repeat(64) }))
        .send()
        .await
        .unwrap();
    assert_eq!(uppercase.status().as_u16(), 201);
    let stored: serde_json::Value = uppercase.json().await.unwrap();
    assert_eq!(stored["device_fingerprint"], "b".repeat(64));

    let foreign = client
        .post(&url)
        .bearer_auth(&token)
        .json(&serde_json::json!({ "user_id": other_user, "device_fingerprint": fingerprint }))
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status().as_u16(), 403);

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_completions WHERE device_fingerprint = ?")
        .bind(&fingerprint)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(rows, 2);
}

#[tokio::test]
async fn admin_manages_scenarios() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let (guest, _) = guest_token(&client, &app.address).await;
    let admin = login_token(&client, &app.address, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let url = format!("{}/api/admin/scenarios", app.address);

    let payload = serde_json::json!({
        "title": "Refund <b onclick=\"x()\">pending</b>",
        "description": "A caller offers a tax refund",
        "scenario_type": "call",
        "correct_answer": "scam",
        "messages": [
            { "message": "Refunds & rebates: visit tax.example/claim?id=7&pin=1", "sender": "caller" },
            { "message": "Who is this?", "sender": "me" }
        ]
    });

    let denied = client.post(&url).bearer_auth(&guest).json(&payload).send().await.unwrap();
    assert_eq!(denied.status().as_u16(), 403);

    let created = client.post(&url).bearer_auth(&admin).json(&payload).send().await.unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let body: serde_json::Value = created.json().await.unwrap();
    let id = body["scenario"]["id"].as_i64().unwrap();
    assert_eq!(body["scenario"]["title"], "Refund pending");
    assert_eq!(
        body["messages"][0]["message"],
        "Refunds & rebates: visit tax.example/claim?id=7&pin=1"
    );
    assert_eq!(body["messages"][1]["order_index"], 1);
    assert_eq!(body["messages"][1]["sender"], "me");

    let delete_url = format!("{}/{}", url, id);
    let deleted = client.delete(&delete_url).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    let again = client.delete(&delete_url).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(again.status().as_u16(), 404);

    let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scenario_messages WHERE scenario_id = ?")
        .bind(id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(orphans, 0);
}
