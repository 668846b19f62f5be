// tests/api_tests.rs

use std::sync::Arc;

use axum::{body::Body, http::Request};
use edutest::{config::Config, repository::MemoryRepository, routes, state::AppState};
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        allowed_origins: vec!["http://localhost:5173".to_string()],
        log_dir: "logs".to_string(),
    }
}

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let state = AppState {
        repo: Arc::new(MemoryRepository::new()),
        config: test_config(),
    };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn unique_email() -> String {
    format!("t_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8])
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn root_banner_without_server() {
    let state = AppState {
        repo: Arc::new(MemoryRepository::new()),
        config: test_config(),
    };
    let app = routes::create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/api").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn register_works() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Profe Ana",
            "email": unique_email(),
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["role"], "teacher");
    assert!(body.get("password_hash").is_none(), "hash must not leak");
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    for expected in [201, 409] {
        let response = client
            .post(&format!("{}/api/auth/register", address))
            .json(&serde_json::json!({
                "name": "Profe",
                "email": email,
                "password": "password123"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), expected);
    }
}

#[tokio::test]
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act: invalid email and a password that is too short
    let response = client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Profe",
            "email": "not-an-email",
            "password": "pw"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn login_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let email = unique_email();

    client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Profe",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Register failed");

    // Wrong password
    let bad = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 401);

    // Unknown user
    let unknown = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": unique_email(), "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status().as_u16(), 401);

    let login_resp = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");

    assert!(login_resp["token"].as_str().is_some());
    assert_eq!(login_resp["type"], "Bearer");
    assert_eq!(login_resp["role"], "teacher");
}

#[tokio::test]
async fn teacher_routes_require_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let missing = client
        .post(&format!("{}/api/evaluations", address))
        .json(&serde_json::json!({ "title": "Quiz" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 401);

    let invalid = client
        .get(&format!("{}/api/evaluations", address))
        .header("Authorization", "Bearer not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status().as_u16(), 401);
}

#[tokio::test]
async fn unknown_evaluation_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let questions = client
        .get(&format!("{}/api/evaluations/999/questions", address))
        .send()
        .await
        .unwrap();
    assert_eq!(questions.status().as_u16(), 404);

    let submit = client
        .post(&format!("{}/api/evaluations/999/submit", address))
        .json(&serde_json::json!({ "student_name": "Ana", "answers": [[0]] }))
        .send()
        .await
        .unwrap();
    assert_eq!(submit.status().as_u16(), 404);
}
