// tests/postgres_tests.rs

//! Runs the HTTP flow against the real Postgres storage.
//! Needs a running database in `DATABASE_URL`; skipped when it is unset.

use std::sync::Arc;

use edutest::{
    config::Config,
    grading::CorrectAnswerSpec,
    repository::{EvaluationRepository, PgRepository},
    routes,
    state::AppState,
};
use serde_json::{Value, json};
use sqlx::{PgPool, postgres::PgPoolOptions};

/// Spawns the app over a migrated Postgres pool.
/// Returns `None` when no database is configured.
async fn spawn_app() -> Option<(String, PgPool)> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url,
        jwt_secret: "postgres_test_secret".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        allowed_origins: vec![],
        log_dir: "logs".to_string(),
    };

    let state = AppState {
        repo: Arc::new(PgRepository::new(pool.clone())),
        config,
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Some((address, pool))
}

async fn teacher_token(client: &reqwest::Client, address: &str) -> String {
    let email = format!("pg_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);

    let resp = client
        .post(&format!("{}/api/auth/register", address))
        .json(&json!({ "name": "pg teacher", "email": email, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let login = client
        .post(&format!("{}/api/auth/login", address))
        .json(&json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap();

    login["token"].as_str().expect("Token not found").to_string()
}

async fn get_json(client: &reqwest::Client, url: String, token: &str) -> Value {
    let resp = client
        .get(&url)
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200, "GET {}", url);
    resp.json().await.unwrap()
}

/// Inserts a question row with a raw JSONB correct answer, as older writers did.
async fn insert_legacy_question(pool: &PgPool, evaluation_id: i64, correct_index: Option<Value>) {
    sqlx::query(
        r#"
        INSERT INTO questions (evaluation_id, text, options, correct_index, multiple)
        VALUES ($1, 'Legacy', $2, $3, TRUE)
        "#,
    )
    .bind(evaluation_id)
    .bind(sqlx::types::Json(json!(["A", "B", "C"])))
    .bind(correct_index.map(sqlx::types::Json))
    .execute(pool)
    .await
    .expect("Failed to insert legacy question");
}

#[tokio::test]
async fn test_multi_select_flow_on_postgres() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let token = teacher_token(&client, &address).await;

    let eval_id = client
        .post(&format!("{}/api/evaluations", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "title": "Postgres flow" }))
        .send()
        .await
        .unwrap()
        .json::<Value>()
        .await
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    // Stored canonically as [1, 3]
    let resp = client
        .post(&format!("{}/api/evaluations/{}/questions", address, eval_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "text": "Pick the odd numbers",
            "options": ["2", "3", "4", "5"],
            "correct_index": [3, 1, 1],
            "multiple": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    assert_eq!(resp.json::<Value>().await.unwrap()["correct_index"], json!([1, 3]));

    insert_legacy_question(&pool, eval_id, Some(json!("0, 2"))).await;
    insert_legacy_question(&pool, eval_id, None).await;

    let submissions = [
        ("Ana", json!([[3, 1], [2, 0], []]), 3),
        ("Luis", json!([[1], [0, 2], [0]]), 1),
    ];
    for (student, answers, expected) in submissions {
        let result: Value = client
            .post(&format!("{}/api/evaluations/{}/submit", address, eval_id))
            .json(&json!({ "student_name": student, "answers": answers }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(result["score"], expected, "student {}", student);
        assert_eq!(result["total_questions"], 3);
    }

    let stats = get_json(
        &client,
        format!("{}/api/evaluations/{}/stats", address, eval_id),
        &token,
    )
    .await;
    assert_eq!(stats["status"], "ready");
    assert_eq!(stats["total_attempts"], 2);
    assert_eq!(stats["avg_score"], 2.0);
    assert_eq!(stats["max_score"], 3);
    assert_eq!(stats["min_score"], 1);
    let accuracy: Vec<f64> = stats["per_question_accuracy"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["accuracy_pct"].as_f64().unwrap())
        .collect();
    // Ana left the last question blank, so only Luis counts there.
    assert_eq!(accuracy, vec![50.0, 100.0, 0.0]);

    let attempts = get_json(
        &client,
        format!("{}/api/evaluations/{}/attempts", address, eval_id),
        &token,
    )
    .await;
    assert_eq!(attempts[0]["student_name"], "Luis");
    assert_eq!(attempts[0]["correct"], 1);
    assert_eq!(attempts[0]["incorrect"], 2);
    assert_eq!(attempts[1]["student_name"], "Ana");
    assert_eq!(attempts[1]["correct"], 2);
    assert_eq!(attempts[1]["total"], 2);

    let repo = PgRepository::new(pool);
    let snapshot = repo.fetch_snapshot(eval_id).await.unwrap();
    assert_eq!(snapshot.questions.len(), 3);
    assert_eq!(
        snapshot.questions[1].correct_answer,
        CorrectAnswerSpec::Delimited("0, 2".to_string())
    );
    assert_eq!(snapshot.questions[2].correct_answer, CorrectAnswerSpec::Absent);
    assert_eq!(snapshot.attempts.len(), 2);
    assert_eq!(snapshot.answers.len(), 8);
    assert!(
        snapshot
            .answers
            .iter()
            .all(|ans| snapshot.attempts.iter().any(|a| a.id == ans.attempt_id))
    );
}
