// src/routes.rs

use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{MethodRouter, get, post},
};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{analytics, auth, evaluation, submission},
    state::AppState,
    utils::jwt::{auth_middleware, teacher_middleware},
};

/// Wraps a method router so it only serves authenticated teachers.
/// Auth runs first, then the role check.
fn teacher_only(route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    route
        .route_layer(middleware::from_fn(teacher_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "EduTest Analytics API" }))
}

/// Assembles the main application router.
///
/// * Public: registration, login, listing questions, submitting attempts.
/// * Teacher only: managing evaluations and reading their analytics.
/// * Global middleware: request tracing and CORS.
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let evaluation_routes = Router::new()
        .route(
            "/",
            teacher_only(
                get(evaluation::list_evaluations).post(evaluation::create_evaluation),
                &state,
            ),
        )
        .route(
            "/{id}/questions",
            get(evaluation::list_questions)
                .merge(teacher_only(post(evaluation::add_question), &state)),
        )
        .route(
            "/{id}/answer-key",
            teacher_only(get(evaluation::answer_key), &state),
        )
        .route("/{id}/submit", post(submission::submit_attempt))
        .route(
            "/{id}/stats",
            teacher_only(get(analytics::evaluation_stats), &state),
        )
        .route(
            "/{id}/analytics",
            teacher_only(get(analytics::evaluation_analytics), &state),
        )
        .route(
            "/{id}/attempts",
            teacher_only(get(analytics::list_attempts), &state),
        );

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.allowed_origins));

    Router::new()
        .route("/api", get(root))
        .nest("/api/auth", auth_routes)
        .nest("/api/evaluations", evaluation_routes)
        .layer(middleware)
        .with_state(state)
}
