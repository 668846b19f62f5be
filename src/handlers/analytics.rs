// src/handlers/analytics.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    grading::{StatisticsOutcome, attempt_breakdown, compute_statistics},
    models::{
        attempt::{AttemptAnswer, AttemptSummary},
        evaluation::EvaluationReport,
    },
    repository::{EvaluationRepository, EvaluationSnapshot, SharedRepository},
    utils::jwt::Claims,
};

use super::evaluation::find_owned_evaluation;

fn statistics_for(evaluation_id: i64, snapshot: &EvaluationSnapshot) -> StatisticsOutcome {
    let outcome = compute_statistics(&snapshot.questions, &snapshot.attempts, &snapshot.answers);
    if let StatisticsOutcome::InsufficientData { reason } = &outcome {
        tracing::info!(
            "Not enough data for statistics on evaluation {}: {:?}",
            evaluation_id,
            reason
        );
    }
    outcome
}

/// Aggregate statistics: attempt count, average/max/min score and
/// per-question accuracy. Owner only.
pub async fn evaluation_stats(
    State(repo): State<SharedRepository>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    find_owned_evaluation(&repo, id, &claims).await?;
    let snapshot = repo.fetch_snapshot(id).await?;

    Ok(Json(statistics_for(id, &snapshot)))
}

/// Same statistics as `evaluation_stats`, headed by the evaluation's title
/// and teacher. Owner only.
pub async fn evaluation_analytics(
    State(repo): State<SharedRepository>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let evaluation = find_owned_evaluation(&repo, id, &claims).await?;
    let snapshot = repo.fetch_snapshot(id).await?;

    Ok(Json(EvaluationReport {
        evaluation_title: evaluation.title,
        teacher_name: evaluation.teacher_name,
        statistics: statistics_for(id, &snapshot),
    }))
}

/// Lists attempts, newest first, each re-graded into correct/incorrect counts.
/// Owner only.
pub async fn list_attempts(
    State(repo): State<SharedRepository>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    find_owned_evaluation(&repo, id, &claims).await?;
    let snapshot = repo.fetch_snapshot(id).await?;

    let mut by_attempt: HashMap<i64, Vec<AttemptAnswer>> = HashMap::new();
    for answer in snapshot.answers {
        by_attempt.entry(answer.attempt_id).or_default().push(answer);
    }

    let summaries: Vec<AttemptSummary> = snapshot
        .attempts
        .into_iter()
        .map(|attempt| {
            let answers = by_attempt.remove(&attempt.id).unwrap_or_default();
            AttemptSummary {
                attempt_id: attempt.id,
                student_name: attempt.student_name,
                score: attempt.score,
                breakdown: attempt_breakdown(&snapshot.questions, &answers),
                created_at: attempt.created_at,
            }
        })
        .collect();

    Ok(Json(summaries))
}
