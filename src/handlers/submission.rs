// src/handlers/submission.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    grading::{IndexSet, score_attempt},
    models::attempt::{NewAttempt, SubmitAttemptRequest, SubmitAttemptResponse, SubmittedAnswer},
    repository::{EvaluationRepository, SharedRepository},
    utils::html::clean_text,
};

use super::evaluation::find_evaluation;

/// Submits a student's attempt and grades it.
///
/// * `answers` are matched to the evaluation's questions by position.
/// * Each question scores 1 only when the selected set equals the correct set.
/// * The attempt and its answer rows are stored together, with the final score.
pub async fn submit_attempt(
    State(repo): State<SharedRepository>,
    Path(evaluation_id): Path<i64>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = req.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let student_name = clean_text(&req.student_name);
    if student_name.is_empty() {
        return Err(AppError::BadRequest("Student name cannot be empty".to_string()));
    }

    find_evaluation(&repo, evaluation_id).await?;

    let questions = repo.fetch_questions(evaluation_id).await?;
    if questions.is_empty() {
        return Err(AppError::BadRequest(
            "Evaluation has no questions".to_string(),
        ));
    }

    let selections: Vec<IndexSet> = req
        .answers
        .into_iter()
        .map(SubmittedAnswer::into_set)
        .collect();

    let result = score_attempt(&questions, &selections)?;

    for (question, selected) in questions.iter().zip(&selections) {
        if let Some(index) = selected.iter().find(|&&i| !question.has_option(i)) {
            return Err(AppError::BadRequest(format!(
                "Selected index {} is out of range for question {}",
                index, question.id
            )));
        }
    }

    let attempt = repo
        .record_attempt(NewAttempt {
            evaluation_id,
            student_name,
            score: result.score,
            selections: questions.iter().map(|q| q.id).zip(selections).collect(),
        })
        .await?;

    tracing::info!(
        "Attempt {} on evaluation {} scored {}/{}",
        attempt.id,
        evaluation_id,
        result.score,
        result.total
    );

    Ok(Json(SubmitAttemptResponse {
        attempt_id: attempt.id,
        student_name: attempt.student_name,
        score: result.score,
        total_questions: result.total,
    }))
}
