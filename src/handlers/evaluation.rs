// src/handlers/evaluation.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    grading::CorrectAnswerSpec,
    models::{
        evaluation::{CreateEvaluationRequest, Evaluation},
        question::{AnswerKeyQuestion, CreateQuestionRequest, NewQuestion, PublicQuestion},
    },
    repository::{EvaluationRepository, SharedRepository},
    utils::{
        html::{clean_all, clean_text},
        jwt::Claims,
    },
};

/// Loads an evaluation, answering 404 when it does not exist.
pub(crate) async fn find_evaluation(
    repo: &SharedRepository,
    id: i64,
) -> Result<Evaluation, AppError> {
    repo.find_evaluation(id)
        .await?
        .ok_or(AppError::NotFound("Evaluation not found".to_string()))
}

/// Loads an evaluation that the calling teacher created.
/// Returns 404 if it does not exist and 403 if it belongs to someone else.
pub(crate) async fn find_owned_evaluation(
    repo: &SharedRepository,
    id: i64,
    claims: &Claims,
) -> Result<Evaluation, AppError> {
    let user_id = claims.user_id()?;
    let evaluation = find_evaluation(repo, id).await?;
    if evaluation.teacher_id != user_id {
        return Err(AppError::Forbidden(
            "Only the evaluation's teacher can manage it".to_string(),
        ));
    }
    Ok(evaluation)
}

/// Creates an evaluation owned by the calling teacher.
pub async fn create_evaluation(
    State(repo): State<SharedRepository>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateEvaluationRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let title = clean_text(&payload.title);
    if title.is_empty() {
        return Err(AppError::BadRequest("Title cannot be empty".to_string()));
    }

    let teacher_id = claims.user_id()?;
    let evaluation = repo
        .create_evaluation(&title, teacher_id, &claims.name)
        .await?;
    tracing::info!("Teacher {} created evaluation {}", teacher_id, evaluation.id);

    Ok((StatusCode::CREATED, Json(evaluation)))
}

/// Lists the calling teacher's evaluations.
pub async fn list_evaluations(
    State(repo): State<SharedRepository>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let evaluations = repo
        .list_evaluations_by_teacher(claims.user_id()?)
        .await?;
    Ok(Json(evaluations))
}

/// Lists an evaluation's questions for students, without correct answers.
pub async fn list_questions(
    State(repo): State<SharedRepository>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    find_evaluation(&repo, id).await?;

    let questions: Vec<PublicQuestion> = repo
        .fetch_questions(id)
        .await?
        .into_iter()
        .map(PublicQuestion::from)
        .collect();

    Ok(Json(questions))
}

/// Lists an evaluation's questions with their normalized correct indices.
/// Owner only.
pub async fn answer_key(
    State(repo): State<SharedRepository>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    find_owned_evaluation(&repo, id, &claims).await?;

    let questions: Vec<AnswerKeyQuestion> = repo
        .fetch_questions(id)
        .await?
        .into_iter()
        .map(AnswerKeyQuestion::from)
        .collect();

    Ok(Json(questions))
}

/// Adds a question to an evaluation.
///
/// * Validates text, options and that every correct index addresses an option.
/// * Stores the correct answers as a sorted, de-duplicated list.
pub async fn add_question(
    State(repo): State<SharedRepository>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    if !payload.correct_indices_in_range() {
        return Err(AppError::BadRequest(
            "Correct answer index out of range".to_string(),
        ));
    }

    find_owned_evaluation(&repo, id, &claims).await?;

    let text = clean_text(&payload.text);
    let options = clean_all(&payload.options);
    if text.is_empty() || options.iter().any(|o| o.is_empty()) {
        return Err(AppError::BadRequest(
            "Question text and options cannot be empty".to_string(),
        ));
    }

    let question = repo
        .add_question(
            id,
            NewQuestion {
                text,
                options,
                correct_answer: CorrectAnswerSpec::from_indices(payload.correct_index),
                multiple: payload.multiple,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AnswerKeyQuestion::from(question))))
}
