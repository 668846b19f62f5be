// src/repository/postgres.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, QueryBuilder, types::Json};

use super::{EvaluationRepository, EvaluationSnapshot, UserRepository};
use crate::{
    error::AppError,
    grading::CorrectAnswerSpec,
    models::{
        attempt::{Attempt, AttemptAnswer, NewAttempt},
        evaluation::Evaluation,
        question::{NewQuestion, Question},
        user::{NewUser, User},
    },
};

/// Postgres-backed storage.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw 'questions' row. `correct_index` keeps whatever shape was stored.
#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    evaluation_id: i64,
    text: String,
    options: Json<Vec<String>>,
    correct_index: Option<Json<Value>>,
    multiple: bool,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        let correct_answer = match row.correct_index {
            Some(Json(raw)) => CorrectAnswerSpec::from(&raw),
            None => CorrectAnswerSpec::Absent,
        };
        Question {
            id: row.id,
            evaluation_id: row.evaluation_id,
            text: row.text,
            options: row.options.0,
            correct_answer,
            multiple: row.multiple,
        }
    }
}

async fn select_questions<'e, E>(
    executor: E,
    evaluation_id: i64,
) -> Result<Vec<Question>, AppError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT id, evaluation_id, text, options, correct_index, multiple
        FROM questions
        WHERE evaluation_id = $1
        ORDER BY id
        "#,
    )
    .bind(evaluation_id)
    .fetch_all(executor)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(rows.into_iter().map(Question::from).collect())
}

async fn select_attempts<'e, E>(
    executor: E,
    evaluation_id: i64,
) -> Result<Vec<Attempt>, AppError>
where
    E: PgExecutor<'e>,
{
    let attempts = sqlx::query_as::<_, Attempt>(
        r#"
        SELECT id, evaluation_id, student_name, score, created_at
        FROM attempts
        WHERE evaluation_id = $1
        ORDER BY id DESC
        "#,
    )
    .bind(evaluation_id)
    .fetch_all(executor)
    .await?;

    Ok(attempts)
}

async fn select_answers<'e, E>(
    executor: E,
    evaluation_id: i64,
) -> Result<Vec<AttemptAnswer>, AppError>
where
    E: PgExecutor<'e>,
{
    let answers = sqlx::query_as::<_, AttemptAnswer>(
        r#"
        SELECT aa.id, aa.attempt_id, aa.question_id, aa.selected_index
        FROM attempt_answers aa
        JOIN attempts a ON aa.attempt_id = a.id
        WHERE a.evaluation_id = $1
        ORDER BY aa.id
        "#,
    )
    .bind(evaluation_id)
    .fetch_all(executor)
    .await?;

    Ok(answers)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, role, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Email '{}' is already registered", user.email))
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(user)
    }
}

#[async_trait]
impl EvaluationRepository for PgRepository {
    async fn create_evaluation(
        &self,
        title: &str,
        teacher_id: i64,
        teacher_name: &str,
    ) -> Result<Evaluation, AppError> {
        let evaluation = sqlx::query_as::<_, Evaluation>(
            r#"
            INSERT INTO evaluations (title, teacher_id, teacher_name)
            VALUES ($1, $2, $3)
            RETURNING id, title, teacher_id, teacher_name, created_at
            "#,
        )
        .bind(title)
        .bind(teacher_id)
        .bind(teacher_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create evaluation: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(evaluation)
    }

    async fn find_evaluation(&self, id: i64) -> Result<Option<Evaluation>, AppError> {
        let evaluation = sqlx::query_as::<_, Evaluation>(
            "SELECT id, title, teacher_id, teacher_name, created_at FROM evaluations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(evaluation)
    }

    async fn list_evaluations_by_teacher(
        &self,
        teacher_id: i64,
    ) -> Result<Vec<Evaluation>, AppError> {
        let evaluations = sqlx::query_as::<_, Evaluation>(
            r#"
            SELECT id, title, teacher_id, teacher_name, created_at
            FROM evaluations
            WHERE teacher_id = $1
            ORDER BY id
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(evaluations)
    }

    async fn add_question(
        &self,
        evaluation_id: i64,
        question: NewQuestion,
    ) -> Result<Question, AppError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            INSERT INTO questions (evaluation_id, text, options, correct_index, multiple)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, evaluation_id, text, options, correct_index, multiple
            "#,
        )
        .bind(evaluation_id)
        .bind(&question.text)
        .bind(Json(&question.options))
        .bind(Json(question.correct_answer.to_json()))
        .bind(question.multiple)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn fetch_questions(&self, evaluation_id: i64) -> Result<Vec<Question>, AppError> {
        select_questions(&self.pool, evaluation_id).await
    }

    async fn fetch_attempts(&self, evaluation_id: i64) -> Result<Vec<Attempt>, AppError> {
        select_attempts(&self.pool, evaluation_id).await
    }

    async fn fetch_answers(&self, evaluation_id: i64) -> Result<Vec<AttemptAnswer>, AppError> {
        select_answers(&self.pool, evaluation_id).await
    }

    async fn fetch_snapshot(&self, evaluation_id: i64) -> Result<EvaluationSnapshot, AppError> {
        let mut tx = self.pool.begin().await?;

        // Must be the first statement of the transaction.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let questions = select_questions(&mut *tx, evaluation_id).await?;
        let attempts = select_attempts(&mut *tx, evaluation_id).await?;
        let answers = select_answers(&mut *tx, evaluation_id).await?;

        tx.commit().await?;

        Ok(EvaluationSnapshot {
            questions,
            attempts,
            answers,
        })
    }

    async fn record_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AppError> {
        let mut tx = self.pool.begin().await?;

        let stored = sqlx::query_as::<_, Attempt>(
            r#"
            INSERT INTO attempts (evaluation_id, student_name, score)
            VALUES ($1, $2, $3)
            RETURNING id, evaluation_id, student_name, score, created_at
            "#,
        )
        .bind(attempt.evaluation_id)
        .bind(&attempt.student_name)
        .bind(attempt.score)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert attempt: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        let rows: Vec<(i64, i64)> = attempt
            .selections
            .iter()
            .flat_map(|(question_id, selected)| selected.iter().map(move |&i| (*question_id, i)))
            .collect();

        // An attempt that left every question blank has no rows to insert.
        if !rows.is_empty() {
            let mut query_builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO attempt_answers (attempt_id, question_id, selected_index) ",
            );
            query_builder.push_values(rows, |mut b, (question_id, selected_index)| {
                b.push_bind(stored.id)
                    .push_bind(question_id)
                    .push_bind(selected_index);
            });
            query_builder.build().execute(&mut *tx).await.map_err(|e| {
                tracing::error!("Failed to insert attempt answers: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;
        }

        tx.commit().await?;
        Ok(stored)
    }
}
