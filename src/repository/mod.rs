// src/repository/mod.rs

//! Persistence behind async traits.
//!
//! Handlers only see `Arc<dyn Repository>`; `PgRepository` backs the server
//! and `MemoryRepository` backs the integration tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, AttemptAnswer, NewAttempt},
        evaluation::Evaluation,
        question::{NewQuestion, Question},
        user::{NewUser, User},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

/// Everything stored for one evaluation, as of one point in time.
#[derive(Debug, Clone, Default)]
pub struct EvaluationSnapshot {
    /// Creation order.
    pub questions: Vec<Question>,
    /// Newest first.
    pub attempts: Vec<Attempt>,
    pub answers: Vec<AttemptAnswer>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user. Returns `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    /// Creates an evaluation owned by the user `teacher_id`.
    async fn create_evaluation(
        &self,
        title: &str,
        teacher_id: i64,
        teacher_name: &str,
    ) -> Result<Evaluation, AppError>;

    async fn find_evaluation(&self, id: i64) -> Result<Option<Evaluation>, AppError>;

    async fn list_evaluations_by_teacher(
        &self,
        teacher_id: i64,
    ) -> Result<Vec<Evaluation>, AppError>;

    async fn add_question(
        &self,
        evaluation_id: i64,
        question: NewQuestion,
    ) -> Result<Question, AppError>;

    /// Questions of an evaluation in creation order.
    async fn fetch_questions(&self, evaluation_id: i64) -> Result<Vec<Question>, AppError>;

    async fn fetch_attempts(&self, evaluation_id: i64) -> Result<Vec<Attempt>, AppError>;

    /// Every answer row of every attempt of the evaluation.
    async fn fetch_answers(&self, evaluation_id: i64) -> Result<Vec<AttemptAnswer>, AppError>;

    /// Questions, attempts and answer rows read from a single snapshot, so an
    /// attempt committed mid-read shows up in all three or in none.
    async fn fetch_snapshot(&self, evaluation_id: i64) -> Result<EvaluationSnapshot, AppError>;

    /// Stores an attempt and its answer rows atomically.
    async fn record_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AppError>;
}

/// Everything the HTTP layer needs from storage.
pub trait Repository: UserRepository + EvaluationRepository {}

impl<T: UserRepository + EvaluationRepository> Repository for T {}

pub type SharedRepository = Arc<dyn Repository>;
