// src/repository/memory.rs

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EvaluationRepository, EvaluationSnapshot, UserRepository};
use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, AttemptAnswer, NewAttempt},
        evaluation::Evaluation,
        question::{NewQuestion, Question},
        user::{NewUser, User},
    },
};

/// In-process storage with the same contract as `PgRepository`.
/// Used to run the HTTP layer without a database.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    evaluations: Vec<Evaluation>,
    questions: Vec<Question>,
    attempts: Vec<Attempt>,
    answers: Vec<AttemptAnswer>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn questions_of(&self, evaluation_id: i64) -> Vec<Question> {
        let mut questions: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| q.evaluation_id == evaluation_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.id);
        questions
    }

    fn attempts_of(&self, evaluation_id: i64) -> Vec<Attempt> {
        let mut attempts: Vec<Attempt> = self
            .attempts
            .iter()
            .filter(|a| a.evaluation_id == evaluation_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| std::cmp::Reverse(a.id));
        attempts
    }

    fn answers_of(&self, evaluation_id: i64) -> Vec<AttemptAnswer> {
        self.answers
            .iter()
            .filter(|ans| {
                self.attempts
                    .iter()
                    .any(|a| a.id == ans.attempt_id && a.evaluation_id == evaluation_id)
            })
            .cloned()
            .collect()
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a question exactly as given, bypassing write-time canonicalization.
    /// Lets tests reproduce rows written in older correct-answer shapes.
    pub async fn insert_raw_question(&self, question: Question) {
        self.tables.write().await.questions.push(question);
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }

        let stored = User {
            id: tables.next_id(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Some(chrono::Utc::now()),
        };
        tables.users.push(stored.clone());
        Ok(stored)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl EvaluationRepository for MemoryRepository {
    async fn create_evaluation(
        &self,
        title: &str,
        teacher_id: i64,
        teacher_name: &str,
    ) -> Result<Evaluation, AppError> {
        let mut tables = self.tables.write().await;
        let evaluation = Evaluation {
            id: tables.next_id(),
            title: title.to_string(),
            teacher_id,
            teacher_name: teacher_name.to_string(),
            created_at: Some(chrono::Utc::now()),
        };
        tables.evaluations.push(evaluation.clone());
        Ok(evaluation)
    }

    async fn find_evaluation(&self, id: i64) -> Result<Option<Evaluation>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.evaluations.iter().find(|e| e.id == id).cloned())
    }

    async fn list_evaluations_by_teacher(
        &self,
        teacher_id: i64,
    ) -> Result<Vec<Evaluation>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .evaluations
            .iter()
            .filter(|e| e.teacher_id == teacher_id)
            .cloned()
            .collect())
    }

    async fn add_question(
        &self,
        evaluation_id: i64,
        question: NewQuestion,
    ) -> Result<Question, AppError> {
        let mut tables = self.tables.write().await;
        let stored = Question {
            id: tables.next_id(),
            evaluation_id,
            text: question.text,
            options: question.options,
            correct_answer: question.correct_answer,
            multiple: question.multiple,
        };
        tables.questions.push(stored.clone());
        Ok(stored)
    }

    async fn fetch_questions(&self, evaluation_id: i64) -> Result<Vec<Question>, AppError> {
        Ok(self.tables.read().await.questions_of(evaluation_id))
    }

    async fn fetch_attempts(&self, evaluation_id: i64) -> Result<Vec<Attempt>, AppError> {
        Ok(self.tables.read().await.attempts_of(evaluation_id))
    }

    async fn fetch_answers(&self, evaluation_id: i64) -> Result<Vec<AttemptAnswer>, AppError> {
        Ok(self.tables.read().await.answers_of(evaluation_id))
    }

    async fn fetch_snapshot(&self, evaluation_id: i64) -> Result<EvaluationSnapshot, AppError> {
        // One read guard covers all three reads.
        let tables = self.tables.read().await;
        Ok(EvaluationSnapshot {
            questions: tables.questions_of(evaluation_id),
            attempts: tables.attempts_of(evaluation_id),
            answers: tables.answers_of(evaluation_id),
        })
    }

    async fn record_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AppError> {
        // Holding the write lock for the whole insert keeps it atomic.
        let mut tables = self.tables.write().await;
        let stored = Attempt {
            id: tables.next_id(),
            evaluation_id: attempt.evaluation_id,
            student_name: attempt.student_name,
            score: attempt.score,
            created_at: Some(chrono::Utc::now()),
        };

        for (question_id, selected) in &attempt.selections {
            for &selected_index in selected {
                let id = tables.next_id();
                tables.answers.push(AttemptAnswer {
                    id,
                    attempt_id: stored.id,
                    question_id: *question_id,
                    selected_index,
                });
            }
        }

        tables.attempts.push(stored.clone());
        Ok(stored)
    }
}
