// src/models/evaluation.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::grading::StatisticsOutcome;

/// Represents the 'evaluations' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: i64,

    pub title: String,

    /// Id of the user who created the evaluation. Decides who may manage it.
    pub teacher_id: i64,

    /// Display name of that teacher at creation time.
    pub teacher_name: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new evaluation.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEvaluationRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters."))]
    pub title: String,
}

/// Statistics enriched with the evaluation's header, as shown on the analytics page.
#[derive(Debug, Serialize)]
pub struct EvaluationReport {
    pub evaluation_title: String,
    pub teacher_name: String,
    #[serde(flatten)]
    pub statistics: StatisticsOutcome,
}
