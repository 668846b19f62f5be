// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::grading::{AttemptBreakdown, IndexSet};

/// Represents the 'attempts' table in the database.
/// One student's graded submission for an evaluation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub evaluation_id: i64,
    pub student_name: String,

    /// Number of questions answered with exactly the correct set.
    /// Written once when the attempt is recorded.
    pub score: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'attempt_answers' table in the database.
/// A multi-select answer is stored as several rows for the same question.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AttemptAnswer {
    pub id: i64,
    pub attempt_id: i64,
    pub question_id: i64,
    pub selected_index: i64,
}

/// A graded attempt ready to be stored together with its answer rows.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub evaluation_id: i64,
    pub student_name: String,
    pub score: i64,
    /// Selected set per question id, in question order.
    pub selections: Vec<(i64, IndexSet)>,
}

/// One answer in a submission: a single index or a list of indices.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    Single(i64),
    Multiple(Vec<i64>),
}

impl SubmittedAnswer {
    pub fn into_set(self) -> IndexSet {
        match self {
            SubmittedAnswer::Single(index) => IndexSet::from([index]),
            SubmittedAnswer::Multiple(indices) => indices.into_iter().collect(),
        }
    }
}

/// DTO for submitting an attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    #[validate(length(min = 1, max = 120, message = "Student name must be between 1 and 120 characters."))]
    pub student_name: String,

    /// One entry per question, in the order the questions are listed.
    pub answers: Vec<SubmittedAnswer>,
}

/// DTO returned after a submission is graded.
#[derive(Debug, Serialize)]
pub struct SubmitAttemptResponse {
    pub attempt_id: i64,
    pub student_name: String,
    pub score: i64,
    pub total_questions: i64,
}

/// One row of the attempts listing.
#[derive(Debug, Serialize)]
pub struct AttemptSummary {
    pub attempt_id: i64,
    pub student_name: String,
    pub score: i64,
    #[serde(flatten)]
    pub breakdown: AttemptBreakdown,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_accepts_scalars_and_lists() {
        let req: SubmitAttemptRequest = serde_json::from_value(serde_json::json!({
            "student_name": "Ana",
            "answers": [[0, 2], 1, []]
        }))
        .unwrap();

        let sets: Vec<IndexSet> = req.answers.into_iter().map(SubmittedAnswer::into_set).collect();
        assert_eq!(sets[0], IndexSet::from([0, 2]));
        assert_eq!(sets[1], IndexSet::from([1]));
        assert!(sets[2].is_empty());
    }

    #[test]
    fn test_duplicate_selections_collapse() {
        let set = SubmittedAnswer::Multiple(vec![1, 1, 3]).into_set();
        assert_eq!(set, IndexSet::from([1, 3]));
    }
}
