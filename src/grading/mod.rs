// src/grading/mod.rs

//! Answer normalization, attempt scoring and evaluation analytics.
//!
//! Everything in here is a pure function of its inputs. Handlers fetch a
//! snapshot through the repository and hand it to these functions.

use std::fmt;

pub mod normalize;
pub mod scoring;
pub mod statistics;

pub use normalize::{AnswerEntry, CorrectAnswerSpec, IndexSet, normalize};
pub use scoring::{AttemptBreakdown, AttemptScore, attempt_breakdown, is_correct, score_attempt};
pub use statistics::{
    EvaluationStatistics, InsufficientReason, QuestionAccuracy, StatisticsOutcome,
    compute_statistics, question_accuracy,
};

/// Caller-contract violations detected while grading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradingError {
    /// The number of submitted answer-sets differs from the question count.
    AnswerCountMismatch { expected: usize, actual: usize },
}

impl fmt::Display for GradingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingError::AnswerCountMismatch { expected, actual } => write!(
                f,
                "Answer count does not match question count (expected {}, got {})",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for GradingError {}
