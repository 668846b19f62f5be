// src/grading/statistics.rs

use std::collections::HashMap;

use serde::Serialize;

use super::normalize::IndexSet;
use crate::models::{
    attempt::{Attempt, AttemptAnswer},
    question::Question,
};

/// Accuracy of a single question across all attempts that answered it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionAccuracy {
    pub question_id: i64,
    pub text: String,
    pub accuracy_pct: f64,
}

/// Aggregate statistics for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationStatistics {
    pub total_attempts: i64,
    pub avg_score: f64,
    pub max_score: i64,
    pub min_score: i64,
    pub per_question_accuracy: Vec<QuestionAccuracy>,
}

/// Why statistics could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsufficientReason {
    NoQuestions,
    NoAttempts,
    NoAnswers,
}

/// Either a full statistics record or an explicit "not enough data" signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatisticsOutcome {
    Ready(EvaluationStatistics),
    InsufficientData { reason: InsufficientReason },
}

/// Rounds to two decimal places, ties to even (0.125 -> 0.12).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Computes the accuracy of one question.
///
/// `answers` may contain rows for other questions; only rows for `question`
/// are considered. Attempts are counted once no matter how many rows they
/// have. With no answering attempt the accuracy is `0.0`.
pub fn question_accuracy(question: &Question, answers: &[AttemptAnswer]) -> QuestionAccuracy {
    let mut by_attempt: HashMap<i64, IndexSet> = HashMap::new();
    for answer in answers.iter().filter(|a| a.question_id == question.id) {
        by_attempt
            .entry(answer.attempt_id)
            .or_default()
            .insert(answer.selected_index);
    }
    accuracy_from_selections(question, by_attempt.values())
}

fn accuracy_from_selections<'a, I>(question: &Question, selections: I) -> QuestionAccuracy
where
    I: IntoIterator<Item = &'a IndexSet>,
{
    let correct = question.correct_set();
    let (answered, matched) = selections
        .into_iter()
        .fold((0usize, 0usize), |(answered, matched), selected| {
            (answered + 1, matched + usize::from(*selected == correct))
        });

    let accuracy_pct = if answered == 0 {
        0.0
    } else {
        round2(matched as f64 / answered as f64 * 100.0)
    };

    QuestionAccuracy {
        question_id: question.id,
        text: question.text.clone(),
        accuracy_pct,
    }
}

/// Computes aggregate statistics for an evaluation.
///
/// Inputs are assumed to be one consistent snapshot of the evaluation:
/// its questions in creation order, its attempts and all their answer rows.
/// An evaluation without questions, attempts or answer rows yields
/// `InsufficientData` rather than zeroed numbers.
pub fn compute_statistics(
    questions: &[Question],
    attempts: &[Attempt],
    answers: &[AttemptAnswer],
) -> StatisticsOutcome {
    if questions.is_empty() {
        return StatisticsOutcome::InsufficientData {
            reason: InsufficientReason::NoQuestions,
        };
    }
    if attempts.is_empty() {
        return StatisticsOutcome::InsufficientData {
            reason: InsufficientReason::NoAttempts,
        };
    }
    if answers.is_empty() {
        return StatisticsOutcome::InsufficientData {
            reason: InsufficientReason::NoAnswers,
        };
    }

    // question id -> attempt id -> selected set
    let mut grouped: HashMap<i64, HashMap<i64, IndexSet>> = HashMap::new();
    for answer in answers {
        grouped
            .entry(answer.question_id)
            .or_default()
            .entry(answer.attempt_id)
            .or_default()
            .insert(answer.selected_index);
    }

    let per_question_accuracy = questions
        .iter()
        .map(|question| match grouped.get(&question.id) {
            Some(by_attempt) => accuracy_from_selections(question, by_attempt.values()),
            None => accuracy_from_selections(question, std::iter::empty::<&IndexSet>()),
        })
        .collect();

    let total_attempts = attempts.len() as i64;
    let sum: i64 = attempts.iter().map(|a| a.score).sum();
    let max_score = attempts.iter().map(|a| a.score).max().unwrap_or(0);
    let min_score = attempts.iter().map(|a| a.score).min().unwrap_or(0);

    StatisticsOutcome::Ready(EvaluationStatistics {
        total_attempts,
        avg_score: round2(sum as f64 / total_attempts as f64),
        max_score,
        min_score,
        per_question_accuracy,
    })
}
