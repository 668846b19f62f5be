// src/grading/scoring.rs

use std::collections::HashMap;

use serde::Serialize;

use super::{GradingError, normalize::IndexSet};
use crate::models::{attempt::AttemptAnswer, question::Question};

/// Result of grading one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptScore {
    pub score: i64,
    pub total: i64,
}

/// Exact-set-match grading: a subset, superset or any differing element is wrong.
pub fn is_correct(question: &Question, selected: &IndexSet) -> bool {
    question.correct_set() == *selected
}

/// Scores one attempt.
///
/// `selected` is positional: the n-th set answers the n-th question.
/// Returns `AnswerCountMismatch` when the two sequences differ in length.
pub fn score_attempt(
    questions: &[Question],
    selected: &[IndexSet],
) -> Result<AttemptScore, GradingError> {
    if questions.len() != selected.len() {
        return Err(GradingError::AnswerCountMismatch {
            expected: questions.len(),
            actual: selected.len(),
        });
    }

    let score = questions
        .iter()
        .zip(selected)
        .filter(|(question, answer)| is_correct(question, answer))
        .count();

    Ok(AttemptScore {
        score: score as i64,
        total: questions.len() as i64,
    })
}

/// Per-attempt correct/incorrect counts, over the questions the attempt has rows for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttemptBreakdown {
    pub correct: i64,
    pub incorrect: i64,
    pub total: i64,
}

/// Re-grades one stored attempt from its answer rows.
///
/// Questions without any row for this attempt are not counted. Rows pointing
/// at a question outside `questions` are ignored.
pub fn attempt_breakdown(questions: &[Question], answers: &[AttemptAnswer]) -> AttemptBreakdown {
    let by_question = selections_by_question(answers);

    let mut breakdown = AttemptBreakdown::default();
    for question in questions {
        let Some(selected) = by_question.get(&question.id) else {
            continue;
        };
        if is_correct(question, selected) {
            breakdown.correct += 1;
        } else {
            breakdown.incorrect += 1;
        }
    }
    breakdown.total = breakdown.correct + breakdown.incorrect;
    breakdown
}

/// Unions answer rows into one selected set per question.
fn selections_by_question(answers: &[AttemptAnswer]) -> HashMap<i64, IndexSet> {
    let mut grouped: HashMap<i64, IndexSet> = HashMap::new();
    for answer in answers {
        grouped
            .entry(answer.question_id)
            .or_default()
            .insert(answer.selected_index);
    }
    grouped
}
