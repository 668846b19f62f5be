// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::grading::{CorrectAnswerSpec, IndexSet, normalize};

/// A multiple-choice question belonging to an evaluation.
///
/// Option identity is positional: index 0 is the first label.
#[derive(Debug, Clone)]
pub struct Question {
    pub id: i64,
    pub evaluation_id: i64,
    pub text: String,
    pub options: Vec<String>,

    /// Raw stored correct answer(s), see [`CorrectAnswerSpec`].
    pub correct_answer: CorrectAnswerSpec,

    /// Whether more than one option may be correct. Informational only.
    pub multiple: bool,
}

impl Question {
    /// Canonical set of correct option indices.
    pub fn correct_set(&self) -> IndexSet {
        normalize(&self.correct_answer)
    }

    /// Whether `index` addresses one of this question's options.
    pub fn has_option(&self, index: i64) -> bool {
        usize::try_from(index).is_ok_and(|i| i < self.options.len())
    }
}

/// Fields needed to insert a question.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: CorrectAnswerSpec,
    pub multiple: bool,
}

/// DTO for sending a question to students (excludes the correct answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub options: Vec<String>,
    pub multiple: bool,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            text: q.text,
            options: q.options,
            multiple: q.multiple,
        }
    }
}

/// DTO for the teacher's view of a question, with normalized correct indices.
#[derive(Debug, Serialize)]
pub struct AnswerKeyQuestion {
    pub id: i64,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: Vec<i64>,
    pub multiple: bool,
}

impl From<Question> for AnswerKeyQuestion {
    fn from(q: Question) -> Self {
        let correct_index = q.correct_set().into_iter().collect();
        Self {
            id: q.id,
            text: q.text,
            options: q.options,
            correct_index,
            multiple: q.multiple,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, message = "At least one correct option is required."))]
    pub correct_index: Vec<i64>,
    #[serde(default)]
    pub multiple: bool,
}

impl CreateQuestionRequest {
    /// Checks that every correct index addresses an option.
    /// Must be called after `validate()`.
    pub fn correct_indices_in_range(&self) -> bool {
        self.correct_index
            .iter()
            .all(|&i| usize::try_from(i).is_ok_and(|i| i < self.options.len()))
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(options: &[&str], correct: &[i64]) -> CreateQuestionRequest {
        CreateQuestionRequest {
            text: "Which?".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            correct_index: correct.to_vec(),
            multiple: correct.len() > 1,
        }
    }

    #[test]
    fn test_valid_request() {
        let req = request(&["A", "B", "C"], &[0, 2]);
        assert!(req.validate().is_ok());
        assert!(req.correct_indices_in_range());
    }

    #[test]
    fn test_out_of_range_index() {
        assert!(!request(&["A", "B"], &[2]).correct_indices_in_range());
        assert!(!request(&["A", "B"], &[-1]).correct_indices_in_range());
    }

    #[test]
    fn test_rejects_empty_correct_set_and_options() {
        assert!(request(&["A", "B"], &[]).validate().is_err());
        assert!(request(&[], &[0]).validate().is_err());
        assert!(request(&["A", " "], &[0]).validate().is_err());
    }

    #[test]
    fn test_answer_key_is_normalized() {
        let question = Question {
            id: 4,
            evaluation_id: 1,
            text: "Pick".to_string(),
            options: vec!["A".into(), "B".into(), "C".into()],
            correct_answer: CorrectAnswerSpec::Delimited("2, 0".to_string()),
            multiple: true,
        };
        assert!(question.has_option(2));
        assert!(!question.has_option(3));

        let key = AnswerKeyQuestion::from(question);
        assert_eq!(key.correct_index, vec![0, 2]);
    }
}
