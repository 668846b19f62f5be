// src/grading/normalize.rs

use std::collections::BTreeSet;

use serde_json::Value;

/// Canonical set of zero-based option indices.
pub type IndexSet = BTreeSet<i64>;

/// Stored shape of a question's correct answer(s).
///
/// Older rows were written through different call paths, so the JSON column
/// can hold a comma-delimited string, a flat list, a list of lists, a bare
/// number or `null`. Every shape is mapped onto this enum once, when read.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectAnswerSpec {
    Absent,
    Delimited(String),
    Scalar(i64),
    List(Vec<AnswerEntry>),
}

/// One element of a stored list: either an index or a nested group of indices.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerEntry {
    Index(i64),
    Group(Vec<i64>),
}

impl CorrectAnswerSpec {
    /// Builds the canonical flat list for a set of indices.
    /// This is the shape written for every new question.
    pub fn from_indices<I>(indices: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let set: IndexSet = indices.into_iter().collect();
        CorrectAnswerSpec::List(set.into_iter().map(AnswerEntry::Index).collect())
    }

    /// JSON representation used for storage.
    pub fn to_json(&self) -> Value {
        match self {
            CorrectAnswerSpec::Absent => Value::Null,
            CorrectAnswerSpec::Delimited(raw) => Value::String(raw.clone()),
            CorrectAnswerSpec::Scalar(index) => Value::from(*index),
            CorrectAnswerSpec::List(entries) => Value::Array(
                entries
                    .iter()
                    .map(|entry| match entry {
                        AnswerEntry::Index(index) => Value::from(*index),
                        AnswerEntry::Group(group) => {
                            Value::Array(group.iter().copied().map(Value::from).collect())
                        }
                    })
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for CorrectAnswerSpec {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => CorrectAnswerSpec::Absent,
            Value::String(raw) => CorrectAnswerSpec::Delimited(raw.clone()),
            Value::Array(items) => CorrectAnswerSpec::List(
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Array(group) => Some(AnswerEntry::Group(
                            group.iter().filter_map(coerce_index).collect(),
                        )),
                        scalar => coerce_index(scalar).map(AnswerEntry::Index),
                    })
                    .collect(),
            ),
            scalar => coerce_index(scalar)
                .map(CorrectAnswerSpec::Scalar)
                .unwrap_or(CorrectAnswerSpec::Absent),
        }
    }
}

impl From<Value> for CorrectAnswerSpec {
    fn from(value: Value) -> Self {
        CorrectAnswerSpec::from(&value)
    }
}

/// Coerces a JSON scalar to an option index.
/// Floats are truncated toward zero; strings are trimmed and parsed.
fn coerce_index(value: &Value) -> Option<i64> {
    let coerced = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    if coerced.is_none() {
        tracing::debug!("Dropping non-numeric answer entry: {}", value);
    }
    coerced
}

/// Normalizes a stored correct-answer specification into its canonical set.
///
/// Never fails. Tokens that are not plain non-negative integers are dropped
/// from delimited strings, and only one level of list nesting is flattened.
pub fn normalize(spec: &CorrectAnswerSpec) -> IndexSet {
    match spec {
        CorrectAnswerSpec::Absent => IndexSet::new(),
        CorrectAnswerSpec::Scalar(index) => IndexSet::from([*index]),
        CorrectAnswerSpec::Delimited(raw) => raw
            .split(',')
            .map(str::trim)
            .filter_map(|token| {
                if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                    if !token.is_empty() {
                        tracing::debug!("Dropping malformed answer token: {:?}", token);
                    }
                    return None;
                }
                token.parse::<i64>().ok()
            })
            .collect(),
        CorrectAnswerSpec::List(entries) => entries
            .iter()
            .flat_map(|entry| match entry {
                AnswerEntry::Index(index) => std::slice::from_ref(index),
                AnswerEntry::Group(group) => group.as_slice(),
            })
            .copied()
            .collect(),
    }
}
