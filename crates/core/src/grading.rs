use serde::Serialize;
use std::collections::BTreeSet;

use crate::model::{OptionLabel, Question};

/// Outcome of comparing a submission with a question's answer set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub is_correct: bool,
    pub expected: BTreeSet<OptionLabel>,
    pub submitted: BTreeSet<OptionLabel>,
}

/// Set-equality check of `submitted` against the question's correct labels.
///
/// Order and duplicates in `submitted` do not matter. The selection count is
/// not validated here; see `Question::required_selections`.
///
/// # Examples
///
/// ```
/// # use quiz_core::evaluate;
/// # use quiz_core::model::{Category, OptionLabel, Question, QuestionId};
/// let a: OptionLabel = "a".parse().unwrap();
/// let c: OptionLabel = "c".parse().unwrap();
/// let q = Question::new(
///     QuestionId::new(1),
///     "Pick two",
///     Category::general(),
///     vec!["w".into(), "x".into(), "y".into(), "z".into()],
///     [a, c],
///     "",
/// )
/// .unwrap();
/// assert!(evaluate(&q, [c, a]).is_correct);
/// assert!(!evaluate(&q, [a]).is_correct);
/// ```
#[must_use]
pub fn evaluate(question: &Question, submitted: impl IntoIterator<Item = OptionLabel>) -> Evaluation {
    let submitted: BTreeSet<OptionLabel> = submitted.into_iter().collect();
    let expected = question.correct_labels().clone();
    Evaluation {
        is_correct: submitted == expected,
        expected,
        submitted,
    }
}
