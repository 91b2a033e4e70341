use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

use crate::model::{Category, OptionLabel, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("a question needs at least {min} options, found {count}")]
    TooFewOptions { count: usize, min: usize },

    #[error("a question supports at most {max} options, found {count}")]
    TooManyOptions { count: usize, max: usize },

    #[error("option {label} is empty")]
    EmptyOption { label: OptionLabel },

    #[error("option text {text:?} appears more than once")]
    DuplicateOption { text: String },

    #[error("no correct answer given")]
    NoCorrectAnswer,

    #[error("answer {label} does not match any of the {options} options")]
    LabelOutOfRange { label: OptionLabel, options: usize },
}

//
// ─── OPTION ────────────────────────────────────────────────────────────────────
//

/// One answer choice: its display label and bare text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    label: OptionLabel,
    text: String,
}

impl QuizOption {
    #[must_use]
    pub fn label(&self) -> OptionLabel {
        self.label
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question.
///
/// Options are labelled by position. `correct` always holds at least one label
/// and every label in it names an existing option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    category: Category,
    options: Vec<QuizOption>,
    correct: BTreeSet<OptionLabel>,
    explanation: String,
}

impl Question {
    pub const MIN_OPTIONS: usize = 2;

    /// Build a question from bare option texts (in authored order) and correct labels.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the text is blank, the option count is out of
    /// bounds, an option is blank or repeated, or the answer set is empty or
    /// refers to a missing option.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        category: Category,
        options: Vec<String>,
        correct: impl IntoIterator<Item = OptionLabel>,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into().trim().to_owned();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let count = options.len();
        if count < Self::MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                count,
                min: Self::MIN_OPTIONS,
            });
        }
        if count > OptionLabel::MAX_OPTIONS {
            return Err(QuestionError::TooManyOptions {
                count,
                max: OptionLabel::MAX_OPTIONS,
            });
        }

        let mut seen = HashSet::with_capacity(count);
        let mut labelled = Vec::with_capacity(count);
        for (index, raw) in options.into_iter().enumerate() {
            let label = OptionLabel::nth(index);
            let text = raw.trim().to_owned();
            if text.is_empty() {
                return Err(QuestionError::EmptyOption { label });
            }
            if !seen.insert(text.clone()) {
                return Err(QuestionError::DuplicateOption { text });
            }
            labelled.push(QuizOption { label, text });
        }

        let correct: BTreeSet<OptionLabel> = correct.into_iter().collect();
        if correct.is_empty() {
            return Err(QuestionError::NoCorrectAnswer);
        }
        if let Some(label) = correct.iter().find(|l| l.index() >= count) {
            return Err(QuestionError::LabelOutOfRange {
                label: *label,
                options: count,
            });
        }

        Ok(Self {
            id,
            text,
            category,
            options: labelled,
            correct,
            explanation: explanation.into().trim().to_owned(),
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn category(&self) -> &Category {
        &self.category
    }

    #[must_use]
    pub fn options(&self) -> &[QuizOption] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, label: OptionLabel) -> Option<&QuizOption> {
        self.options.get(label.index())
    }

    #[must_use]
    pub fn correct_labels(&self) -> &BTreeSet<OptionLabel> {
        &self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Number of options a submission must select.
    #[must_use]
    pub fn required_selections(&self) -> usize {
        self.correct.len()
    }

    #[must_use]
    pub fn is_multi_answer(&self) -> bool {
        self.correct.len() > 1
    }

    /// Texts of the correct options, in label order.
    #[must_use]
    pub fn correct_texts(&self) -> Vec<&str> {
        self.correct
            .iter()
            .filter_map(|l| self.option(*l))
            .map(QuizOption::text)
            .collect()
    }

    /// Copy of this question with its options in a random order.
    ///
    /// Each option entry keeps its correctness through the permutation, then
    /// labels are re-assigned from the new positions.
    #[must_use]
    pub fn with_shuffled_options<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..self.options.len()).collect();
        order.shuffle(rng);

        let mut options = Vec::with_capacity(order.len());
        let mut correct = BTreeSet::new();
        for (position, &original) in order.iter().enumerate() {
            let source = &self.options[original];
            let label = OptionLabel::nth(position);
            if self.correct.contains(&source.label) {
                correct.insert(label);
            }
            options.push(QuizOption {
                label,
                text: source.text.clone(),
            });
        }

        Self {
            id: self.id,
            text: self.text.clone(),
            category: self.category.clone(),
            options,
            correct,
            explanation: self.explanation.clone(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
