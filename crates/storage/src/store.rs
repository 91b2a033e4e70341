use std::collections::BTreeMap;

use quiz_core::model::{Category, Question, QuestionId};

use crate::error::LoadError;
use crate::source::QuestionSource;

/// Read-only pool of validated questions.
///
/// Built once at startup and shared (e.g. behind an `Arc`) by every session.
#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    questions: Vec<Question>,
    skipped_rows: usize,
}

impl QuestionStore {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            skipped_rows: 0,
        }
    }

    /// Load and validate a source into a store.
    ///
    /// # Errors
    ///
    /// Propagates the fatal `LoadError` variants from the source.
    pub fn from_source(source: &dyn QuestionSource) -> Result<Self, LoadError> {
        let report = source.load()?;
        let skipped_rows = report.skipped.len();
        tracing::info!(
            source = %source.describe(),
            questions = report.questions.len(),
            skipped_rows,
            "question pool loaded"
        );
        Ok(Self {
            questions: report.questions,
            skipped_rows,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Rows dropped as malformed while loading.
    #[must_use]
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// Questions in one category, in source order.
    #[must_use]
    pub fn by_category(&self, category: &Category) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.category() == category)
            .collect()
    }

    /// Distinct categories present in the pool, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.category_counts().into_keys().collect()
    }

    #[must_use]
    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for question in &self.questions {
            *counts.entry(question.category().clone()).or_insert(0) += 1;
        }
        counts
    }
}
