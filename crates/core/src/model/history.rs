use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::{Category, QuestionId};

/// One scored question from a finished (or abandoned) pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub pass: u32,
    pub question_id: QuestionId,
    pub category: Category,
    pub was_correct: bool,
    pub answered_at: DateTime<Utc>,
}

/// Append-only record of outcomes across every pass in the process lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QuizHistory {
    entries: Vec<HistoryEntry>,
}

impl QuizHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entries: impl IntoIterator<Item = HistoryEntry>) {
        self.entries.extend(entries);
    }

    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct passes with at least one recorded answer.
    #[must_use]
    pub fn passes(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.pass)
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn for_pass(&self, pass: u32) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().filter(move |e| e.pass == pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn entry(pass: u32, id: u64, was_correct: bool) -> HistoryEntry {
        HistoryEntry {
            pass,
            question_id: QuestionId::new(id),
            category: Category::new("basic"),
            was_correct,
            answered_at: fixed_now(),
        }
    }

    #[test]
    fn history_appends_and_counts_passes() {
        let mut history = QuizHistory::new();
        history.append([entry(1, 1, true), entry(1, 2, false)]);
        history.append([entry(2, 1, true)]);

        assert_eq!(history.len(), 3);
        assert_eq!(history.passes(), 2);
        assert_eq!(history.for_pass(1).count(), 2);
        assert_eq!(history.entries()[2].pass, 2);
    }
}
