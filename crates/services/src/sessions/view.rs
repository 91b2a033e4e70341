use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use quiz_core::model::{Category, HistoryEntry};

/// Accuracy for one category across every recorded pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: Category,
    pub attempts: usize,
    pub correct: usize,
    /// Percentage in `[0, 100]`.
    pub accuracy: f64,
}

/// Aggregate analytics over the answer history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStats {
    pub passes: usize,
    pub attempts: usize,
    pub correct: usize,
    pub accuracy: f64,
    /// Sorted by category label.
    pub by_category: Vec<CategoryStats>,
}

impl HistoryStats {
    #[must_use]
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let mut tally: BTreeMap<&Category, (usize, usize)> = BTreeMap::new();
        let mut passes = BTreeSet::new();
        for entry in entries {
            passes.insert(entry.pass);
            let slot = tally.entry(&entry.category).or_default();
            slot.0 += 1;
            if entry.was_correct {
                slot.1 += 1;
            }
        }

        let by_category: Vec<CategoryStats> = tally
            .into_iter()
            .map(|(category, (attempts, correct))| CategoryStats {
                category: category.clone(),
                attempts,
                correct,
                accuracy: percent(correct, attempts),
            })
            .collect();
        let correct = by_category.iter().map(|c| c.correct).sum();

        Self {
            passes: passes.len(),
            attempts: entries.len(),
            correct,
            accuracy: percent(correct, entries.len()),
            by_category,
        }
    }

    /// Category with the lowest accuracy; ties go to the one with more attempts.
    #[must_use]
    pub fn weakest(&self) -> Option<&CategoryStats> {
        self.by_category.iter().min_by(|a, b| {
            a.accuracy
                .total_cmp(&b.accuracy)
                .then_with(|| b.attempts.cmp(&a.attempts))
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
