use serde::Serialize;

use super::service::QuizPhase;

/// Score (in percent) at or above which a pass counts as passed.
pub const PASS_THRESHOLD_PERCENT: f64 = 80.0;

/// Snapshot of a session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub phase: QuizPhase,
    pub pass: u32,
    /// Zero-based position of the current question.
    pub index: usize,
    pub total: usize,
    pub score: u32,
    pub answered: usize,
    pub paused: bool,
    pub timed_out: bool,
    pub elapsed_secs: i64,
    /// Full budget for the pass; `None` when untimed.
    pub limit_secs: Option<i64>,
    pub remaining_secs: Option<i64>,
}

/// Results screen for a finished pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassSummary {
    pub pass: u32,
    pub score: u32,
    pub total: usize,
    pub answered: usize,
    pub percent: f64,
    pub passed: bool,
    pub timed_out: bool,
    pub elapsed_secs: i64,
}

impl PassSummary {
    #[must_use]
    pub fn new(
        pass: u32,
        score: u32,
        total: usize,
        answered: usize,
        timed_out: bool,
        elapsed_secs: i64,
    ) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let percent = if total == 0 {
            0.0
        } else {
            f64::from(score) / total as f64 * 100.0
        };
        Self {
            pass,
            score,
            total,
            answered,
            percent,
            passed: percent >= PASS_THRESHOLD_PERCENT,
            timed_out,
            elapsed_secs,
        }
    }
}
