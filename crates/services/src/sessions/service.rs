use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use quiz_core::PassTimer;
use quiz_core::evaluate;
use quiz_core::model::{HistoryEntry, OptionLabel, Question, QuestionId, QuizHistory};

use super::progress::{PassSummary, SessionView};
use crate::error::SessionError;

//
// ─── PHASE & RESULTS ───────────────────────────────────────────────────────────
//

/// Where a session stands in the current pass.
///
/// Pausing is a flag on the timer, not a phase of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuizPhase {
    NotStarted,
    InProgress,
    AnswerRevealed,
    Finished,
}

/// Feedback shown once a submission has been scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reveal {
    pub question_id: QuestionId,
    pub is_correct: bool,
    pub correct_labels: BTreeSet<OptionLabel>,
    pub selected: BTreeSet<OptionLabel>,
    pub explanation: String,
}

/// Outcome of `QuizSession::submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    /// Scored; the session is now in `AnswerRevealed`.
    Accepted(Reveal),
    /// Wrong number of distinct selections; the question stays open.
    NeedsCount { required: usize, provided: usize },
    /// A selection names an option the question does not have.
    InvalidLabel { label: OptionLabel },
    /// The time limit ran out; the pass is finished and nothing was scored.
    Expired,
}

impl SubmitResult {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitResult::Accepted(_))
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Quiz state owned by the presentation layer.
///
/// One instance lives for the whole process; `start` begins a new pass and
/// clears everything except `history`. All randomness is resolved before
/// `start`, so re-reading the session never re-derives the question set.
pub struct QuizSession {
    phase: QuizPhase,
    pass: u32,
    active: Vec<Question>,
    current: usize,
    score: u32,
    answered: HashSet<usize>,
    revealed: Option<(Reveal, DateTime<Utc>)>,
    pending: Vec<HistoryEntry>,
    timer: Option<PassTimer>,
    finished_at: Option<DateTime<Utc>>,
    timed_out: bool,
    history: QuizHistory,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: QuizPhase::NotStarted,
            pass: 0,
            active: Vec::new(),
            current: 0,
            score: 0,
            answered: HashSet::new(),
            revealed: None,
            pending: Vec::new(),
            timer: None,
            finished_at: None,
            timed_out: false,
            history: QuizHistory::new(),
        }
    }

    /// Begin a new pass over `questions`.
    ///
    /// Outcomes already scored in an unfinished previous pass are moved to
    /// history before the reset.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty; the session is left untouched.
    pub fn start(
        &mut self,
        questions: Vec<Question>,
        time_limit: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<SessionView, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        self.flush_pending();
        self.pass += 1;
        self.active = questions;
        self.current = 0;
        self.score = 0;
        self.answered.clear();
        self.revealed = None;
        self.timer = Some(PassTimer::start(now, time_limit));
        self.finished_at = None;
        self.timed_out = false;
        self.phase = QuizPhase::InProgress;

        tracing::info!(
            pass = self.pass,
            questions = self.active.len(),
            time_limit_secs = time_limit.map(|d| d.num_seconds()),
            "quiz pass started"
        );
        Ok(self.view(now))
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn pass(&self) -> u32 {
        self.pass
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn active_set(&self) -> &[Question] {
        &self.active
    }

    #[must_use]
    pub fn history(&self) -> &QuizHistory {
        &self.history
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.timer.as_ref().is_some_and(PassTimer::is_paused)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.phase, QuizPhase::InProgress | QuizPhase::AnswerRevealed)
    }

    /// The question on screen, or `None` outside `InProgress`/`AnswerRevealed`.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_active() {
            self.active.get(self.current)
        } else {
            None
        }
    }

    /// Finish the pass if its time limit has run out. Returns true if it did so now.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        let expired = self.is_active() && self.timer.as_ref().is_some_and(|t| t.is_expired(now));
        if expired {
            self.timed_out = true;
            self.finish(now);
        }
        expired
    }

    /// Score the selections for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress` (other than a
    /// timed-out pass, which yields `SubmitResult::Expired`), and
    /// `SessionError::Paused` while the timer is paused.
    pub fn submit(
        &mut self,
        selections: impl IntoIterator<Item = OptionLabel>,
        now: DateTime<Utc>,
    ) -> Result<SubmitResult, SessionError> {
        if self.refresh(now) {
            return Ok(SubmitResult::Expired);
        }
        match self.phase {
            QuizPhase::InProgress => {}
            QuizPhase::Finished if self.timed_out => return Ok(SubmitResult::Expired),
            phase => return Err(SessionError::NotInProgress { phase }),
        }
        if self.is_paused() {
            return Err(SessionError::Paused);
        }

        let question = &self.active[self.current];
        let selected: BTreeSet<OptionLabel> = selections.into_iter().collect();
        if let Some(label) = selected.iter().find(|l| question.option(**l).is_none()) {
            return Ok(SubmitResult::InvalidLabel { label: *label });
        }
        let required = question.required_selections();
        if selected.len() != required {
            return Ok(SubmitResult::NeedsCount {
                required,
                provided: selected.len(),
            });
        }

        let evaluation = evaluate(question, selected);
        let reveal = Reveal {
            question_id: question.id(),
            is_correct: evaluation.is_correct,
            correct_labels: evaluation.expected,
            selected: evaluation.submitted,
            explanation: question.explanation().to_owned(),
        };
        self.revealed = Some((reveal.clone(), now));
        self.phase = QuizPhase::AnswerRevealed;
        self.record_current();

        tracing::debug!(
            pass = self.pass,
            index = self.current,
            question = %reveal.question_id,
            correct = reveal.is_correct,
            "answer submitted"
        );
        Ok(SubmitResult::Accepted(reveal))
    }

    /// Feedback for the answered question. Calling it again never re-scores.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRevealed` unless the session is in `AnswerRevealed`.
    pub fn reveal(&mut self) -> Result<Reveal, SessionError> {
        if self.phase != QuizPhase::AnswerRevealed {
            return Err(SessionError::NotRevealed { phase: self.phase });
        }
        self.record_current();
        self.revealed
            .as_ref()
            .map(|(reveal, _)| reveal.clone())
            .ok_or(SessionError::NotRevealed { phase: self.phase })
    }

    /// Move past the revealed question, finishing the pass after the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotRevealed` unless in `AnswerRevealed` and
    /// `SessionError::Paused` while paused. A timed-out pass returns its
    /// finished view instead of an error.
    pub fn next(&mut self, now: DateTime<Utc>) -> Result<SessionView, SessionError> {
        if self.refresh(now) {
            return Ok(self.view(now));
        }
        if self.phase != QuizPhase::AnswerRevealed {
            return Err(SessionError::NotRevealed { phase: self.phase });
        }
        if self.is_paused() {
            return Err(SessionError::Paused);
        }

        self.revealed = None;
        if self.current + 1 < self.active.len() {
            self.current += 1;
            self.phase = QuizPhase::InProgress;
            tracing::debug!(pass = self.pass, index = self.current, "next question");
        } else {
            self.finish(now);
        }
        Ok(self.view(now))
    }

    /// Stop the clock without losing the current position.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` when no pass is running.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<SessionView, SessionError> {
        self.refresh(now);
        let timer = self.running_timer()?;
        if timer.pause(now) {
            tracing::debug!(pass = self.pass, "quiz paused");
        }
        Ok(self.view(now))
    }

    /// Restart the clock from `now`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` when no pass is running.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<SessionView, SessionError> {
        let timer = self.running_timer()?;
        if timer.resume(now) {
            tracing::debug!(pass = self.pass, "quiz resumed");
        }
        Ok(self.view(now))
    }

    /// End the pass early. Answered questions are kept in history.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` when no pass is running.
    pub fn abandon(&mut self, now: DateTime<Utc>) -> Result<SessionView, SessionError> {
        if !self.refresh(now) {
            if !self.is_active() {
                return Err(SessionError::NotInProgress { phase: self.phase });
            }
            self.finish(now);
        }
        Ok(self.view(now))
    }

    #[must_use]
    pub fn view(&self, now: DateTime<Utc>) -> SessionView {
        let at = self.finished_at.unwrap_or(now);
        SessionView {
            phase: self.phase,
            pass: self.pass,
            index: self.current,
            total: self.active.len(),
            score: self.score,
            answered: self.answered.len(),
            paused: self.is_paused(),
            timed_out: self.timed_out,
            elapsed_secs: self.elapsed(at).num_seconds(),
            limit_secs: self
                .timer
                .as_ref()
                .and_then(PassTimer::limit)
                .map(|d| d.num_seconds()),
            remaining_secs: self
                .timer
                .as_ref()
                .and_then(|t| t.remaining(at))
                .map(|d| d.num_seconds()),
        }
    }

    /// Results for the pass, available once it is finished.
    #[must_use]
    pub fn summary(&self) -> Option<PassSummary> {
        if self.phase != QuizPhase::Finished {
            return None;
        }
        let finished_at = self.finished_at?;
        Some(PassSummary::new(
            self.pass,
            self.score,
            self.active.len(),
            self.answered.len(),
            self.timed_out,
            self.elapsed(finished_at).num_seconds(),
        ))
    }

    fn elapsed(&self, at: DateTime<Utc>) -> Duration {
        self.timer
            .as_ref()
            .map_or_else(Duration::zero, |t| t.elapsed(at))
    }

    fn running_timer(&mut self) -> Result<&mut PassTimer, SessionError> {
        if !self.is_active() {
            return Err(SessionError::NotInProgress { phase: self.phase });
        }
        self.timer
            .as_mut()
            .ok_or(SessionError::NotInProgress { phase: self.phase })
    }

    /// Scores the revealed question the first time it is seen in this pass.
    fn record_current(&mut self) {
        let Some((reveal, at)) = &self.revealed else {
            return;
        };
        if !self.answered.insert(self.current) {
            return;
        }
        if reveal.is_correct {
            self.score += 1;
        }
        let question = &self.active[self.current];
        self.pending.push(HistoryEntry {
            pass: self.pass,
            question_id: question.id(),
            category: question.category().clone(),
            was_correct: reveal.is_correct,
            answered_at: *at,
        });
    }

    fn finish(&mut self, now: DateTime<Utc>) {
        self.phase = QuizPhase::Finished;
        self.revealed = None;
        self.finished_at = Some(now);
        if let Some(timer) = self.timer.as_mut() {
            timer.pause(now);
        }
        self.flush_pending();
        tracing::info!(
            pass = self.pass,
            score = self.score,
            total = self.active.len(),
            timed_out = self.timed_out,
            "quiz pass finished"
        );
    }

    fn flush_pending(&mut self) {
        self.history.append(self.pending.drain(..));
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("phase", &self.phase)
            .field("pass", &self.pass)
            .field("active_len", &self.active.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("answered", &self.answered.len())
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Category, QuestionId};
    use quiz_core::time::fixed_now;

    fn label(c: &str) -> OptionLabel {
        c.parse().unwrap()
    }

    fn build_question(id: u64, correct: &[&str]) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            Category::new("basic"),
            vec!["w".into(), "x".into(), "y".into(), "z".into()],
            correct.iter().map(|c| label(c)),
            "explained",
        )
        .unwrap()
    }

    fn started(questions: Vec<Question>, limit: Option<Duration>) -> QuizSession {
        let mut session = QuizSession::new();
        session.start(questions, limit, fixed_now()).unwrap();
        session
    }

    #[test]
    fn empty_question_set_is_rejected() {
        let mut session = QuizSession::new();
        let err = session.start(Vec::new(), None, fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::Empty);
        assert_eq!(session.phase(), QuizPhase::NotStarted);
        assert!(session.current_question().is_none());
    }

    #[test]
    fn wrong_selection_count_keeps_question_open() {
        let mut session = started(vec![build_question(1, &["a", "c"])], None);
        let result = session.submit([label("a")], fixed_now()).unwrap();
        assert_eq!(
            result,
            SubmitResult::NeedsCount {
                required: 2,
                provided: 1
            }
        );
        assert_eq!(session.phase(), QuizPhase::InProgress);

        let dup = session.submit([label("a"), label("a")], fixed_now()).unwrap();
        assert!(matches!(dup, SubmitResult::NeedsCount { provided: 1, .. }));

        let invalid = session.submit([label("a"), label("q")], fixed_now()).unwrap();
        assert!(matches!(invalid, SubmitResult::InvalidLabel { .. }));
    }

    #[test]
    fn score_counts_once_per_question() {
        let mut session = started(vec![build_question(1, &["b"]), build_question(2, &["a"])], None);

        let result = session.submit([label("b")], fixed_now()).unwrap();
        assert!(result.is_accepted());
        assert_eq!(session.score(), 1);

        assert!(session.reveal().unwrap().is_correct);
        assert!(session.reveal().unwrap().is_correct);
        assert_eq!(session.score(), 1);

        let err = session.submit([label("b")], fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::NotInProgress { .. }));
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn next_requires_reveal_and_finishes_after_last() {
        let mut session = started(vec![build_question(1, &["a"]), build_question(2, &["d"])], None);
        assert!(matches!(
            session.next(fixed_now()),
            Err(SessionError::NotRevealed { .. })
        ));

        session.submit([label("a")], fixed_now()).unwrap();
        let view = session.next(fixed_now()).unwrap();
        assert_eq!(view.index, 1);
        assert_eq!(view.phase, QuizPhase::InProgress);
        assert!(session.reveal().is_err());

        session.submit([label("c")], fixed_now()).unwrap();
        let view = session.next(fixed_now()).unwrap();
        assert_eq!(view.phase, QuizPhase::Finished);
        assert!(session.current_question().is_none());

        let summary = session.summary().unwrap();
        assert_eq!(summary.score, 1);
        assert_eq!(summary.total, 2);
        assert!((summary.percent - 50.0).abs() < f64::EPSILON);
        assert!(!summary.passed);
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn history_survives_new_pass_and_keeps_abandoned_answers() {
        let mut session = started(vec![build_question(1, &["a"]), build_question(2, &["b"])], None);
        session.submit([label("a")], fixed_now()).unwrap();

        session
            .start(vec![build_question(3, &["a"])], None, fixed_now())
            .unwrap();
        assert_eq!(session.pass(), 2);
        assert_eq!(session.score(), 0);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history().entries()[0].question_id, QuestionId::new(1));

        session.submit([label("b")], fixed_now()).unwrap();
        session.next(fixed_now()).unwrap();
        let entries = session.history().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].pass, 2);
        assert!(!entries[1].was_correct);
    }

    #[test]
    fn timer_expiry_forces_finish_and_rejects_submit() {
        let t0 = fixed_now();
        let questions: Vec<_> = (1..=30).map(|id| build_question(id, &["a"])).collect();
        let mut session = started(questions, Some(Duration::seconds(1080)));

        session.submit([label("a")], t0 + Duration::seconds(10)).unwrap();
        session.next(t0 + Duration::seconds(11)).unwrap();

        let late = t0 + Duration::seconds(1080);
        assert_eq!(session.submit([label("a")], late).unwrap(), SubmitResult::Expired);
        assert_eq!(session.phase(), QuizPhase::Finished);
        assert_eq!(
            session.submit([label("a")], late).unwrap(),
            SubmitResult::Expired
        );

        let summary = session.summary().unwrap();
        assert!(summary.timed_out);
        assert_eq!(summary.score, 1);
        assert_eq!(summary.answered, 1);
        assert_eq!(summary.elapsed_secs, 1080);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn pause_stops_the_clock_and_blocks_answers() {
        let t0 = fixed_now();
        let mut session = started(
            vec![build_question(1, &["a"]), build_question(2, &["a"])],
            Some(Duration::seconds(60)),
        );

        session.pause(t0 + Duration::seconds(50)).unwrap();
        assert!(session.is_paused());
        assert_eq!(
            session.submit([label("a")], t0 + Duration::seconds(500)),
            Err(SessionError::Paused)
        );

        let view = session.resume(t0 + Duration::seconds(500)).unwrap();
        assert_eq!(view.elapsed_secs, 50);
        assert_eq!(view.remaining_secs, Some(10));
        assert_eq!(view.limit_secs, Some(60));
        assert_eq!(session.current_index(), 0);

        let result = session.submit([label("a")], t0 + Duration::seconds(505)).unwrap();
        assert!(result.is_accepted());
        assert!(session.refresh(t0 + Duration::seconds(510)));
        assert_eq!(session.phase(), QuizPhase::Finished);
    }

    #[test]
    fn abandon_finishes_early() {
        let mut session = started(vec![build_question(1, &["a"]), build_question(2, &["a"])], None);
        session.submit([label("a")], fixed_now()).unwrap();
        let view = session.abandon(fixed_now()).unwrap();
        assert_eq!(view.phase, QuizPhase::Finished);
        assert_eq!(session.history().len(), 1);
        assert!(session.abandon(fixed_now()).is_err());
    }
}
