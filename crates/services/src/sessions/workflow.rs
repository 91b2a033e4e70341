use chrono::Duration;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

use quiz_core::model::{HistoryEntry, OptionLabel, Question};
use quiz_core::time::time_limit_for;
use storage::QuestionStore;

use super::plan::{QuestionSampler, SampleMode};
use super::progress::SessionView;
use super::service::{QuizSession, Reveal, SubmitResult};
use super::view::HistoryStats;
use crate::Clock;
use crate::error::SessionError;

/// Time budget for a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeLimit {
    #[default]
    Untimed,
    /// `quiz_core::time::SECONDS_PER_QUESTION` for each sampled question.
    PerQuestion,
    Fixed(Duration),
}

impl TimeLimit {
    /// Concrete limit for a pass of `count` questions.
    #[must_use]
    pub fn resolve(self, count: usize) -> Option<Duration> {
        match self {
            TimeLimit::Untimed => None,
            TimeLimit::PerQuestion => Some(time_limit_for(count)),
            TimeLimit::Fixed(limit) => Some(limit),
        }
    }
}

/// What the user asked for when starting a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRequest {
    pub count: usize,
    pub mode: SampleMode,
    pub time_limit: TimeLimit,
}

impl QuizRequest {
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            count,
            mode: SampleMode::Balanced,
            time_limit: TimeLimit::Untimed,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: SampleMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_time_limit(mut self, time_limit: TimeLimit) -> Self {
        self.time_limit = time_limit;
        self
    }
}

/// Orchestrates sampling and session transitions against a shared pool.
///
/// The service itself holds no per-user state; every call takes the caller's
/// `QuizSession`.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    store: Arc<QuestionStore>,
    seed: Option<u64>,
    shuffle_options: bool,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<QuestionStore>) -> Self {
        Self {
            clock,
            store,
            seed: None,
            shuffle_options: true,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Make sampling reproducible. Each pass derives its own stream from the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_shuffle_options(mut self, shuffle_options: bool) -> Self {
        self.shuffle_options = shuffle_options;
        self
    }

    #[must_use]
    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    #[must_use]
    pub fn store_size(&self) -> usize {
        self.store.len()
    }

    /// Sample a question set and begin a new pass.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownCategory` when a targeted category has no
    /// questions and `SessionError::Empty` when nothing could be sampled.
    pub fn start(
        &self,
        session: &mut QuizSession,
        request: &QuizRequest,
    ) -> Result<SessionView, SessionError> {
        if let SampleMode::Targeted(category) = &request.mode {
            if self.store.by_category(category).is_empty() {
                return Err(SessionError::UnknownCategory {
                    category: category.clone(),
                });
            }
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(u64::from(session.pass()))),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let plan = QuestionSampler::new(self.store.questions())
            .with_shuffle_options(self.shuffle_options)
            .build(request.count, &request.mode, &mut rng);

        tracing::debug!(
            requested = request.count,
            sampled = plan.total(),
            backfilled = plan.backfilled,
            mode = ?request.mode,
            "question set sampled"
        );
        let limit = request.time_limit.resolve(plan.total());
        session.start(plan.questions, limit, self.clock.now())
    }

    /// The question on screen after applying any pending timer expiry.
    pub fn current_question<'s>(&self, session: &'s mut QuizSession) -> Option<&'s Question> {
        session.refresh(self.clock.now());
        session.current_question()
    }

    /// # Errors
    ///
    /// See `QuizSession::submit`.
    pub fn submit(
        &self,
        session: &mut QuizSession,
        selections: impl IntoIterator<Item = OptionLabel>,
    ) -> Result<SubmitResult, SessionError> {
        session.submit(selections, self.clock.now())
    }

    /// # Errors
    ///
    /// See `QuizSession::reveal`.
    pub fn reveal(&self, session: &mut QuizSession) -> Result<Reveal, SessionError> {
        session.refresh(self.clock.now());
        session.reveal()
    }

    /// # Errors
    ///
    /// See `QuizSession::next`.
    pub fn next(&self, session: &mut QuizSession) -> Result<SessionView, SessionError> {
        session.next(self.clock.now())
    }

    /// # Errors
    ///
    /// See `QuizSession::pause`.
    pub fn pause(&self, session: &mut QuizSession) -> Result<SessionView, SessionError> {
        session.pause(self.clock.now())
    }

    /// # Errors
    ///
    /// See `QuizSession::resume`.
    pub fn resume(&self, session: &mut QuizSession) -> Result<SessionView, SessionError> {
        session.resume(self.clock.now())
    }

    /// # Errors
    ///
    /// See `QuizSession::abandon`.
    pub fn abandon(&self, session: &mut QuizSession) -> Result<SessionView, SessionError> {
        session.abandon(self.clock.now())
    }

    pub fn view(&self, session: &mut QuizSession) -> SessionView {
        let now = self.clock.now();
        session.refresh(now);
        session.view(now)
    }

    #[must_use]
    pub fn history<'s>(&self, session: &'s QuizSession) -> &'s [HistoryEntry] {
        session.history().entries()
    }

    #[must_use]
    pub fn stats(&self, session: &QuizSession) -> HistoryStats {
        HistoryStats::from_entries(session.history().entries())
    }
}
