//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::Category;

use crate::sessions::QuizPhase;

/// Errors emitted by quiz session operations.
///
/// Expected user mistakes (wrong selection count, expired timer) are reported
/// through `SubmitResult` instead; these variants mark calls made in a phase
/// that does not allow them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for this quiz")]
    Empty,
    #[error("no questions in category {category}")]
    UnknownCategory { category: Category },
    #[error("no question is awaiting an answer (phase: {phase:?})")]
    NotInProgress { phase: QuizPhase },
    #[error("the current answer has not been revealed yet (phase: {phase:?})")]
    NotRevealed { phase: QuizPhase },
    #[error("the quiz is paused")]
    Paused,
}
