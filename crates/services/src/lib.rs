#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use quiz_core::Clock;

pub use error::SessionError;
pub use sessions::{
    CategoryStats, HistoryStats, PASS_THRESHOLD_PERCENT, PassSummary, QuestionSampler,
    QuizLoopService, QuizPhase, QuizRequest, QuizSession, Reveal, SampleMode, SamplePlan,
    SessionView, SubmitResult, TimeLimit,
};
