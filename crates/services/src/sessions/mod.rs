mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{QuestionSampler, SampleMode, SamplePlan};
pub use progress::{PASS_THRESHOLD_PERCENT, PassSummary, SessionView};
pub use service::{QuizPhase, QuizSession, Reveal, SubmitResult};
pub use view::{CategoryStats, HistoryStats};
pub use workflow::{QuizLoopService, QuizRequest, TimeLimit};
