mod category;
mod history;
mod ids;
mod label;
mod question;

pub use category::Category;
pub use history::{HistoryEntry, QuizHistory};
pub use ids::{ParseIdError, QuestionId};
pub use label::{LabelError, OptionLabel};
pub use question::{Question, QuestionError, QuizOption};
