#![forbid(unsafe_code)]

pub mod csv_loader;
pub mod error;
pub mod source;
pub mod store;

pub use csv_loader::{LoadReport, REQUIRED_COLUMNS, load_from_reader};
pub use error::{LoadError, RowError};
pub use source::{CsvFileSource, CsvTextSource, QuestionSource};
pub use store::QuestionStore;
