use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::csv_loader::{LoadReport, load_from_reader};
use crate::error::LoadError;

/// Contract for anything that can produce the question pool.
pub trait QuestionSource {
    /// Human-readable origin, used in log lines.
    fn describe(&self) -> String;

    /// Parse the source into questions.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` when the source is unreadable, lacks required
    /// columns, or yields no valid question.
    fn load(&self) -> Result<LoadReport, LoadError>;
}

/// Question sheet on disk.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QuestionSource for CsvFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<LoadReport, LoadError> {
        let file = File::open(&self.path)?;
        load_from_reader(BufReader::new(file))
    }
}

/// Question sheet held in memory.
#[derive(Debug, Clone)]
pub struct CsvTextSource {
    text: String,
}

impl CsvTextSource {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl QuestionSource for CsvTextSource {
    fn describe(&self) -> String {
        format!("<in-memory, {} bytes>", self.text.len())
    }

    fn load(&self) -> Result<LoadReport, LoadError> {
        load_from_reader(self.text.as_bytes())
    }
}
