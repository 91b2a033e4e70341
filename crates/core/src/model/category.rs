use serde::{Deserialize, Serialize};
use std::fmt;

/// Subject area of a question.
///
/// Labels are normalized (trimmed, lowercased); a missing label becomes `general`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Labels used by the certification question sheets.
    pub const KNOWN: [&'static str; 6] = [
        "basic",
        "clinical",
        "equipment",
        "pharmacology",
        "procedure",
        "management",
    ];

    pub const GENERAL: &'static str = "general";

    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            Self::general()
        } else {
            Self(normalized)
        }
    }

    #[must_use]
    pub fn general() -> Self {
        Self(Self::GENERAL.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for one of the sheet's own labels.
    #[must_use]
    pub fn is_known(&self) -> bool {
        Self::KNOWN.contains(&self.0.as_str())
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::general()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_normalizes_case_and_whitespace() {
        assert_eq!(Category::new("  Clinical "), Category::new("clinical"));
        assert!(Category::new("Clinical").is_known());
    }

    #[test]
    fn blank_category_is_general() {
        assert_eq!(Category::new("   "), Category::general());
        assert_eq!(Category::default().as_str(), "general");
        assert!(!Category::general().is_known());
    }
}
