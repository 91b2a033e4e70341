use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LabelError {
    #[error("option label cannot be empty")]
    Empty,

    #[error("not an option label: {raw:?}")]
    NotALetter { raw: String },

    #[error("option position {index} exceeds the {max} available labels")]
    OutOfRange { index: usize, max: usize },
}

//
// ─── OPTION LABEL ──────────────────────────────────────────────────────────────
//

/// Display letter of an option, derived from its position (0 → `a`, 1 → `b`, …).
///
/// A label never carries the option text; it only names a slot in the
/// question's current option order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionLabel(u8);

impl OptionLabel {
    /// Number of distinct labels (`a` through `z`).
    pub const MAX_OPTIONS: usize = 26;

    /// Label for the option at `index`.
    ///
    /// # Errors
    ///
    /// Returns `LabelError::OutOfRange` when `index >= MAX_OPTIONS`.
    pub fn from_index(index: usize) -> Result<Self, LabelError> {
        u8::try_from(index)
            .ok()
            .filter(|i| usize::from(*i) < Self::MAX_OPTIONS)
            .map(Self)
            .ok_or(LabelError::OutOfRange {
                index,
                max: Self::MAX_OPTIONS,
            })
    }

    /// Positions are bounded by the question invariant, so this never sees an index > 25.
    pub(crate) fn nth(index: usize) -> Self {
        debug_assert!(index < Self::MAX_OPTIONS);
        Self(u8::try_from(index).unwrap_or(u8::MAX))
    }

    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    #[must_use]
    pub fn letter(self) -> char {
        char::from(b'a' + self.0)
    }

    /// Drops a leading `a.` / `a)` / `a:` style marker when its letter is this label's.
    ///
    /// Text whose prefix names a different letter is returned unchanged, as is
    /// a bare marker with nothing after it.
    #[must_use]
    pub fn strip_from(self, text: &str) -> &str {
        let trimmed = text.trim_start();
        let mut chars = trimmed.char_indices();
        let (Some((_, first)), Some((mark_at, mark))) = (chars.next(), chars.next()) else {
            return text.trim();
        };
        let first = narrow(first);
        if first.to_ascii_lowercase() != self.letter() || !PREFIX_MARKS.contains(&mark) {
            return text.trim();
        }
        let rest = trimmed[mark_at + mark.len_utf8()..].trim();
        if rest.is_empty() {
            text.trim()
        } else {
            rest
        }
    }
}

const PREFIX_MARKS: [char; 7] = ['.', ')', ':', '．', '）', '：', '、'];

impl fmt::Debug for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OptionLabel({})", self.letter())
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Maps full-width Latin letters (common in Japanese spreadsheets) to ASCII.
fn narrow(c: char) -> char {
    match c {
        '\u{FF21}'..='\u{FF3A}' | '\u{FF41}'..='\u{FF5A}' => {
            char::from_u32(u32::from(c) - 0xFEE0).unwrap_or(c)
        }
        _ => c,
    }
}

impl FromStr for OptionLabel {
    type Err = LabelError;

    /// Accepts a single letter, case-insensitive, with an optional trailing
    /// `.`, `)` or `:` (e.g. `a`, `C`, `b.`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(LabelError::Empty);
        }
        let body = trimmed
            .strip_suffix(PREFIX_MARKS)
            .unwrap_or(trimmed)
            .trim_end();

        let mut chars = body.chars().map(narrow);
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                let offset = c.to_ascii_lowercase() as u8 - b'a';
                Self::from_index(usize::from(offset))
            }
            _ => Err(LabelError::NotALetter {
                raw: trimmed.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_position() {
        assert_eq!(OptionLabel::from_index(0).unwrap().letter(), 'a');
        assert_eq!(OptionLabel::from_index(3).unwrap().to_string(), "d");
        assert!(matches!(
            OptionLabel::from_index(26),
            Err(LabelError::OutOfRange { index: 26, .. })
        ));
    }

    #[test]
    fn parse_accepts_case_and_punctuation() {
        let c = OptionLabel::from_index(2).unwrap();
        assert_eq!("c".parse::<OptionLabel>().unwrap(), c);
        assert_eq!(" C ".parse::<OptionLabel>().unwrap(), c);
        assert_eq!("c.".parse::<OptionLabel>().unwrap(), c);
        assert_eq!("c)".parse::<OptionLabel>().unwrap(), c);
    }

    #[test]
    fn parse_accepts_full_width_letters() {
        let b = OptionLabel::from_index(1).unwrap();
        assert_eq!("ｂ".parse::<OptionLabel>().unwrap(), b);
        assert_eq!("Ｂ．".parse::<OptionLabel>().unwrap(), b);
    }

    #[test]
    fn strip_only_removes_matching_prefix() {
        let b = OptionLabel::from_index(1).unwrap();
        assert_eq!(b.strip_from("b. Forceps"), "Forceps");
        assert_eq!(b.strip_from(" B) Forceps "), "Forceps");
        assert_eq!(b.strip_from("ｂ．鉗子"), "鉗子");
        assert_eq!(b.strip_from("a. Forceps"), "a. Forceps");
        assert_eq!(b.strip_from("Bile duct"), "Bile duct");
        assert_eq!(b.strip_from("b."), "b.");
    }

    #[test]
    fn parse_rejects_words_and_digits() {
        assert!(matches!(
            "ab".parse::<OptionLabel>(),
            Err(LabelError::NotALetter { .. })
        ));
        assert!("1".parse::<OptionLabel>().is_err());
        assert!(matches!("  ".parse::<OptionLabel>(), Err(LabelError::Empty)));
    }
}
