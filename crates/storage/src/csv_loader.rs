use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::io::Read;

use quiz_core::model::{Category, OptionLabel, Question, QuestionId};

use crate::error::{LoadError, RowError};

/// Columns every question sheet must carry. `category` is optional.
pub const REQUIRED_COLUMNS: [&str; 4] = ["question", "options", "answer", "explanation"];

const OPTION_SEPARATOR: char = '|';
const ANSWER_SEPARATOR: char = '&';

/// Parsed pool plus the rows that were dropped on the way.
#[derive(Debug)]
pub struct LoadReport {
    pub questions: Vec<Question>,
    /// Each entry is a `LoadError::MalformedRow`.
    pub skipped: Vec<LoadError>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    question: String,
    options: String,
    answer: String,
    explanation: String,
    #[serde(default)]
    category: Option<String>,
}

/// Parse a question sheet from any reader.
///
/// Header names are matched case-insensitively and a UTF-8 BOM on the first
/// header is ignored. Rows that cannot be turned into a valid question are
/// logged and skipped.
///
/// # Errors
///
/// Returns `LoadError::MissingColumns` when a required header is absent,
/// `LoadError::EmptyPool` when no row survives, and `LoadError::Csv` when the
/// header row itself cannot be read.
pub fn load_from_reader<R: Read>(input: R) -> Result<LoadReport, LoadError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let headers: StringRecord = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
        .collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| (*column).to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns { missing });
    }
    reader.set_headers(headers);

    let mut questions = Vec::new();
    let mut skipped = Vec::new();
    for (index, record) in reader.deserialize::<RawRow>().enumerate() {
        let row = index + 1;
        let parsed = record
            .map_err(|e| RowError::Record(e.to_string()))
            .and_then(|raw| build_question(row, raw));
        match parsed {
            Ok(question) => questions.push(question),
            Err(reason) => {
                tracing::warn!(row, %reason, "skipping malformed question row");
                skipped.push(LoadError::MalformedRow { row, reason });
            }
        }
    }

    if questions.is_empty() {
        return Err(LoadError::EmptyPool {
            skipped: skipped.len(),
        });
    }

    Ok(LoadReport { questions, skipped })
}

fn build_question(row: usize, raw: RawRow) -> Result<Question, RowError> {
    let options = split_options(&raw.options);
    let correct = parse_answer(&raw.answer, &options)?;
    let id = QuestionId::new(u64::try_from(row).unwrap_or(u64::MAX));
    let category = raw.category.map_or_else(Category::general, Category::new);

    Ok(Question::new(
        id,
        raw.question,
        category,
        options,
        correct,
        raw.explanation,
    )?)
}

/// Split the options cell and strip positional letter markers.
///
/// Trailing empty segments (a dangling `|`) are dropped; empty segments in the
/// middle are kept so validation can reject them.
fn split_options(cell: &str) -> Vec<String> {
    let mut parts: Vec<&str> = cell.split(OPTION_SEPARATOR).map(str::trim).collect();
    while parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
        .into_iter()
        .enumerate()
        .map(|(index, text)| match OptionLabel::from_index(index) {
            Ok(label) => label.strip_from(text).to_owned(),
            Err(_) => text.to_owned(),
        })
        .collect()
}

/// Resolve each `&`-separated token to an option position.
///
/// A token is a label (`a`, `C.`) or, failing that, the exact text of one option.
fn parse_answer(cell: &str, options: &[String]) -> Result<BTreeSet<OptionLabel>, RowError> {
    let tokens: Vec<&str> = cell
        .split(ANSWER_SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Err(RowError::EmptyAnswer);
    }

    let mut labels = BTreeSet::new();
    for token in tokens {
        let label = match token.parse::<OptionLabel>() {
            Ok(label) if label.index() < options.len() => label,
            Ok(_) => {
                return Err(RowError::UnknownLabel {
                    token: token.to_owned(),
                });
            }
            Err(_) => {
                let position = text_position(token, options).ok_or_else(|| {
                    RowError::UnknownLabel {
                        token: token.to_owned(),
                    }
                })?;
                OptionLabel::from_index(position)?
            }
        };
        labels.insert(label);
    }
    Ok(labels)
}

/// Position of the option whose text is `token`, with or without that
/// option's own letter marker (`b. Port` matches `Port` only in slot `b`).
fn text_position(token: &str, options: &[String]) -> Option<usize> {
    options.iter().enumerate().position(|(index, text)| {
        text == token
            || OptionLabel::from_index(index).is_ok_and(|label| label.strip_from(token) == text)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionError;

    const HEADER: &str = "question,options,answer,explanation,category\n";

    fn load(body: &str) -> Result<LoadReport, LoadError> {
        load_from_reader(format!("{HEADER}{body}").as_bytes())
    }

    fn labels(q: &Question) -> Vec<String> {
        q.correct_labels().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parses_multi_answer_and_strips_prefixes() {
        let report = load("Pick two,a. Lumen|b. Port|c. Guide|d. Valve,a&c,Because,Equipment\n")
            .unwrap();
        assert!(report.skipped.is_empty());
        let q = &report.questions[0];
        assert_eq!(q.id(), QuestionId::new(1));
        assert_eq!(q.options()[0].text(), "Lumen");
        assert_eq!(q.options()[3].text(), "Valve");
        assert_eq!(labels(q), vec!["a", "c"]);
        assert_eq!(q.category().as_str(), "equipment");
    }

    #[test]
    fn answer_may_be_option_text() {
        let report = load("Single,Lumen|Port|Guide,Port,Because,basic\n").unwrap();
        assert_eq!(labels(&report.questions[0]), vec!["b"]);
    }

    #[test]
    fn answer_may_repeat_the_prefixed_option() {
        let report = load("Q,a. Lumen|b. Port|c. Guide,b. Port & c) Guide,why,basic\n").unwrap();
        assert!(report.skipped.is_empty());
        assert_eq!(labels(&report.questions[0]), vec!["b", "c"]);

        let err = load("Q,a. Lumen|b. Port|c. Guide,a. Port,why,basic\n").unwrap_err();
        assert!(matches!(err, LoadError::EmptyPool { skipped: 1 }));
    }

    #[test]
    fn answer_tokens_collapse_and_ignore_case() {
        let report = load("Q,w|x|y,B & b & C.,why,\n").unwrap();
        assert_eq!(labels(&report.questions[0]), vec!["b", "c"]);
        assert_eq!(report.questions[0].category(), &Category::general());
    }

    #[test]
    fn dangling_separator_is_ignored() {
        let report = load("Q,w|x|y|,a,why,basic\n").unwrap();
        assert_eq!(report.questions[0].options().len(), 3);
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let report = load(concat!(
            "Good,w|x,a,why,basic\n",
            "Bad label,w|x,e,why,basic\n",
            "No answer,w|x,,why,basic\n",
            "Dup,w|w,a,why,basic\n",
            "Short row,w|x\n",
        ))
        .unwrap();

        assert_eq!(report.questions.len(), 1);
        assert_eq!(report.skipped.len(), 4);
        let reasons: Vec<_> = report
            .skipped
            .iter()
            .map(|e| match e {
                LoadError::MalformedRow { row, reason } => (*row, reason.clone()),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert!(matches!(reasons[0], (2, RowError::UnknownLabel { .. })));
        assert!(matches!(reasons[1], (3, RowError::EmptyAnswer)));
        assert!(matches!(
            reasons[2],
            (4, RowError::Invalid(QuestionError::DuplicateOption { .. }))
        ));
        assert!(matches!(reasons[3], (5, RowError::Record(_))));
    }

    #[test]
    fn missing_columns_are_fatal() {
        let err = load_from_reader("question,options\nQ,w|x\n".as_bytes()).unwrap_err();
        match err {
            LoadError::MissingColumns { missing } => {
                assert_eq!(missing, vec!["answer".to_owned(), "explanation".to_owned()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn all_rows_bad_is_empty_pool() {
        let err = load("Bad,w|x,z,why,basic\n").unwrap_err();
        assert!(matches!(err, LoadError::EmptyPool { skipped: 1 }));
    }

    #[test]
    fn headers_tolerate_bom_case_and_missing_category() {
        let text = "\u{feff}Question, Options ,ANSWER,Explanation\nQ,w|x,b,why\n";
        let report = load_from_reader(text.as_bytes()).unwrap();
        assert_eq!(report.questions.len(), 1);
        assert_eq!(report.questions[0].category(), &Category::general());
    }
}
