//! Question file loading
//!
//! Questions are supplied as TOML files since platform discovery is a
//! separate concern. The raw file structure is deserialized here and then
//! validated through the domain constructor, so a malformed question
//! never reaches the pipeline.

use foresight_domain::{DomainError, NumericRange, Question, QuestionKind};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuestionFileError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("could not parse question file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid question: {0}")]
    Invalid(#[from] DomainError),

    #[error("unknown question kind '{0}' (expected binary, multiple_choice or numeric)")]
    UnknownKind(String),

    #[error("numeric question requires a [range] section")]
    MissingRange,
}

/// Raw TOML structure of a question file
#[derive(Debug, Deserialize)]
struct QuestionFile {
    id: String,
    title: String,
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    background: String,
    #[serde(default)]
    resolution_criteria: String,
    fine_print: Option<String>,
    range: Option<RangeSection>,
}

fn default_kind() -> String {
    "binary".to_string()
}

#[derive(Debug, Deserialize)]
struct RangeSection {
    lower: f64,
    upper: f64,
    #[serde(default)]
    open_lower: bool,
    #[serde(default)]
    open_upper: bool,
    unit: Option<String>,
}

/// Load and validate a question from a TOML file
pub fn load_question(path: &Path) -> Result<Question, QuestionFileError> {
    let text = std::fs::read_to_string(path).map_err(|source| QuestionFileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_question(&text)
}

fn parse_question(text: &str) -> Result<Question, QuestionFileError> {
    let file: QuestionFile = toml::from_str(text)?;
    let kind = match file.kind.as_str() {
        "binary" => QuestionKind::Binary,
        "multiple_choice" => QuestionKind::MultipleChoice {
            options: file.options,
        },
        "numeric" => {
            let section = file.range.ok_or(QuestionFileError::MissingRange)?;
            let mut range = NumericRange::new(section.lower, section.upper)
                .open(section.open_lower, section.open_upper);
            if let Some(unit) = section.unit {
                range = range.with_unit(unit);
            }
            QuestionKind::Numeric(range)
        }
        other => return Err(QuestionFileError::UnknownKind(other.to_string())),
    };

    let mut question = Question::new(file.id, file.title, kind)?
        .with_background(file.background)
        .with_resolution_criteria(file.resolution_criteria);
    if let Some(fine_print) = file.fine_print {
        question = question.with_fine_print(fine_print);
    }
    Ok(question)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binary_question() {
        let text = r#"
id = "q1"
title = "Will the treaty be ratified this year?"
background = "Negotiations concluded in June."
resolution_criteria = "Resolves yes on ratification by Dec 31."
fine_print = "Provisional application does not count."
"#;
        let q = parse_question(text).unwrap();
        assert_eq!(q.id, "q1");
        assert_eq!(q.kind, QuestionKind::Binary);
        assert_eq!(q.fine_print.as_deref(), Some("Provisional application does not count."));
    }

    #[test]
    fn test_parse_multiple_choice_question() {
        let text = r#"
id = "q2"
title = "Which party wins the most seats?"
kind = "multiple_choice"
options = ["Party A", "Party B", "Other"]
"#;
        let q = parse_question(text).unwrap();
        assert_eq!(q.options(), ["Party A", "Party B", "Other"]);
    }

    #[test]
    fn test_parse_numeric_question() {
        let text = r#"
id = "q3"
title = "What will the CPI reading be?"
kind = "numeric"

[range]
lower = 0.0
upper = 10.0
open_upper = true
unit = "percent"
"#;
        let q = parse_question(text).unwrap();
        let QuestionKind::Numeric(range) = &q.kind else {
            panic!("wrong kind");
        };
        assert_eq!(range.upper, 10.0);
        assert!(range.open_upper);
        assert_eq!(range.unit.as_deref(), Some("percent"));
    }

    #[test]
    fn test_numeric_without_range_rejected() {
        let text = r#"
id = "q4"
title = "How many?"
kind = "numeric"
"#;
        assert!(matches!(
            parse_question(text),
            Err(QuestionFileError::MissingRange)
        ));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let text = r#"
id = "q5"
title = "What?"
kind = "date"
"#;
        assert!(matches!(
            parse_question(text),
            Err(QuestionFileError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_domain_validation_applies() {
        let text = r#"
id = "q6"
title = "Which?"
kind = "multiple_choice"
options = ["Only one"]
"#;
        assert!(matches!(
            parse_question(text),
            Err(QuestionFileError::Invalid(_))
        ));
    }
}
