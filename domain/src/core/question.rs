//! Question entity
//!
//! A question is supplied by the platform collaborator and is read-only
//! inside the pipeline. All text fields are carried verbatim into prompts.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Bounds and labels of a numeric question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    /// Lower bound of the resolution value
    pub lower: f64,
    /// Upper bound of the resolution value
    pub upper: f64,
    /// Whether the question can resolve below `lower`
    pub open_lower: bool,
    /// Whether the question can resolve above `upper`
    pub open_upper: bool,
    /// Unit label (e.g., "USD", "people")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Nominal display bounds, when they differ from the hard bounds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nominal_lower: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nominal_upper: Option<f64>,
}

impl NumericRange {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            open_lower: false,
            open_upper: false,
            unit: None,
            nominal_lower: None,
            nominal_upper: None,
        }
    }

    pub fn open(mut self, lower: bool, upper: bool) -> Self {
        self.open_lower = lower;
        self.open_upper = upper;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_nominal(mut self, lower: f64, upper: f64) -> Self {
        self.nominal_lower = Some(lower);
        self.nominal_upper = Some(upper);
        self
    }
}

/// The kind of answer a question resolves to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Resolves yes/no; forecast is a single probability
    Binary,
    /// Resolves to one of the declared options; forecast is a probability
    /// per option, summing to 1
    MultipleChoice { options: Vec<String> },
    /// Resolves to a number inside (or outside, if open) the range;
    /// forecast is a six-point percentile distribution
    Numeric(NumericRange),
}

impl QuestionKind {
    /// Short label used in logs and reports
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::Binary => "binary",
            QuestionKind::MultipleChoice { .. } => "multiple_choice",
            QuestionKind::Numeric(_) => "numeric",
        }
    }
}

/// A structured forecasting question (Entity)
///
/// Immutable once fetched; the pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Platform identifier
    pub id: String,
    /// The question text itself
    pub title: String,
    /// Background context supplied by the platform
    pub background: String,
    /// How the question will be resolved
    pub resolution_criteria: String,
    /// Additional clarifications, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fine_print: Option<String>,
    /// Answer shape
    pub kind: QuestionKind,
}

impl Question {
    /// Create a question, validating that it is well-formed
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: QuestionKind,
    ) -> Result<Self, DomainError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::InvalidQuestion(
                "title cannot be empty".to_string(),
            ));
        }
        if let QuestionKind::MultipleChoice { options } = &kind {
            if options.len() < 2 {
                return Err(DomainError::InvalidQuestion(
                    "multiple-choice question needs at least 2 options".to_string(),
                ));
            }
        }
        if let QuestionKind::Numeric(range) = &kind {
            if range.lower > range.upper {
                return Err(DomainError::InvalidQuestion(format!(
                    "numeric bounds inverted: {} > {}",
                    range.lower, range.upper
                )));
            }
        }
        Ok(Self {
            id: id.into(),
            title,
            background: String::new(),
            resolution_criteria: String::new(),
            fine_print: None,
            kind,
        })
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    pub fn with_resolution_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.resolution_criteria = criteria.into();
        self
    }

    pub fn with_fine_print(mut self, fine_print: impl Into<String>) -> Self {
        self.fine_print = Some(fine_print.into());
        self
    }

    /// Option labels for a multiple-choice question, empty otherwise
    pub fn options(&self) -> &[String] {
        match &self.kind {
            QuestionKind::MultipleChoice { options } => options,
            _ => &[],
        }
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind.label(), self.title)
    }
}
