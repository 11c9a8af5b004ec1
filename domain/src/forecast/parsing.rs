//! Fixed-pattern extraction from free-form model output
//!
//! These functions are the second stage of the two-stage extraction
//! contract: when the schema-validated JSON sub-call fails, the run's raw
//! reasoning text is scanned for the documented output patterns. They are
//! pure domain logic with no I/O, and they never panic on hostile input.
//!
//! | Function | Pattern |
//! |----------|---------|
//! | [`extract_probability`] | `Probability: NN%` |
//! | [`extract_option_probabilities`] | `<option>: NN%` per declared option |
//! | [`extract_percentiles`] | `Percentile NN: value` for all six levels |
//! | [`extract_relevance_score`] | first digit 1-6, defaulting to 3 |

use crate::forecast::prediction::{OptionProbability, PERCENTILE_LEVELS, Percentiles, Prediction};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Failure to extract a structured value from model output
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("no {0} pattern found in output")]
    NoMatch(&'static str),

    #[error("missing value for option '{0}'")]
    MissingOption(String),

    #[error("missing value for percentile {0}")]
    MissingPercentile(u8),

    #[error("percentile values are not non-decreasing: {0}")]
    NotMonotonic(String),

    #[error("option probabilities sum to zero")]
    ZeroMass,
}

fn probability_percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)probability:\s*([0-9]+(?:\.[0-9]+)?)\s*%").expect("static regex")
    })
}

fn probability_decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)probability:\s*(0?\.[0-9]+)").expect("static regex"))
}

fn percentile_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)percentile\s*([0-9]{1,2})\s*:\s*\$?(-?[0-9][0-9,]*(?:\.[0-9]+)?)")
            .expect("static regex")
    })
}

/// Extract a binary probability from `Probability: NN%` (or a bare
/// decimal form `Probability: 0.NN`), clamped to [0.01, 0.99].
///
/// When the pattern occurs more than once the last occurrence wins, since
/// models typically restate their final answer at the end.
pub fn extract_probability(text: &str) -> Result<Prediction, ParseError> {
    if let Some(caps) = probability_percent_re().captures_iter(text).last()
        && let Ok(pct) = caps[1].parse::<f64>()
    {
        return Ok(Prediction::binary(pct / 100.0));
    }
    if let Some(caps) = probability_decimal_re().captures_iter(text).last()
        && let Ok(p) = caps[1].parse::<f64>()
    {
        return Ok(Prediction::binary(p));
    }
    Err(ParseError::NoMatch("probability"))
}

/// Extract per-option probabilities, requiring a `<option>: NN%` line for
/// every declared option. Masses are normalized to sum to 1.
pub fn extract_option_probabilities(
    text: &str,
    options: &[String],
) -> Result<Prediction, ParseError> {
    let mut extracted = Vec::with_capacity(options.len());
    for option in options {
        let pattern = format!(
            r"(?im)^\s*(?:option\s+)?{}\s*:\s*([0-9]+(?:\.[0-9]+)?)\s*%?\s*$",
            regex::escape(option)
        );
        let re = Regex::new(&pattern).map_err(|_| ParseError::MissingOption(option.clone()))?;
        let Some(caps) = re.captures_iter(text).last() else {
            return Err(ParseError::MissingOption(option.clone()));
        };
        let value: f64 = caps[1]
            .parse()
            .map_err(|_| ParseError::MissingOption(option.clone()))?;
        // Values above 1 are read as percentages
        let mass = if value > 1.0 { value / 100.0 } else { value };
        extracted.push(OptionProbability::new(option.clone(), mass));
    }
    Prediction::multiple_choice(extracted).ok_or(ParseError::ZeroMass)
}

/// Extract all six declared percentiles from `Percentile NN: value` lines.
///
/// Thousands separators and a leading currency sign are tolerated; a
/// non-monotonic set is rejected rather than silently reordered.
pub fn extract_percentiles(text: &str) -> Result<Prediction, ParseError> {
    let mut found: [Option<f64>; 6] = [None; 6];
    for caps in percentile_re().captures_iter(text) {
        let Ok(level) = caps[1].parse::<u8>() else {
            continue;
        };
        let Some(idx) = PERCENTILE_LEVELS.iter().position(|l| *l == level) else {
            continue;
        };
        if let Ok(value) = caps[2].replace(',', "").parse::<f64>() {
            found[idx] = Some(value);
        }
    }
    let mut values = [0.0; 6];
    for (i, slot) in found.iter().enumerate() {
        values[i] = slot.ok_or(ParseError::MissingPercentile(PERCENTILE_LEVELS[i]))?;
    }
    let percentiles = Percentiles::new(values).map_err(ParseError::NotMonotonic)?;
    Ok(Prediction::numeric(percentiles))
}

/// Extract a relevance score from rater output.
///
/// The first digit in 1-6 found in the text wins; anything unparseable
/// yields exactly 3 (neutral), never an error.
pub fn extract_relevance_score(text: &str) -> u8 {
    text.chars()
        .find(|c| ('1'..='6').contains(c))
        .and_then(|c| c.to_digit(10))
        .map(|d| d as u8)
        .unwrap_or(3)
}

/// Find the outermost JSON object in a block of text.
///
/// Models often wrap JSON in prose or markdown fences; this returns the
/// slice between the first `{` and the last `}` for the caller to
/// deserialize.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text[start..].rfind('}')?;
    Some(&text[start..start + end + 1])
}
