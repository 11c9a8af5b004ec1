//! Prediction value objects and aggregation
//!
//! A [`Prediction`] is the typed union of the three answer shapes. All
//! aggregation used by the pipeline (component-wise median for
//! representative selection, arithmetic mean for the synthesis fallback,
//! neutral defaults for the fully degraded path) lives here as pure logic.

use crate::core::question::{NumericRange, QuestionKind};
use serde::{Deserialize, Serialize};

/// The six declared percentile levels of a numeric forecast
pub const PERCENTILE_LEVELS: [u8; 6] = [10, 20, 40, 60, 80, 90];

/// A six-point percentile distribution for numeric questions
///
/// Values are indexed by [`PERCENTILE_LEVELS`] and must be monotonically
/// non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    values: [f64; 6],
}

impl Percentiles {
    /// Construct from values at the declared levels, enforcing monotonicity
    pub fn new(values: [f64; 6]) -> Result<Self, String> {
        for pair in values.windows(2) {
            if pair[1] < pair[0] {
                return Err(format!(
                    "percentile values must be non-decreasing, got {} after {}",
                    pair[1], pair[0]
                ));
            }
        }
        Ok(Self { values })
    }

    /// A bound-spanning distribution across the question's range,
    /// used as the neutral default when every forecaster failed
    pub fn spanning(range: &NumericRange) -> Self {
        let lower = range.lower;
        let width = range.upper - range.lower;
        let mut values = [0.0; 6];
        for (i, level) in PERCENTILE_LEVELS.iter().enumerate() {
            values[i] = lower + width * (f64::from(*level) / 100.0);
        }
        Self { values }
    }

    /// Value at one of the declared levels
    pub fn value_at(&self, level: u8) -> Option<f64> {
        PERCENTILE_LEVELS
            .iter()
            .position(|l| *l == level)
            .map(|i| self.values[i])
    }

    pub fn values(&self) -> &[f64; 6] {
        &self.values
    }
}

/// Probability mass assigned to one option of a multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionProbability {
    pub option: String,
    pub probability: f64,
}

impl OptionProbability {
    pub fn new(option: impl Into<String>, probability: f64) -> Self {
        Self {
            option: option.into(),
            probability,
        }
    }
}

/// A structured prediction for one question (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prediction {
    /// Probability of the question resolving yes
    Binary { probability: f64 },
    /// Probability per option, summing to 1
    MultipleChoice { options: Vec<OptionProbability> },
    /// Six declared percentiles
    Numeric { percentiles: Percentiles },
}

impl Prediction {
    /// Binary prediction, clamped to [0.01, 0.99]
    pub fn binary(probability: f64) -> Self {
        Prediction::Binary {
            probability: probability.clamp(0.01, 0.99),
        }
    }

    /// Multiple-choice prediction, normalized so the masses sum to 1
    ///
    /// Returns `None` when the total mass is not positive.
    pub fn multiple_choice(mut options: Vec<OptionProbability>) -> Option<Self> {
        let total: f64 = options.iter().map(|o| o.probability.max(0.0)).sum();
        if total <= 0.0 || options.is_empty() {
            return None;
        }
        for o in &mut options {
            o.probability = o.probability.max(0.0) / total;
        }
        Some(Prediction::MultipleChoice { options })
    }

    pub fn numeric(percentiles: Percentiles) -> Self {
        Prediction::Numeric { percentiles }
    }

    /// The documented neutral default for each question kind:
    /// 0.5 for binary, uniform for multiple-choice, bound-spanning
    /// percentiles for numeric
    pub fn neutral(kind: &QuestionKind) -> Self {
        match kind {
            QuestionKind::Binary => Prediction::Binary { probability: 0.5 },
            QuestionKind::MultipleChoice { options } => {
                let mass = 1.0 / options.len() as f64;
                Prediction::MultipleChoice {
                    options: options
                        .iter()
                        .map(|o| OptionProbability::new(o.clone(), mass))
                        .collect(),
                }
            }
            QuestionKind::Numeric(range) => Prediction::Numeric {
                percentiles: Percentiles::spanning(range),
            },
        }
    }

    /// Flat view of the prediction as aligned numeric components
    fn components(&self) -> Vec<f64> {
        match self {
            Prediction::Binary { probability } => vec![*probability],
            Prediction::MultipleChoice { options } => {
                options.iter().map(|o| o.probability).collect()
            }
            Prediction::Numeric { percentiles } => percentiles.values.to_vec(),
        }
    }

    fn same_shape(&self, other: &Prediction) -> bool {
        match (self, other) {
            (Prediction::Binary { .. }, Prediction::Binary { .. }) => true,
            (
                Prediction::MultipleChoice { options: a },
                Prediction::MultipleChoice { options: b },
            ) => a.len() == b.len(),
            (Prediction::Numeric { .. }, Prediction::Numeric { .. }) => true,
            _ => false,
        }
    }

    /// Mean absolute difference over aligned components.
    ///
    /// Shape mismatch yields infinity so a mismatched prediction is never
    /// selected as representative.
    pub fn distance(&self, other: &Prediction) -> f64 {
        if !self.same_shape(other) {
            return f64::INFINITY;
        }
        let a = self.components();
        let b = other.components();
        let n = a.len();
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .sum::<f64>()
            / n as f64
    }

    /// Component-wise median of a set of same-shape predictions.
    ///
    /// With an even count each component is the average of the two middle
    /// values. Used only as the reference point for representative
    /// selection; option masses are not renormalized.
    pub fn component_median(predictions: &[Prediction]) -> Option<Prediction> {
        let first = predictions.first()?;
        if !predictions.iter().all(|p| first.same_shape(p)) {
            return None;
        }
        let n = first.components().len();
        let mut medians = Vec::with_capacity(n);
        for i in 0..n {
            let mut column: Vec<f64> = predictions.iter().map(|p| p.components()[i]).collect();
            column.sort_by(|a, b| a.total_cmp(b));
            let mid = column.len() / 2;
            let median = if column.len() % 2 == 0 {
                (column[mid - 1] + column[mid]) / 2.0
            } else {
                column[mid]
            };
            medians.push(median);
        }
        Some(first.rebuild(&medians))
    }

    /// Arithmetic mean of a set of same-shape predictions.
    ///
    /// Binary: mean probability. Numeric: per-percentile mean.
    /// Multiple-choice: normalized probability-mass average.
    pub fn mean(predictions: &[Prediction]) -> Option<Prediction> {
        let first = predictions.first()?;
        if !predictions.iter().all(|p| first.same_shape(p)) {
            return None;
        }
        let n = first.components().len();
        let count = predictions.len() as f64;
        let mut means = vec![0.0; n];
        for p in predictions {
            for (i, c) in p.components().iter().enumerate() {
                means[i] += c / count;
            }
        }
        let mean = first.rebuild(&means);
        // Renormalize option masses after averaging
        if let Prediction::MultipleChoice { options } = mean {
            Prediction::multiple_choice(options)
        } else {
            Some(mean)
        }
    }

    /// Rebuild a prediction of this shape from raw component values
    fn rebuild(&self, components: &[f64]) -> Prediction {
        match self {
            Prediction::Binary { .. } => Prediction::Binary {
                probability: components[0],
            },
            Prediction::MultipleChoice { options } => Prediction::MultipleChoice {
                options: options
                    .iter()
                    .zip(components.iter())
                    .map(|(o, c)| OptionProbability::new(o.option.clone(), *c))
                    .collect(),
            },
            Prediction::Numeric { .. } => {
                let mut values = [0.0; 6];
                values.copy_from_slice(components);
                Prediction::Numeric {
                    percentiles: Percentiles { values },
                }
            }
        }
    }

    /// Short human-readable summary for logs and reports
    pub fn summary(&self) -> String {
        match self {
            Prediction::Binary { probability } => format!("{:.1}%", probability * 100.0),
            Prediction::MultipleChoice { options } => options
                .iter()
                .map(|o| format!("{}: {:.1}%", o.option, o.probability * 100.0))
                .collect::<Vec<_>>()
                .join(", "),
            Prediction::Numeric { percentiles } => PERCENTILE_LEVELS
                .iter()
                .zip(percentiles.values.iter())
                .map(|(l, v)| format!("p{}: {}", l, v))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}
