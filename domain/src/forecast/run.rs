//! Forecaster run records and representative selection
//!
//! Every invocation attempt produces a [`ForecasterRun`], failed ones
//! included, so the full audit trail of a question survives into the
//! result. When an identity runs more than once, the run whose prediction
//! sits closest to the component-wise median of its successful runs is
//! selected as the identity's representative output.

use crate::forecast::prediction::Prediction;
use serde::{Deserialize, Serialize};

/// One attempt by one forecaster identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecasterRun {
    /// Identity key (e.g., "forecaster2")
    pub identity: String,
    /// Zero-based run index within the identity
    pub run_index: usize,
    /// The model in the chain that actually answered; empty when the
    /// whole chain failed and no model produced text
    pub model: String,
    /// Raw reasoning text from the model
    pub reasoning: String,
    /// Extracted prediction; `None` when extraction failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Prediction>,
    /// Whether this run produced a usable prediction
    pub success: bool,
    /// Failure description for the audit trail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ForecasterRun {
    /// Record a successful run
    pub fn success(
        identity: impl Into<String>,
        run_index: usize,
        model: impl Into<String>,
        reasoning: impl Into<String>,
        prediction: Prediction,
    ) -> Self {
        Self {
            identity: identity.into(),
            run_index,
            model: model.into(),
            reasoning: reasoning.into(),
            prediction: Some(prediction),
            success: true,
            error: None,
        }
    }

    /// Record a failed run; kept for the audit trail, excluded from
    /// aggregation
    pub fn failure(
        identity: impl Into<String>,
        run_index: usize,
        model: impl Into<String>,
        reasoning: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.into(),
            run_index,
            model: model.into(),
            reasoning: reasoning.into(),
            prediction: None,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Select the representative run for an identity.
///
/// The representative is the successful run whose prediction minimizes
/// the distance to the component-wise median of all successful
/// predictions. Ties are broken by earliest run index. Returns `None`
/// when no run succeeded.
pub fn select_representative(runs: &[ForecasterRun]) -> Option<&ForecasterRun> {
    let successful: Vec<&ForecasterRun> = runs
        .iter()
        .filter(|r| r.success && r.prediction.is_some())
        .collect();

    let predictions: Vec<Prediction> = successful
        .iter()
        .filter_map(|r| r.prediction.clone())
        .collect();
    let median = Prediction::component_median(&predictions)?;

    let mut best: Option<(&ForecasterRun, f64)> = None;
    for run in successful {
        let Some(prediction) = &run.prediction else {
            continue;
        };
        let distance = prediction.distance(&median);
        // Strict comparison keeps the earliest run on ties
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((run, distance));
        }
    }
    best.map(|(run, _)| run)
}
