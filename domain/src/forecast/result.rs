//! Ensemble result value objects - immutable outputs of a forecasting pass
//!
//! - [`IdentityOutcome`] - one identity's representative prediction plus its audit trail
//! - [`FinalMethod`] - how the final prediction was produced (and whether it degraded)
//! - [`EnsembleResult`] - the externally visible output with full provenance

use crate::forecast::prediction::Prediction;
use crate::forecast::run::ForecasterRun;
use serde::{Deserialize, Serialize};

/// Representative output of one forecaster identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityOutcome {
    /// Identity key (e.g., "forecaster2")
    pub identity: String,
    /// The model that produced the representative run
    pub model: String,
    /// Representative prediction (median-selected across runs)
    pub prediction: Prediction,
    /// Representative reasoning text
    pub reasoning: String,
    /// Every attempt made by this identity, failures included
    pub runs: Vec<ForecasterRun>,
}

/// How the final prediction was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum FinalMethod {
    /// A synthesis model reconciled the panel
    Synthesis { model: String },
    /// Synthesis failed; the surviving predictions were averaged
    AveragingFallback,
    /// Every identity failed; the documented neutral default was used
    NeutralDefault,
}

impl FinalMethod {
    /// Whether this result came from a documented fallback path
    pub fn is_degraded(&self) -> bool {
        !matches!(self, FinalMethod::Synthesis { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            FinalMethod::Synthesis { .. } => "synthesis",
            FinalMethod::AveragingFallback => "averaging_fallback",
            FinalMethod::NeutralDefault => "neutral_default",
        }
    }
}

/// Complete result of one forecasting pass
///
/// Owns copies of everything it aggregates; nothing is mutated after
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleResult {
    /// Question identifier
    pub question_id: String,
    /// Question text
    pub question_title: String,
    /// The final prediction
    pub prediction: Prediction,
    /// How the final prediction was produced
    pub method: FinalMethod,
    /// Reasoning emitted by the synthesis step (or the fallback notice)
    pub synthesis_reasoning: String,
    /// Surviving identities, in panel order
    pub outcomes: Vec<IdentityOutcome>,
    /// Identities dropped because none of their runs succeeded
    pub dropped_identities: Vec<String>,
    /// Full provenance text: every surviving identity's label, model and
    /// reasoning in order, followed by the synthesis reasoning
    pub combined_reasoning: String,
}

impl EnsembleResult {
    /// Assemble the result, composing the provenance text
    pub fn new(
        question_id: impl Into<String>,
        question_title: impl Into<String>,
        prediction: Prediction,
        method: FinalMethod,
        synthesis_reasoning: impl Into<String>,
        outcomes: Vec<IdentityOutcome>,
        dropped_identities: Vec<String>,
    ) -> Self {
        let synthesis_reasoning = synthesis_reasoning.into();
        let combined_reasoning =
            compose_provenance(&outcomes, &dropped_identities, &synthesis_reasoning, &method);
        Self {
            question_id: question_id.into(),
            question_title: question_title.into(),
            prediction,
            method,
            synthesis_reasoning,
            outcomes,
            dropped_identities,
            combined_reasoning,
        }
    }

    /// Whether any documented fallback path was taken
    pub fn is_degraded(&self) -> bool {
        self.method.is_degraded() || !self.dropped_identities.is_empty()
    }

    /// Render a markdown report for the publishing collaborator
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# Forecast: {}\n\n", self.question_title));
        out.push_str(&format!(
            "**Final prediction** ({}): {}\n\n",
            self.method.label(),
            self.prediction.summary()
        ));
        if self.is_degraded() {
            out.push_str("**Degraded result**: ");
            match &self.method {
                FinalMethod::NeutralDefault => {
                    out.push_str("all forecasters failed; neutral default used.\n\n");
                }
                FinalMethod::AveragingFallback => {
                    out.push_str("synthesis failed; individual forecasts were averaged.\n\n");
                }
                FinalMethod::Synthesis { .. } => {
                    out.push_str(&format!(
                        "identities dropped: {}.\n\n",
                        self.dropped_identities.join(", ")
                    ));
                }
            }
        }
        if !self.outcomes.is_empty() {
            out.push_str("| Identity | Model | Prediction |\n|---|---|---|\n");
            for o in &self.outcomes {
                out.push_str(&format!(
                    "| {} | {} | {} |\n",
                    o.identity,
                    o.model,
                    o.prediction.summary()
                ));
            }
            out.push('\n');
        }
        out.push_str(&self.combined_reasoning);
        out
    }
}

/// Build the combined reasoning text.
///
/// Order is a hard requirement: each surviving identity's label, bound
/// model and representative reasoning first, then the synthesis (or
/// fallback) reasoning.
fn compose_provenance(
    outcomes: &[IdentityOutcome],
    dropped: &[String],
    synthesis_reasoning: &str,
    method: &FinalMethod,
) -> String {
    let mut text = String::new();
    for outcome in outcomes {
        text.push_str(&format!(
            "## {} ({})\nPrediction: {}\n\n{}\n\n",
            outcome.identity,
            outcome.model,
            outcome.prediction.summary(),
            outcome.reasoning
        ));
    }
    for identity in dropped {
        text.push_str(&format!(
            "## {}\nDropped: no successful runs for this question.\n\n",
            identity
        ));
    }
    let heading = match method {
        FinalMethod::Synthesis { model } => format!("## Synthesis ({})", model),
        FinalMethod::AveragingFallback => "## Synthesis (fallback: averaging)".to_string(),
        FinalMethod::NeutralDefault => "## Synthesis (fallback: neutral default)".to_string(),
    };
    text.push_str(&format!("{}\n{}\n", heading, synthesis_reasoning));
    text
}
