//! Synthesis use case
//!
//! One synthesis call reconciles the panel's representative forecasts
//! into the final prediction. When the synthesis chain fails, or its
//! answer cannot be parsed, the deterministic fallback is the arithmetic
//! mean of the individual predictions, and the result is labelled
//! accordingly.

use crate::fallback::FallbackChain;
use crate::ports::model_invoker::ModelInvoker;
use crate::use_cases::extract::extract_prediction;
use foresight_domain::{FinalMethod, IdentityOutcome, Prediction, PromptTemplate, Question};
use std::sync::Arc;
use tracing::{info, warn};

/// The synthesis step's output
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    pub prediction: Prediction,
    pub reasoning: String,
    pub method: FinalMethod,
}

/// Use case for reconciling the panel into one prediction
pub struct Synthesize {
    invoker: Arc<dyn ModelInvoker>,
    chain: FallbackChain,
}

impl Synthesize {
    pub fn new(invoker: Arc<dyn ModelInvoker>, chain: FallbackChain) -> Self {
        Self { invoker, chain }
    }

    /// Callers must pass at least one outcome; the all-failed case is the
    /// pipeline's neutral default, not synthesis.
    pub async fn execute(
        &self,
        question: &Question,
        outcomes: &[IdentityOutcome],
    ) -> SynthesisOutcome {
        let prompt = PromptTemplate::synthesis_prompt(question, outcomes);
        match self.chain.invoke(self.invoker.as_ref(), &prompt).await {
            Ok(response) => {
                match extract_prediction(
                    self.invoker.as_ref(),
                    &self.chain,
                    &question.kind,
                    &response.text,
                )
                .await
                {
                    Ok(prediction) => {
                        info!(
                            model = %response.model,
                            prediction = %prediction.summary(),
                            "synthesis produced the final prediction"
                        );
                        SynthesisOutcome {
                            prediction,
                            reasoning: response.text,
                            method: FinalMethod::Synthesis {
                                model: response.model.as_str().to_string(),
                            },
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "synthesis output unparseable; averaging instead");
                        self.average(outcomes)
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "synthesis chain failed; averaging instead");
                self.average(outcomes)
            }
        }
    }

    /// Deterministic fallback: arithmetic mean of the representatives
    fn average(&self, outcomes: &[IdentityOutcome]) -> SynthesisOutcome {
        let predictions: Vec<Prediction> =
            outcomes.iter().map(|o| o.prediction.clone()).collect();
        let prediction = match Prediction::mean(&predictions) {
            // Mixed shapes cannot be averaged; keep the first representative
            None => predictions
                .first()
                .cloned()
                .unwrap_or(Prediction::Binary { probability: 0.5 }),
            Some(p) => p,
        };
        info!(
            count = outcomes.len(),
            prediction = %prediction.summary(),
            "averaged individual forecasts"
        );
        SynthesisOutcome {
            prediction,
            reasoning: format!(
                "Synthesis was unavailable; this prediction is the deterministic \
                 average of {} individual forecasts.",
                outcomes.len()
            ),
            method: FinalMethod::AveragingFallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedInvoker;
    use foresight_domain::{Model, QuestionKind};

    fn question() -> Question {
        Question::new("q1", "Will the merger close?", QuestionKind::Binary).unwrap()
    }

    fn outcome(identity: &str, p: f64) -> IdentityOutcome {
        IdentityOutcome {
            identity: identity.to_string(),
            model: "m".to_string(),
            prediction: Prediction::Binary { probability: p },
            reasoning: format!("{} reasoning", identity),
            runs: vec![],
        }
    }

    fn synth_chain() -> FallbackChain {
        FallbackChain::new(vec![Model::Custom("synth".to_string())]).unwrap()
    }

    #[tokio::test]
    async fn test_successful_synthesis() {
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .respond_model("synth", r#"Weighing the arguments. {"probability": 0.45}"#),
        );
        let outcomes = vec![outcome("f1", 0.3), outcome("f2", 0.6)];
        let result = Synthesize::new(invoker, synth_chain())
            .execute(&question(), &outcomes)
            .await;
        assert_eq!(result.prediction, Prediction::Binary { probability: 0.45 });
        assert_eq!(
            result.method,
            FinalMethod::Synthesis {
                model: "synth".to_string()
            }
        );
        assert!(result.reasoning.contains("Weighing"));
    }

    #[tokio::test]
    async fn test_chain_failure_falls_back_to_mean() {
        let invoker = Arc::new(ScriptedInvoker::new().fail_model("synth", "provider down"));
        let outcomes = vec![outcome("f1", 0.2), outcome("f2", 0.6)];
        let result = Synthesize::new(invoker, synth_chain())
            .execute(&question(), &outcomes)
            .await;
        assert_eq!(result.prediction, Prediction::Binary { probability: 0.4 });
        assert_eq!(result.method, FinalMethod::AveragingFallback);
        assert!(result.reasoning.contains("average of 2"));
    }

    #[tokio::test]
    async fn test_unparseable_synthesis_falls_back_to_mean() {
        let invoker =
            Arc::new(ScriptedInvoker::new().respond_model("synth", "It is hard to say."));
        let outcomes = vec![outcome("f1", 0.3), outcome("f2", 0.5)];
        let result = Synthesize::new(invoker, synth_chain())
            .execute(&question(), &outcomes)
            .await;
        assert_eq!(result.prediction, Prediction::Binary { probability: 0.4 });
        assert_eq!(result.method, FinalMethod::AveragingFallback);
    }
}
