//! End-to-end pipeline for one question
//!
//! Wires the stages together: query generation, research, the ensemble,
//! and synthesis. The pipeline holds a question permit for its whole
//! duration and governs every model call through the shared limits, so
//! callers can fan many questions out safely.

use crate::config::PipelineConfig;
use crate::limits::{ConcurrencyLimits, GovernedInvoker};
use crate::ports::model_invoker::ModelInvoker;
use crate::ports::search_provider::SearchProvider;
use crate::use_cases::generate_queries::GenerateQueries;
use crate::use_cases::run_ensemble::RunEnsemble;
use crate::use_cases::run_research::RunResearch;
use crate::use_cases::synthesize::Synthesize;
use foresight_domain::{EnsembleResult, FinalMethod, Prediction, Question};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Construction-time pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("the forecaster panel must contain at least one identity")]
    EmptyPanel,
}

/// The ensemble forecasting pipeline
pub struct ForecastPipeline {
    invoker: Arc<dyn ModelInvoker>,
    sources: Vec<Arc<dyn SearchProvider>>,
    limits: ConcurrencyLimits,
    config: PipelineConfig,
}

impl ForecastPipeline {
    /// Build the pipeline, wrapping the invoker in the model-call gate
    pub fn new(
        invoker: Arc<dyn ModelInvoker>,
        sources: Vec<Arc<dyn SearchProvider>>,
        limits: ConcurrencyLimits,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        if config.panel.identities.is_empty() {
            return Err(PipelineError::EmptyPanel);
        }
        let governed: Arc<dyn ModelInvoker> =
            Arc::new(GovernedInvoker::new(invoker, limits.clone()));
        Ok(Self {
            invoker: governed,
            sources,
            limits,
            config,
        })
    }

    /// Forecast one question end to end.
    ///
    /// Infallible by design: every degradation path ends in a well-typed
    /// result whose method records what happened.
    pub async fn forecast(&self, question: &Question) -> EnsembleResult {
        let _question_permit = self.limits.acquire_question().await;
        info!(question = %question.id, title = %question.title, "forecasting question");

        let queries = GenerateQueries::new(
            Arc::clone(&self.invoker),
            self.config.utility_chain.clone(),
            self.config.research.clone(),
        )
        .execute(question)
        .await;

        let research = RunResearch::new(
            Arc::clone(&self.invoker),
            self.config.utility_chain.clone(),
            self.sources.clone(),
            self.config.research.clone(),
        )
        .execute(question, queries)
        .await;

        let ensemble = RunEnsemble::new(Arc::clone(&self.invoker), self.config.panel.clone())
            .execute(question, &research.brief)
            .await;

        if ensemble.outcomes.is_empty() {
            warn!(question = %question.id, "every identity failed; using the neutral default");
            return EnsembleResult::new(
                question.id.clone(),
                question.title.clone(),
                Prediction::neutral(&question.kind),
                FinalMethod::NeutralDefault,
                "All forecasters failed; defaulting to the neutral prediction \
                 for this question kind.",
                vec![],
                ensemble.dropped,
            );
        }

        let synthesis = Synthesize::new(
            Arc::clone(&self.invoker),
            self.config.synthesis_chain.clone(),
        )
        .execute(question, &ensemble.outcomes)
        .await;

        info!(
            question = %question.id,
            method = synthesis.method.label(),
            prediction = %synthesis.prediction.summary(),
            "question forecast complete"
        );
        EnsembleResult::new(
            question.id.clone(),
            question.title.clone(),
            synthesis.prediction,
            synthesis.method,
            synthesis.reasoning,
            ensemble.outcomes,
            ensemble.dropped,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IdentityConfig, PanelConfig, ResearchConfig};
    use crate::fallback::FallbackChain;
    use crate::testing::{ScriptedInvoker, StaticSource};
    use foresight_domain::{EvidenceRecord, Model, QuestionKind};

    fn question() -> Question {
        Question::new("q1", "Will the treaty be ratified?", QuestionKind::Binary).unwrap()
    }

    fn chain(id: &str) -> FallbackChain {
        FallbackChain::new(vec![Model::Custom(id.to_string())]).unwrap()
    }

    fn config(identities: Vec<IdentityConfig>) -> PipelineConfig {
        PipelineConfig {
            panel: PanelConfig::new(identities),
            research: ResearchConfig::default(),
            utility_chain: chain("util"),
            synthesis_chain: chain("synth"),
        }
    }

    fn panel_of_four() -> Vec<IdentityConfig> {
        vec![
            IdentityConfig::new("f1", chain("m1")),
            IdentityConfig::new("f2", chain("m2")),
            IdentityConfig::new("f3", chain("m3")),
            IdentityConfig::new("f4", chain("m4")),
        ]
    }

    #[test]
    fn test_empty_panel_rejected() {
        let invoker = Arc::new(ScriptedInvoker::new());
        let result = ForecastPipeline::new(
            invoker,
            vec![],
            ConcurrencyLimits::default(),
            config(vec![]),
        );
        assert!(matches!(result, Err(PipelineError::EmptyPanel)));
    }

    #[tokio::test]
    async fn test_forced_synthesis_failure_averages_four_identities() {
        // Four identities answer 30/40/60/70; the synthesis model is
        // down. The final prediction must be the arithmetic mean 0.5,
        // with every identity's reasoning in the provenance text.
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .respond_model("util", "treaty ratification votes; senate schedule")
                .respond_model("m1", "Skeptical view.\nProbability: 30%")
                .respond_model("m2", "Cautious view.\nProbability: 40%")
                .respond_model("m3", "Favorable view.\nProbability: 60%")
                .respond_model("m4", "Confident view.\nProbability: 70%")
                .fail_model("synth", "provider down"),
        );
        let sources: Vec<Arc<dyn SearchProvider>> = vec![Arc::new(StaticSource::with_records(
            "wire",
            vec![
                EvidenceRecord::new("Vote scheduled", "The vote is next week.", "wire", "")
                    .with_url("https://news.example/vote"),
            ],
        ))];
        let pipeline = ForecastPipeline::new(
            invoker,
            sources,
            ConcurrencyLimits::default(),
            config(panel_of_four()),
        )
        .unwrap();

        let result = pipeline.forecast(&question()).await;
        let Prediction::Binary { probability } = &result.prediction else {
            panic!("wrong prediction shape");
        };
        assert!((probability - 0.5).abs() < 1e-9);
        assert_eq!(result.method, FinalMethod::AveragingFallback);
        assert!(result.is_degraded());
        for identity in ["f1", "f2", "f3", "f4"] {
            assert!(result.combined_reasoning.contains(identity));
        }
        assert!(result.combined_reasoning.contains("fallback: averaging"));
        assert!(result.dropped_identities.is_empty());
    }

    #[tokio::test]
    async fn test_all_identities_failed_yields_neutral_default() {
        let invoker = Arc::new(
            ScriptedInvoker::new().respond_model("util", "some query; another query"),
        );
        let pipeline = ForecastPipeline::new(
            invoker,
            vec![],
            ConcurrencyLimits::default(),
            config(panel_of_four()),
        )
        .unwrap();

        let result = pipeline.forecast(&question()).await;
        assert_eq!(result.prediction, Prediction::Binary { probability: 0.5 });
        assert_eq!(result.method, FinalMethod::NeutralDefault);
        assert!(result.is_degraded());
        assert_eq!(result.dropped_identities.len(), 4);
        assert!(result.combined_reasoning.contains("no successful runs"));
    }

    #[tokio::test]
    async fn test_successful_synthesis_end_to_end() {
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .respond_model("util", "ratification timeline; opposition votes")
                .respond_model("m1", "Analysis.\nProbability: 40%")
                .respond_model("m2", "Analysis.\nProbability: 60%")
                .respond_model("m3", "Analysis.\nProbability: 55%")
                .respond_model("m4", "Analysis.\nProbability: 45%")
                .respond_model("synth", r#"Reconciled. {"probability": 0.52}"#),
        );
        let pipeline = ForecastPipeline::new(
            invoker,
            vec![],
            ConcurrencyLimits::default(),
            config(panel_of_four()),
        )
        .unwrap();

        let result = pipeline.forecast(&question()).await;
        assert_eq!(result.prediction, Prediction::Binary { probability: 0.52 });
        assert_eq!(
            result.method,
            FinalMethod::Synthesis {
                model: "synth".to_string()
            }
        );
        assert!(!result.is_degraded());
        assert_eq!(result.outcomes.len(), 4);
    }

    #[tokio::test]
    async fn test_pipeline_runs_under_tight_limits() {
        // Capacity 1 on both gates must not deadlock the pipeline
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .respond_model("util", "single query here")
                .respond_model("m1", "Probability: 50%")
                .respond_model("synth", r#"{"probability": 0.5}"#),
        );
        let pipeline = ForecastPipeline::new(
            invoker,
            vec![],
            ConcurrencyLimits::new(1, 1),
            config(vec![IdentityConfig::new("f1", chain("m1"))]),
        )
        .unwrap();
        let result = pipeline.forecast(&question()).await;
        assert_eq!(result.outcomes.len(), 1);
    }
}
