//! Ensemble use case: the forecaster panel
//!
//! Every identity forecasts concurrently; within an identity, runs are
//! sequential so each run's prompt can carry a distinct run note. Failed
//! runs stay in the audit trail. An identity with at least one
//! successful run contributes its median-representative output; one with
//! none is dropped and recorded by name.

use crate::config::PanelConfig;
use crate::fallback::FallbackChain;
use crate::ports::model_invoker::ModelInvoker;
use crate::use_cases::extract::extract_prediction;
use foresight_domain::{
    ForecasterRun, IdentityOutcome, PromptTemplate, Question, select_representative,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// The panel's collective output
#[derive(Debug, Clone)]
pub struct EnsembleOutcome {
    /// Surviving identities, in panel order
    pub outcomes: Vec<IdentityOutcome>,
    /// Identities with no successful run, in panel order
    pub dropped: Vec<String>,
}

/// Use case for running the forecaster panel
pub struct RunEnsemble {
    invoker: Arc<dyn ModelInvoker>,
    panel: PanelConfig,
}

impl RunEnsemble {
    pub fn new(invoker: Arc<dyn ModelInvoker>, panel: PanelConfig) -> Self {
        Self { invoker, panel }
    }

    pub async fn execute(&self, question: &Question, research_brief: &str) -> EnsembleOutcome {
        let total_runs = self.panel.runs_per_identity;
        let mut join_set = JoinSet::new();
        for (index, identity) in self.panel.identities.iter().enumerate() {
            let invoker = Arc::clone(&self.invoker);
            let name = identity.name.clone();
            let chain = identity.chain.clone();
            let question = question.clone();
            let brief = research_brief.to_string();
            join_set.spawn(async move {
                let runs =
                    run_identity(invoker.as_ref(), &name, &chain, &question, &brief, total_runs)
                        .await;
                (index, name, runs)
            });
        }

        // Collect and restore panel order before selecting representatives
        let mut finished: Vec<(usize, String, Vec<ForecasterRun>)> = Vec::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(entry) => finished.push(entry),
                Err(e) => warn!("task join error: {}", e),
            }
        }
        finished.sort_by_key(|(index, _, _)| *index);

        let mut outcomes = Vec::new();
        let mut dropped = Vec::new();
        for (_, name, runs) in finished {
            match select_representative(&runs) {
                Some(representative) => {
                    let prediction = representative
                        .prediction
                        .clone()
                        .unwrap_or_else(|| unreachable!("representative run has a prediction"));
                    info!(
                        identity = %name,
                        model = %representative.model,
                        prediction = %prediction.summary(),
                        "identity produced a forecast"
                    );
                    outcomes.push(IdentityOutcome {
                        identity: name,
                        model: representative.model.clone(),
                        prediction,
                        reasoning: representative.reasoning.clone(),
                        runs,
                    });
                }
                None => {
                    warn!(identity = %name, "no successful run; dropping identity");
                    dropped.push(name);
                }
            }
        }
        EnsembleOutcome { outcomes, dropped }
    }
}

/// Run one identity's full run budget sequentially
async fn run_identity(
    invoker: &dyn ModelInvoker,
    name: &str,
    chain: &FallbackChain,
    question: &Question,
    research_brief: &str,
    total_runs: usize,
) -> Vec<ForecasterRun> {
    let base_prompt = PromptTemplate::forecast_prompt(question, research_brief);
    let mut runs = Vec::with_capacity(total_runs);
    for run_index in 0..total_runs {
        let mut prompt = base_prompt.clone();
        if total_runs > 1 {
            prompt.push_str(&PromptTemplate::run_note(run_index, total_runs));
        }
        let run = match chain.invoke(invoker, &prompt).await {
            Ok(response) => {
                match extract_prediction(invoker, chain, &question.kind, &response.text).await {
                    Ok(prediction) => ForecasterRun::success(
                        name,
                        run_index,
                        response.model.as_str(),
                        response.text,
                        prediction,
                    ),
                    Err(e) => ForecasterRun::failure(
                        name,
                        run_index,
                        response.model.as_str(),
                        // The reasoning is kept even when extraction fails
                        response.text,
                        format!("prediction extraction failed: {}", e),
                    ),
                }
            }
            // No model answered; the error text already enumerates every
            // attempted model, so the run carries no model of its own
            Err(e) => ForecasterRun::failure(name, run_index, "", "", e.to_string()),
        };
        runs.push(run);
    }
    runs
}
