//! Two-stage prediction extraction
//!
//! Stage one asks the chain to restate the forecast as schema-validated
//! JSON. Only when that whole sub-chain fails does stage two scan the
//! raw reasoning text for the documented output patterns. The stages are
//! strictly ordered so a well-formed JSON answer always wins over a
//! coincidental pattern match in the prose.

use crate::fallback::FallbackChain;
use crate::ports::model_invoker::{InvokeParams, ModelInvoker};
use foresight_domain::{
    OptionProbability, PERCENTILE_LEVELS, ParseError, Percentiles, Prediction, PromptTemplate,
    QuestionKind, extract_option_probabilities, extract_percentiles, extract_probability,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct BinaryExtraction {
    probability: f64,
}

#[derive(Deserialize)]
struct ChoiceExtraction {
    probabilities: HashMap<String, f64>,
}

#[derive(Deserialize)]
struct NumericExtraction {
    percentiles: HashMap<String, f64>,
}

/// Extract a prediction from free-form reasoning text.
///
/// The JSON sub-call runs at temperature zero down the identity's own
/// chain; pattern matching on `reasoning` is the fallback.
pub async fn extract_prediction(
    invoker: &dyn ModelInvoker,
    chain: &FallbackChain,
    kind: &QuestionKind,
    reasoning: &str,
) -> Result<Prediction, ParseError> {
    match structured_stage(invoker, chain, kind, reasoning).await {
        Some(prediction) => Ok(prediction),
        None => {
            debug!("structured extraction failed; falling back to pattern matching");
            pattern_stage(kind, reasoning)
        }
    }
}

/// Stage one: schema-validated JSON via a secondary model call
async fn structured_stage(
    invoker: &dyn ModelInvoker,
    chain: &FallbackChain,
    kind: &QuestionKind,
    reasoning: &str,
) -> Option<Prediction> {
    let chain = chain.clone().with_params(InvokeParams::deterministic());
    let chain = &chain;
    let prompt = PromptTemplate::extraction_prompt(kind, reasoning);
    match kind {
        QuestionKind::Binary => {
            let (_, extracted) = chain
                .invoke_structured::<BinaryExtraction>(invoker, &prompt)
                .await
                .ok()?;
            if !(0.0..=1.0).contains(&extracted.probability) {
                warn!(
                    probability = extracted.probability,
                    "extracted probability out of range; discarding"
                );
                return None;
            }
            Some(Prediction::binary(extracted.probability))
        }
        QuestionKind::MultipleChoice { options } => {
            let (_, extracted) = chain
                .invoke_structured::<ChoiceExtraction>(invoker, &prompt)
                .await
                .ok()?;
            // Every declared option must be present, in declared order
            let mut masses = Vec::with_capacity(options.len());
            for option in options {
                let mass = *extracted.probabilities.get(option)?;
                masses.push(OptionProbability::new(option.clone(), mass));
            }
            Prediction::multiple_choice(masses)
        }
        QuestionKind::Numeric(_) => {
            let (_, extracted) = chain
                .invoke_structured::<NumericExtraction>(invoker, &prompt)
                .await
                .ok()?;
            let mut values = [0.0; 6];
            for (i, level) in PERCENTILE_LEVELS.iter().enumerate() {
                values[i] = *extracted.percentiles.get(&level.to_string())?;
            }
            let percentiles = Percentiles::new(values).ok()?;
            Some(Prediction::numeric(percentiles))
        }
    }
}

/// Stage two: scan the reasoning text for the documented output patterns
fn pattern_stage(kind: &QuestionKind, reasoning: &str) -> Result<Prediction, ParseError> {
    match kind {
        QuestionKind::Binary => extract_probability(reasoning),
        QuestionKind::MultipleChoice { options } => {
            extract_option_probabilities(reasoning, options)
        }
        QuestionKind::Numeric(_) => extract_percentiles(reasoning),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedInvoker;
    use foresight_domain::Model;

    fn chain() -> FallbackChain {
        FallbackChain::new(vec![Model::Custom("ext".to_string())]).unwrap()
    }

    #[tokio::test]
    async fn test_structured_stage_wins_over_pattern() {
        // Reasoning contains "Probability: 30%" but the JSON call answers
        // 0.8; the structured value must win.
        let invoker = ScriptedInvoker::new().respond_model("ext", r#"{"probability": 0.8}"#);
        let prediction = extract_prediction(
            &invoker,
            &chain(),
            &QuestionKind::Binary,
            "Base rates...\nProbability: 30%",
        )
        .await
        .unwrap();
        assert_eq!(prediction, Prediction::Binary { probability: 0.8 });
    }

    #[tokio::test]
    async fn test_pattern_stage_used_when_structured_fails() {
        let invoker = ScriptedInvoker::new().fail_model("ext", "provider down");
        let prediction = extract_prediction(
            &invoker,
            &chain(),
            &QuestionKind::Binary,
            "Base rates...\nProbability: 30%",
        )
        .await
        .unwrap();
        assert_eq!(prediction, Prediction::Binary { probability: 0.3 });
    }

    #[tokio::test]
    async fn test_both_stages_fail() {
        let invoker = ScriptedInvoker::new().fail_model("ext", "provider down");
        let result = extract_prediction(
            &invoker,
            &chain(),
            &QuestionKind::Binary,
            "I have no idea.",
        )
        .await;
        assert_eq!(result, Err(ParseError::NoMatch("probability")));
    }

    #[tokio::test]
    async fn test_out_of_range_structured_value_discarded() {
        let invoker = ScriptedInvoker::new().respond_model("ext", r#"{"probability": 42.0}"#);
        let prediction = extract_prediction(
            &invoker,
            &chain(),
            &QuestionKind::Binary,
            "Probability: 55%",
        )
        .await
        .unwrap();
        assert_eq!(prediction, Prediction::Binary { probability: 0.55 });
    }

    #[tokio::test]
    async fn test_choice_extraction_requires_every_option() {
        let kind = QuestionKind::MultipleChoice {
            options: vec!["Red".to_string(), "Blue".to_string()],
        };
        // JSON is missing "Blue"; the pattern stage finds both lines
        let invoker =
            ScriptedInvoker::new().respond_model("ext", r#"{"probabilities": {"Red": 0.9}}"#);
        let prediction = extract_prediction(
            &invoker,
            &chain(),
            &kind,
            "Red: 70%\nBlue: 30%",
        )
        .await
        .unwrap();
        let Prediction::MultipleChoice { options } = prediction else {
            panic!("wrong shape");
        };
        assert!((options[0].probability - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_numeric_extraction_from_json() {
        let kind = QuestionKind::Numeric(foresight_domain::NumericRange::new(0.0, 10_000.0));
        let json = r#"{"percentiles": {"10": 100, "20": 200, "40": 400,
                        "60": 600, "80": 800, "90": 900}}"#;
        let invoker = ScriptedInvoker::new().respond_model("ext", json);
        let prediction = extract_prediction(&invoker, &chain(), &kind, "reasoning")
            .await
            .unwrap();
        let Prediction::Numeric { percentiles } = prediction else {
            panic!("wrong shape");
        };
        assert_eq!(percentiles.value_at(40), Some(400.0));
    }
}
