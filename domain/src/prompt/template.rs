//! Prompt templates for the forecasting flow
//!
//! All prompt text lives here so the output-format contracts stay next to
//! the parsers that depend on them (see [`crate::forecast::parsing`]).

use crate::core::question::{Question, QuestionKind};
use crate::forecast::prediction::PERCENTILE_LEVELS;
use crate::forecast::result::IdentityOutcome;
use crate::research::evidence::EvidenceRecord;

/// Delimiter the query-generation strategies are instructed to use
pub const QUERY_DELIMITER: char = ';';

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Render the question with all its context blocks
    fn question_block(question: &Question) -> String {
        let mut block = format!("Question: {}\n", question.title);
        if !question.background.is_empty() {
            block.push_str(&format!("\nBackground:\n{}\n", question.background));
        }
        if !question.resolution_criteria.is_empty() {
            block.push_str(&format!(
                "\nResolution criteria:\n{}\n",
                question.resolution_criteria
            ));
        }
        if let Some(fine_print) = &question.fine_print {
            block.push_str(&format!("\nFine print:\n{}\n", fine_print));
        }
        block
    }

    // -- Query generation strategies --------------------------------------

    /// Strategy 1: direct expansion of the question into search terms
    pub fn query_direct(question: &Question, count: usize) -> String {
        format!(
            r#"You are generating web search queries to research a forecasting question.

{}

Generate exactly {} short search queries that would surface the most useful
recent evidence for this question. Cover different angles.

Return ONLY the queries, separated by semicolons, with no numbering and no quotes."#,
            Self::question_block(question),
            count
        )
    }

    /// Strategy 2: decompose into sub-questions, then query each
    pub fn query_decompose(question: &Question, count: usize) -> String {
        format!(
            r#"You are researching a forecasting question by decomposition.

{}

First think of the key sub-questions whose answers determine the outcome.
Then write exactly {} short search queries, one per sub-question, that would
answer them.

Return ONLY the queries, separated by semicolons, with no numbering and no quotes."#,
            Self::question_block(question),
            count
        )
    }

    /// Strategy 3: recent trends and base rates
    pub fn query_trends(question: &Question, count: usize) -> String {
        format!(
            r#"You are researching recent trends relevant to a forecasting question.

{}

Write exactly {} short search queries focused on recent developments,
historical base rates, and expert commentary relevant to this question.

Return ONLY the queries, separated by semicolons, with no numbering and no quotes."#,
            Self::question_block(question),
            count
        )
    }

    // -- Relevance rating --------------------------------------------------

    /// Score one evidence record against the question on the 1-6 scale
    pub fn relevance_prompt(question: &Question, record: &EvidenceRecord) -> String {
        format!(
            r#"Rate how relevant the following search result is to the forecasting question.

{}

Search result:
Title: {}
Content: {}

Scale:
6 = directly answers or strongly informs the question
5 = highly relevant context
4 = somewhat relevant
3 = tangentially related
2 = barely related
1 = irrelevant, or the content is an error page / unreachable / technical noise

If the content looks like an error message, a blocked page, or scraping
failure text, score it 1.

Respond with a single digit from 1 to 6 and nothing else."#,
            Self::question_block(question),
            record.title,
            record.summary
        )
    }

    // -- Summarization -----------------------------------------------------

    /// Compress the top evidence into a bounded research brief
    pub fn summary_prompt(
        question: &Question,
        records: &[EvidenceRecord],
        word_budget: usize,
    ) -> String {
        let mut prompt = format!(
            r#"Summarize the following research for a forecaster.

{}

Evidence:
"#,
            Self::question_block(question)
        );
        for (i, record) in records.iter().enumerate() {
            prompt.push_str(&format!(
                "\n--- [{}] {} (source: {}{})\n{}\n",
                i + 1,
                record.title,
                record.source,
                record
                    .published
                    .as_deref()
                    .map(|d| format!(", {}", d))
                    .unwrap_or_default(),
                record.summary
            ));
        }
        prompt.push_str(&format!(
            r#"
Write a research brief of at most {} words. Preserve every fact that is
material to the resolution criteria, including dates and numbers. Note
where sources disagree. Do not add information that is not in the evidence."#,
            word_budget
        ));
        prompt
    }

    // -- Forecasting -------------------------------------------------------

    /// The distinguishing instruction appended to each extra run
    pub fn run_note(run_index: usize, total_runs: usize) -> String {
        format!(
            "\n\nRun {}/{}: consider aspects of the question you might otherwise \
             overlook, and reason independently of any previous attempt.",
            run_index + 1,
            total_runs
        )
    }

    /// Question-kind-specific reasoning prompt with the fixed output format
    pub fn forecast_prompt(question: &Question, research_brief: &str) -> String {
        let format_contract = match &question.kind {
            QuestionKind::Binary => r#"End your answer with a single line in exactly this format:
Probability: NN%"#
                .to_string(),
            QuestionKind::MultipleChoice { options } => {
                let lines: Vec<String> =
                    options.iter().map(|o| format!("{}: NN%", o)).collect();
                format!(
                    "End your answer with one line per option, in exactly this format, \
                     with the percentages summing to 100:\n{}",
                    lines.join("\n")
                )
            }
            QuestionKind::Numeric(range) => {
                let lines: Vec<String> = PERCENTILE_LEVELS
                    .iter()
                    .map(|l| format!("Percentile {}: value", l))
                    .collect();
                let unit = range
                    .unit
                    .as_deref()
                    .map(|u| format!(" Values are in {}.", u))
                    .unwrap_or_default();
                format!(
                    "The value is bounded by [{}, {}] (lower {}, upper {}).{}\n\
                     End your answer with six lines, monotonically non-decreasing, \
                     in exactly this format:\n{}",
                    range.lower,
                    range.upper,
                    if range.open_lower { "open" } else { "closed" },
                    if range.open_upper { "open" } else { "closed" },
                    unit,
                    lines.join("\n")
                )
            }
        };
        format!(
            r#"You are a professional forecaster preparing a calibrated prediction.

{}

Research brief:
{}

Reason step by step:
1. What the status quo outcome would be if nothing changed.
2. Relevant base rates and reference classes.
3. The strongest considerations for and against.
4. How recent evidence updates your view.

Good forecasters put extra weight on the status quo, since the world
changes slowly most of the time.

{}"#,
            Self::question_block(question),
            research_brief,
            format_contract
        )
    }

    /// Secondary call: convert free-form reasoning into schema-validated JSON
    pub fn extraction_prompt(kind: &QuestionKind, reasoning: &str) -> String {
        let schema = match kind {
            QuestionKind::Binary => r#"{"probability": 0.NN}"#.to_string(),
            QuestionKind::MultipleChoice { options } => {
                let fields: Vec<String> =
                    options.iter().map(|o| format!(r#""{}": 0.NN"#, o)).collect();
                format!(r#"{{"probabilities": {{{}}}}}"#, fields.join(", "))
            }
            QuestionKind::Numeric(_) => {
                let fields: Vec<String> = PERCENTILE_LEVELS
                    .iter()
                    .map(|l| format!(r#""{}": value"#, l))
                    .collect();
                format!(r#"{{"percentiles": {{{}}}}}"#, fields.join(", "))
            }
        };
        format!(
            r#"Extract the final prediction from the forecast below.

Forecast:
{}

Respond with ONLY a JSON object in exactly this shape, no other text:
{}"#,
            reasoning, schema
        )
    }

    // -- Synthesis ---------------------------------------------------------

    /// Reconcile the panel's representative forecasts into one prediction
    pub fn synthesis_prompt(question: &Question, outcomes: &[IdentityOutcome]) -> String {
        let mut prompt = format!(
            r#"You are a superforecaster reconciling independent forecasts into a final prediction.

{}

Individual forecasts:
"#,
            Self::question_block(question)
        );
        for outcome in outcomes {
            prompt.push_str(&format!(
                "\n--- {} ({}) predicted {} ---\n{}\n",
                outcome.identity,
                outcome.model,
                outcome.prediction.summary(),
                outcome.reasoning
            ));
        }
        let format_contract = match &question.kind {
            QuestionKind::Binary => "Probability: NN%".to_string(),
            QuestionKind::MultipleChoice { options } => options
                .iter()
                .map(|o| format!("{}: NN%", o))
                .collect::<Vec<_>>()
                .join("\n"),
            QuestionKind::Numeric(_) => PERCENTILE_LEVELS
                .iter()
                .map(|l| format!("Percentile {}: value", l))
                .collect::<Vec<_>>()
                .join("\n"),
        };
        prompt.push_str(&format!(
            r#"
Compare the forecasts and reconcile their disagreements explicitly:
1. Start from the outside view (base rates), then apply the inside view.
2. Update Bayesian-style on the strongest evidence cited by any forecaster.
3. Discount forecasts whose reasoning contains factual errors.
4. Do not simply average; weigh argument quality.

End your answer with the final prediction in exactly this format:
{}"#,
            format_contract
        ));
        prompt
    }
}
