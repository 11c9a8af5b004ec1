//! Shared mock adapters for use-case tests

use crate::ports::model_invoker::{InvokeError, InvokeParams, ModelInvoker};
use crate::ports::search_provider::{SearchError, SearchProvider};
use async_trait::async_trait;
use foresight_domain::{EvidenceRecord, Model};
use std::sync::Mutex;

enum Matcher {
    Any,
    Model(String),
    PromptContains(String),
}

struct Rule {
    matcher: Matcher,
    response: Result<String, String>,
}

/// Scripted invoker: rules are checked in insertion order, first match
/// wins, and every call is recorded for assertions.
pub struct ScriptedInvoker {
    rules: Vec<Rule>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Catch-all success; add after more specific rules
    pub fn respond(mut self, response: &str) -> Self {
        self.rules.push(Rule {
            matcher: Matcher::Any,
            response: Ok(response.to_string()),
        });
        self
    }

    pub fn respond_model(mut self, model: &str, response: &str) -> Self {
        self.rules.push(Rule {
            matcher: Matcher::Model(model.to_string()),
            response: Ok(response.to_string()),
        });
        self
    }

    pub fn fail_model(mut self, model: &str, message: &str) -> Self {
        self.rules.push(Rule {
            matcher: Matcher::Model(model.to_string()),
            response: Err(message.to_string()),
        });
        self
    }

    pub fn respond_when(mut self, prompt_contains: &str, response: &str) -> Self {
        self.rules.push(Rule {
            matcher: Matcher::PromptContains(prompt_contains.to_string()),
            response: Ok(response.to_string()),
        });
        self
    }

    pub fn fail_when(mut self, prompt_contains: &str, message: &str) -> Self {
        self.rules.push(Rule {
            matcher: Matcher::PromptContains(prompt_contains.to_string()),
            response: Err(message.to_string()),
        });
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Model identifiers in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelInvoker for ScriptedInvoker {
    async fn invoke(
        &self,
        model: &Model,
        prompt: &str,
        _params: &InvokeParams,
    ) -> Result<String, InvokeError> {
        self.calls.lock().unwrap().push(model.as_str().to_string());
        for rule in &self.rules {
            let matched = match &rule.matcher {
                Matcher::Any => true,
                Matcher::Model(m) => m == model.as_str(),
                Matcher::PromptContains(p) => prompt.contains(p),
            };
            if matched {
                return match &rule.response {
                    Ok(text) => Ok(text.clone()),
                    Err(message) => Err(InvokeError::Provider {
                        model: model.as_str().to_string(),
                        message: message.clone(),
                    }),
                };
            }
        }
        Err(InvokeError::Provider {
            model: model.as_str().to_string(),
            message: "no scripted response".to_string(),
        })
    }
}

/// Search source returning a fixed record list (or a fixed failure)
pub struct StaticSource {
    name: String,
    enabled: bool,
    records: Result<Vec<EvidenceRecord>, String>,
}

impl StaticSource {
    pub fn with_records(name: &str, records: Vec<EvidenceRecord>) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            records: Ok(records),
        }
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            records: Err(message.to_string()),
        }
    }

    pub fn disabled(name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: false,
            records: Ok(vec![]),
        }
    }
}

#[async_trait]
impl SearchProvider for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn search(&self, query: &str) -> Result<Vec<EvidenceRecord>, SearchError> {
        match &self.records {
            Ok(records) => Ok(records
                .iter()
                .map(|r| {
                    let mut r = r.clone();
                    r.query = query.to_string();
                    r
                })
                .collect()),
            Err(message) => Err(SearchError::Request {
                provider: self.name.clone(),
                message: message.clone(),
            }),
        }
    }
}
