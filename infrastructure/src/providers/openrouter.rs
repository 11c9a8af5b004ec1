//! OpenRouter chat-completions adapter
//!
//! Implements [`ModelInvoker`] over the OpenAI-compatible chat-completions
//! endpoint. One call, one outcome: the adapter maps transport and HTTP
//! failures onto the port's error taxonomy and leaves retries and
//! fallbacks to the chain. The API key never reaches a log line; log
//! output carries a fixed-length mask instead.

use async_trait::async_trait;
use foresight_application::{InvokeError, InvokeParams, ModelInvoker};
use foresight_domain::Model;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Fixed-length mask logged in place of any credential
const CREDENTIAL_MASK: &str = "********";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// HTTP adapter for the OpenRouter chat-completions API
pub struct OpenRouterInvoker {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl OpenRouterInvoker {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Point the adapter at a different OpenAI-compatible endpoint
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn map_status(model: &Model, status: reqwest::StatusCode, body: String) -> InvokeError {
        let model = model.as_str().to_string();
        match status.as_u16() {
            401 | 403 => InvokeError::Authentication { model },
            429 => InvokeError::RateLimited { model },
            _ => InvokeError::Provider {
                model,
                message: format!("HTTP {}: {}", status, truncate(&body, 200)),
            },
        }
    }
}

#[async_trait]
impl ModelInvoker for OpenRouterInvoker {
    async fn invoke(
        &self,
        model: &Model,
        prompt: &str,
        params: &InvokeParams,
    ) -> Result<String, InvokeError> {
        let start = Instant::now();
        debug!(
            model = %model,
            prompt_len = prompt.len(),
            credential = CREDENTIAL_MASK,
            "sending chat-completions request"
        );

        let request = ChatRequest {
            model: model.as_str(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .timeout(params.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InvokeError::Timeout {
                        model: model.as_str().to_string(),
                        timeout_secs: params.timeout.as_secs(),
                    }
                } else {
                    InvokeError::Provider {
                        model: model.as_str().to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = Self::map_status(model, status, body);
            warn!(
                model = %model,
                kind = error.kind(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "chat-completions request failed"
            );
            return Err(error);
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            InvokeError::MalformedResponse {
                model: model.as_str().to_string(),
                message: format!("response body was not valid JSON: {}", e),
            }
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| InvokeError::MalformedResponse {
                model: model.as_str().to_string(),
                message: "no completion content in response".to_string(),
            })?;

        info!(
            model = %model,
            prompt_len = prompt.len(),
            response_len = content.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "model answered"
        );
        Ok(content)
    }
}

fn truncate(text: &str, max: usize) -> &str {
    let mut end = text.len().min(max);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let model = Model::default();
        assert!(matches!(
            OpenRouterInvoker::map_status(&model, reqwest::StatusCode::UNAUTHORIZED, String::new()),
            InvokeError::Authentication { .. }
        ));
        assert!(matches!(
            OpenRouterInvoker::map_status(&model, reqwest::StatusCode::FORBIDDEN, String::new()),
            InvokeError::Authentication { .. }
        ));
        assert!(matches!(
            OpenRouterInvoker::map_status(
                &model,
                reqwest::StatusCode::TOO_MANY_REQUESTS,
                String::new()
            ),
            InvokeError::RateLimited { .. }
        ));
        let e = OpenRouterInvoker::map_status(
            &model,
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            "boom".to_string(),
        );
        assert!(matches!(e, InvokeError::Provider { .. }));
        assert!(e.to_string().contains("boom"));
    }

    #[test]
    fn test_request_serialization_omits_empty_max_tokens() {
        let request = ChatRequest {
            model: "openai/gpt-5",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            temperature: 0.3,
            max_tokens: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("max_tokens"));
        assert!(json.contains(r#""model":"openai/gpt-5""#));
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "Probability: 60%"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Probability: 60%")
        );
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("short", 200), "short");
    }
}
