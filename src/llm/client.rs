use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::{ApiKey, Config};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const ERROR_SNIPPET_LEN: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("language model rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("language model API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("language model returned no content")]
    EmptyResponse,

    #[error("language model network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Chat-style language model: a list of messages in, assistant text out.
/// Implemented by `OpenAiClient` for production; scripted mocks used in tests.
pub trait ChatModel {
    async fn chat(&self, messages: &[ChatMessage], temperature: f32) -> Result<String, LlmError>;

    /// Single system instruction plus one user message.
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String, LlmError> {
        self.chat(&[ChatMessage::system(system), ChatMessage::user(user)], temperature)
            .await
    }
}

impl<M: ChatModel> ChatModel for &M {
    async fn chat(&self, messages: &[ChatMessage], temperature: f32) -> Result<String, LlmError> {
        (**self).chat(messages, temperature).await
    }
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    /// `Config` guarantees a non-blank key, so construction cannot fail.
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            api_key: config.openai_api_key.clone(),
            model: config.model.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey::new("test-key"),
            model: "gpt-3.5-turbo".to_string(),
            base_url: base_url.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatModel for OpenAiClient {
    async fn chat(&self, messages: &[ChatMessage], temperature: f32) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("language model rate limited");
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<ChatCompletionResponse>(&text)
                && let Some(err) = &body.error
            {
                let classified = classify_api_error(status.as_u16(), err);
                warn!(error = %classified, "language model API error");
                return Err(classified);
            }
            let end = text.floor_char_boundary(ERROR_SNIPPET_LEN);
            warn!(%status, "language model API error (no structured body)");
            return Err(LlmError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {}", &text[..end]),
            });
        }

        let body: ChatCompletionResponse = response.json().await?;
        if let Some(err) = &body.error {
            return Err(classify_api_error(status.as_u16(), err));
        }

        let content = body
            .choices
            .and_then(|choices| choices.into_iter().next())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        debug!(model = %self.model, chars = content.len(), "chat completion done");
        Ok(content)
    }
}

fn classify_api_error(status: u16, err: &ApiError) -> LlmError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());
    let message = match &err.kind {
        Some(kind) => format!("{kind}: {message}"),
        None => message,
    };
    match status {
        429 => LlmError::RateLimited,
        code => LlmError::Api { code, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_includes_error_type() {
        let err = ApiError {
            message: Some("Incorrect API key provided".into()),
            kind: Some("invalid_request_error".into()),
        };
        match classify_api_error(401, &err) {
            LlmError::Api { code, message } => {
                assert_eq!(code, 401);
                assert_eq!(message, "invalid_request_error: Incorrect API key provided");
            }
            other => panic!("expected Api error, got: {other:?}"),
        }
    }

    #[test]
    fn classify_429_as_rate_limited() {
        let err = ApiError {
            message: None,
            kind: None,
        };
        assert!(matches!(classify_api_error(429, &err), LlmError::RateLimited));
    }
}
