use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AiError;
use crate::field::field_model::Field;
use crate::suggest::prompt::SUGGESTION_SYSTEM_PROMPT;
use crate::suggest::retry::RetryPolicy;

/// A chat-completion endpoint: system + user text in, assistant text out.
pub trait CompletionBackend: Send + Sync {
    fn complete(&self, system: &str, user: &str) -> Result<String, AiError>;
}

// ============================================================================
// OpenRouter (OpenAI-compatible) backend
// ============================================================================

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-maverick:free";
pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

pub struct OpenRouterBackend {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub api_key: Option<String>,
    /// Per-request deadline on the requesting side.
    pub timeout: Duration,
}

impl Default for OpenRouterBackend {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: std::env::var(DEFAULT_API_KEY_ENV).ok(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenRouterBackend {
    pub fn new(endpoint: &str, model: &str, api_key_env: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key_env: api_key_env.to_string(),
            api_key: std::env::var(api_key_env).ok().filter(|k| !k.trim().is_empty()),
            timeout,
        }
    }
}

impl CompletionBackend for OpenRouterBackend {
    fn complete(&self, system: &str, user: &str) -> Result<String, AiError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| AiError::MissingApiKey {
            env_var: self.api_key_env.clone(),
        })?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            stream: false,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(AiError::Network)?;

        debug!(endpoint = %self.endpoint, model = %self.model, "sending completion request");
        let response = client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .map_err(AiError::Network)?;

        let status = response.status();
        let body = response.text().map_err(AiError::Network)?;

        if !status.is_success() {
            return Err(AiError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200).to_string(),
            });
        }

        extract_content(&body)
    }
}

/// Pull the first choice's message text out of a completion body.
pub fn extract_content(body: &str) -> Result<String, AiError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| AiError::Decode(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(AiError::EmptyResponse)
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ============================================================================
// Mock backend (canned answer, no network)
// ============================================================================

pub struct MockBackend {
    pub response: String,
}

impl MockBackend {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl CompletionBackend for MockBackend {
    fn complete(&self, _system: &str, _user: &str) -> Result<String, AiError> {
        Ok(self.response.clone())
    }
}

// ============================================================================
// Suggestion request
// ============================================================================

/// User message of the suggestion completion. Both members are JSON text.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionPayload {
    pub persona_data: Option<String>,
    pub form_data: String,
}

impl SuggestionPayload {
    pub fn new(persona_data: Option<String>, fields: &[Field]) -> Result<Self, AiError> {
        let form_data =
            serde_json::to_string(fields).map_err(|e| AiError::Decode(e.to_string()))?;
        Ok(Self {
            persona_data,
            form_data,
        })
    }

    pub fn to_message(&self) -> Result<String, AiError> {
        serde_json::to_string(self).map_err(|e| AiError::Decode(e.to_string()))
    }
}

/// Ask the model for raw suggestion text, retrying transient failures.
pub fn request_suggestions(
    backend: &dyn CompletionBackend,
    retry: &RetryPolicy,
    payload: &SuggestionPayload,
) -> Result<String, AiError> {
    let message = payload.to_message()?;
    let content = retry.run(
        "AI suggestions",
        |_| backend.complete(SUGGESTION_SYSTEM_PROMPT, &message),
        AiError::is_retryable,
    )?;
    info!(chars = content.len(), "received suggestion completion");
    Ok(content)
}
