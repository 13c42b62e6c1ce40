use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::field::field_model::Field;
use crate::fill::fill_model::{FillResult, SelectedField};
use crate::suggest::suggestion_model::RawSuggestion;

/// Messages exchanged between the orchestrator and the serving contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    GetFields,
    Ping,
    #[serde(rename_all = "camelCase")]
    FillSelectedFields {
        selected_fields: Vec<SelectedField>,
    },
    GetAiSuggestions {
        fields: Vec<Field>,
    },
    PopupOpened,
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::GetFields => "GET_FIELDS",
            Request::Ping => "PING",
            Request::FillSelectedFields { .. } => "FILL_SELECTED_FIELDS",
            Request::GetAiSuggestions { .. } => "GET_AI_SUGGESTIONS",
            Request::PopupOpened => "POPUP_OPENED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PongResponse {
    pub pong: bool,
}

/// `{ success, filledCount, errors }` or `{ success: false, error }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FillResponse {
    pub fn completed(result: FillResult) -> Self {
        FillResponse {
            success: true,
            filled_count: Some(result.filled_count),
            errors: Some(result.errors),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        FillResponse {
            success: false,
            filled_count: None,
            errors: None,
            error: Some(error.to_string()),
        }
    }
}

/// `{ suggestions }` or `{ error }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<RawSuggestion>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SuggestionsResponse {
    pub fn ok(suggestions: Vec<RawSuggestion>) -> Self {
        SuggestionsResponse {
            suggestions: Some(suggestions),
            error: None,
        }
    }

    pub fn err(error: impl ToString) -> Self {
        SuggestionsResponse {
            suggestions: None,
            error: Some(error.to_string()),
        }
    }
}

/// A serving context. `None` means the message is accepted without a reply.
pub trait MessageHandler {
    fn handle(&mut self, request: Request) -> Option<Value>;
}

/// Encode a response body, falling back to an `{ error }` object.
pub fn to_body<T: Serialize>(response: &T) -> Value {
    serde_json::to_value(response)
        .unwrap_or_else(|e| serde_json::json!({ "error": format!("failed to encode response: {}", e) }))
}
