use std::time::Duration;

use thiserror::Error;

/// HTTP statuses the AI channel treats as transient.
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Failures of the remote AI channel.
#[derive(Debug, Error)]
pub enum AiError {
    /// No API key available (config problem, never retried)
    #[error("AI service is not configured: environment variable {env_var} is not set")]
    MissingApiKey { env_var: String },

    /// Request never produced a response (connect, timeout, send)
    #[error("network error talking to AI service: {0}")]
    Network(#[source] reqwest::Error),

    /// AI service answered with a non-success status
    #[error("AI service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected completion envelope
    #[error("malformed AI service response: {0}")]
    Decode(String),

    /// Completion contained no message content
    #[error("Empty response from AI service")]
    EmptyResponse,

    /// Offline / scripted failure injected by a backend
    #[error("connection failed: {0}")]
    Connection(String),
}

impl AiError {
    /// Whether the retry policy may attempt the call again.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AiError::Connection(_) => true,
            AiError::Status { status, .. } => RETRYABLE_STATUSES.contains(status),
            AiError::MissingApiKey { .. } | AiError::Decode(_) | AiError::EmptyResponse => false,
        }
    }

    /// Connection-class failure, as opposed to a configuration/service one.
    pub fn is_network(&self) -> bool {
        match self {
            AiError::Network(_) | AiError::Connection(_) => true,
            AiError::Status { status, .. } => RETRYABLE_STATUSES.contains(status),
            _ => false,
        }
    }
}

/// Failures of the message channel between the orchestrator and a serving context.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Other side never answered within the deadline
    #[error("{context} timed out after {}ms", .timeout.as_millis())]
    Timeout { context: String, timeout: Duration },

    /// Other side handled the message but sent nothing back
    #[error("No response received from {0}. Make sure the page is fully loaded.")]
    NoResponse(String),

    /// Content side is not loaded / not reachable
    #[error("Content script not loaded. Please refresh the page and try again.")]
    NotLoaded,

    /// Channel process/pipe failed
    #[error("channel I/O error: {0}")]
    Io(String),

    /// Remote side answered with an explicit failure
    #[error("{0}")]
    Remote(String),

    /// Payload could not be encoded or decoded
    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TransportError {
    /// Connection/latency problems the user can fix by retrying or reloading.
    pub fn is_network(&self) -> bool {
        match self {
            TransportError::Timeout { .. }
            | TransportError::NoResponse(_)
            | TransportError::NotLoaded
            | TransportError::Io(_) => true,
            TransportError::Remote(msg) => looks_like_network(msg),
            TransportError::Json { .. } => false,
        }
    }

    /// Problems that need a settings change rather than a retry.
    pub fn is_configuration(&self) -> bool {
        match self {
            TransportError::Remote(msg) => {
                let lower = msg.to_lowercase();
                lower.contains("not configured") || lower.contains("api key") || lower.contains("http 401")
            }
            _ => false,
        }
    }
}

/// Heuristic classification of a free-text error coming back over the channel.
pub fn looks_like_network(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["connection", "timeout", "timed out", "offline", "fetch", "network"]
        .iter()
        .any(|k| lower.contains(k))
}

/// Failure of a single field write. Rendered into `FillResult::errors`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FillError {
    #[error("Field not found: {0}")]
    NotFound(String),

    #[error("No matching option for field {field}: {value}")]
    NoMatchingOption { field: String, value: String },

    #[error("Unsupported element <{tag}> for field {field}")]
    Unsupported { field: String, tag: String },

    #[error("Error filling field {field}: {message}")]
    Write { field: String, message: String },
}

/// Page-side failure while writing to a resolved element.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomError {
    #[error("element #{0} is no longer attached to the page")]
    Detached(usize),

    #[error("element is disabled")]
    Disabled,

    #[error("element is read-only")]
    ReadOnly,
}

/// Persona store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access persona store {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("persona store {path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
