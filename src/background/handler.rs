use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::field::field_model::Field;
use crate::persona::store::PersonaStore;
use crate::suggest::ai_client::{CompletionBackend, SuggestionPayload, request_suggestions};
use crate::suggest::parser::parse_with_strategy;
use crate::suggest::retry::RetryPolicy;
use crate::transport::message::{MessageHandler, Request, SuggestionsResponse, to_body};

pub const REQUEST_TIMED_OUT: &str = "Request timed out";
pub const NO_CONTENT: &str = "No suggestions content received from AI";

/// Orchestration side of the AI channel: persona + fields in, suggestions out.
pub struct BackgroundHandler {
    backend: Arc<dyn CompletionBackend>,
    retry: RetryPolicy,
    store: PersonaStore,
    /// Upper bound on one `GET_AI_SUGGESTIONS`, whatever the AI call does.
    backstop: Duration,
}

impl BackgroundHandler {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        retry: RetryPolicy,
        store: PersonaStore,
        backstop: Duration,
    ) -> Self {
        BackgroundHandler {
            backend,
            retry,
            store,
            backstop,
        }
    }

    fn suggestions(&self, fields: Vec<Field>) -> SuggestionsResponse {
        let persona = match self.store.load_raw() {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "failed to load persona");
                return SuggestionsResponse::err(e);
            }
        };
        if persona.is_none() {
            warn!("no persona saved; asking without profile data");
        }

        let payload = match SuggestionPayload::new(persona, &fields) {
            Ok(p) => p,
            Err(e) => return SuggestionsResponse::err(e),
        };

        // The AI call runs on a worker so the backstop can fire independently
        let (tx, rx) = mpsc::channel();
        let backend = Arc::clone(&self.backend);
        let retry = self.retry.clone();
        thread::spawn(move || {
            let outcome = request_suggestions(backend.as_ref(), &retry, &payload);
            // Receiver is gone when the backstop already answered
            let _ = tx.send(outcome);
        });

        match rx.recv_timeout(self.backstop) {
            Ok(Ok(content)) => {
                if content.trim().is_empty() {
                    return SuggestionsResponse::err(NO_CONTENT);
                }
                let (records, strategy) = parse_with_strategy(&content);
                info!(records = records.len(), strategy = ?strategy, "parsed AI suggestions");
                SuggestionsResponse::ok(records)
            }
            Ok(Err(e)) => {
                error!(error = %e, "AI suggestion request failed");
                SuggestionsResponse::err(e)
            }
            Err(_) => {
                warn!(backstop_ms = self.backstop.as_millis() as u64, "AI suggestion request hit backstop");
                SuggestionsResponse::err(REQUEST_TIMED_OUT)
            }
        }
    }
}

impl MessageHandler for BackgroundHandler {
    fn handle(&mut self, request: Request) -> Option<Value> {
        match request {
            Request::GetAiSuggestions { fields } => Some(to_body(&self.suggestions(fields))),
            Request::PopupOpened => {
                debug!("popup opened");
                None
            }
            other => {
                debug!(kind = other.kind(), "ignoring message not meant for the background");
                None
            }
        }
    }
}
