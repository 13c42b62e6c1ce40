mod common;

use std::sync::Arc;
use std::time::Duration;

use common::utils::{ScriptedBackend, SlowBackend, background_handler, temp_path, unauthorized, unavailable};
use form_autofill::background::handler::{BackgroundHandler, NO_CONTENT, REQUEST_TIMED_OUT};
use form_autofill::error::AiError;
use form_autofill::field::field_model::{Field, FieldKind};
use form_autofill::persona::persona_model::PersonaData;
use form_autofill::persona::store::PersonaStore;
use form_autofill::suggest::ai_client::{CompletionBackend, MockBackend, SuggestionPayload, extract_content, request_suggestions};
use form_autofill::suggest::retry::RetryPolicy;
use form_autofill::transport::message::{MessageHandler, Request, SuggestionsResponse};

fn fields() -> Vec<Field> {
    vec![
        Field::new("email", "Email", FieldKind::Email),
        Field::new("name", "Full Name", FieldKind::Text),
    ]
}

fn ask(handler: &mut BackgroundHandler) -> SuggestionsResponse {
    let reply = handler
        .handle(Request::GetAiSuggestions { fields: fields() })
        .expect("GET_AI_SUGGESTIONS always answers");
    serde_json::from_value(reply).unwrap()
}

// ============================================================================
// RetryPolicy
// ============================================================================

#[test]
fn default_policy_matches_channel_contract() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.base_delay, Duration::from_secs(1));
    assert_eq!(policy.max_delay, Duration::from_secs(10));
    assert!((policy.jitter - 0.1).abs() < f64::EPSILON);
}

#[test]
fn backoff_doubles_and_caps() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.backoff(0), Duration::from_secs(1));
    assert_eq!(policy.backoff(1), Duration::from_secs(2));
    assert_eq!(policy.backoff(2), Duration::from_secs(4));
    assert_eq!(policy.backoff(3), Duration::from_secs(8));
    assert_eq!(policy.backoff(4), Duration::from_secs(10));
    assert_eq!(policy.backoff(40), Duration::from_secs(10));
}

#[test]
fn jitter_stays_within_ten_percent() {
    let policy = RetryPolicy::default();
    for _ in 0..200 {
        let d = policy.delay_for(1);
        assert!(d >= Duration::from_millis(1790) && d <= Duration::from_millis(2210), "{:?}", d);
    }
}

#[test]
fn retries_transient_errors_until_success() {
    let backend = ScriptedBackend::new(2, unavailable, "[]");
    let out = RetryPolicy::immediate(3).run("test", |_| backend.complete("system", "user"), AiError::is_retryable);
    assert_eq!(out.unwrap(), "[]");
    assert_eq!(backend.calls(), 3);
}

#[test]
fn gives_up_after_max_attempts() {
    let backend = ScriptedBackend::new(5, unavailable, "[]");
    let out = RetryPolicy::immediate(3).run("test", |_| backend.complete("system", "user"), AiError::is_retryable);
    assert!(matches!(out, Err(AiError::Status { status: 503, .. })));
    assert_eq!(backend.calls(), 3);
}

#[test]
fn non_retryable_error_surfaces_immediately() {
    let backend = ScriptedBackend::new(1, unauthorized, "[]");
    let out = RetryPolicy::immediate(3).run("test", |_| backend.complete("system", "user"), AiError::is_retryable);
    assert!(matches!(out, Err(AiError::Status { status: 401, .. })));
    assert_eq!(backend.calls(), 1);
}

#[test]
fn retryable_statuses() {
    for status in [408, 429, 500, 502, 503, 504] {
        assert!(AiError::Status { status, body: String::new() }.is_retryable(), "{}", status);
    }
    for status in [400, 401, 403, 404, 422] {
        assert!(!AiError::Status { status, body: String::new() }.is_retryable(), "{}", status);
    }
    assert!(AiError::Connection("reset".into()).is_retryable());
    assert!(!AiError::MissingApiKey { env_var: "X".into() }.is_retryable());
    assert!(!AiError::EmptyResponse.is_retryable());
}

// ============================================================================
// AI client
// ============================================================================

#[test]
fn extract_first_choice_content() {
    let body = r#"{"choices":[{"message":{"role":"assistant","content":"[{\"id\":\"a\",\"value\":\"x\"}]"}}]}"#;
    assert_eq!(extract_content(body).unwrap(), r#"[{"id":"a","value":"x"}]"#);
}

#[test]
fn extract_reports_empty_and_malformed_bodies() {
    assert!(matches!(extract_content(r#"{"choices":[]}"#), Err(AiError::EmptyResponse)));
    assert!(matches!(
        extract_content(r#"{"choices":[{"message":{"content":"  "}}]}"#),
        Err(AiError::EmptyResponse)
    ));
    assert!(matches!(extract_content("<html>"), Err(AiError::Decode(_))));
}

#[test]
fn payload_carries_persona_and_field_json() {
    let payload = SuggestionPayload::new(Some(r#"{"name":"Ada"}"#.into()), &fields()).unwrap();
    let message: serde_json::Value = serde_json::from_str(&payload.to_message().unwrap()).unwrap();

    assert_eq!(message["personaData"], r#"{"name":"Ada"}"#);
    let form: Vec<Field> = serde_json::from_str(message["formData"].as_str().unwrap()).unwrap();
    assert_eq!(form, fields());
}

#[test]
fn request_suggestions_retries_through_backend() {
    let backend = ScriptedBackend::new(1, || AiError::Connection("reset".into()), "[]");
    let payload = SuggestionPayload::new(None, &fields()).unwrap();
    let content = request_suggestions(&backend, &RetryPolicy::immediate(3), &payload).unwrap();
    assert_eq!(content, "[]");
    assert_eq!(backend.calls(), 2);
}

// ============================================================================
// Background handler
// ============================================================================

#[test]
fn background_answers_parsed_suggestions() {
    let backend = Arc::new(MockBackend::new(
        "```json\n[{\"id\":\"email\",\"value\":\"ada@example.com\",\"confidence\":0.9}]\n```",
    ));
    let mut handler = background_handler(backend, "bg_ok.json");

    let response = ask(&mut handler);
    assert!(response.error.is_none());
    let suggestions = response.suggestions.unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].key(), Some("email"));
}

#[test]
fn background_sends_saved_persona() {
    let path = temp_path("bg_persona.json");
    let store = PersonaStore::new(&path);
    store
        .save(&PersonaData {
            name: "Ada".into(),
            ..Default::default()
        })
        .unwrap();

    struct Echo;
    impl CompletionBackend for Echo {
        fn complete(&self, _system: &str, user: &str) -> Result<String, AiError> {
            let payload: serde_json::Value = serde_json::from_str(user).unwrap();
            let persona: PersonaData =
                serde_json::from_str(payload["personaData"].as_str().unwrap()).unwrap();
            Ok(format!(r#"[{{"id":"name","value":"{}"}}]"#, persona.name))
        }
    }

    let mut handler = BackgroundHandler::new(Arc::new(Echo), RetryPolicy::immediate(1), store, Duration::from_secs(5));
    let suggestions = ask(&mut handler).suggestions.unwrap();
    assert_eq!(suggestions[0].value(), Some("Ada"));
}

#[test]
fn background_reports_empty_content() {
    let mut handler = background_handler(Arc::new(MockBackend::new("   ")), "bg_empty.json");
    assert_eq!(ask(&mut handler).error.as_deref(), Some(NO_CONTENT));
}

#[test]
fn background_reports_ai_errors() {
    let backend = Arc::new(ScriptedBackend::new(10, unauthorized, "[]"));
    let mut handler = background_handler(backend, "bg_err.json");
    let error = ask(&mut handler).error.unwrap();
    assert!(error.contains("HTTP 401"), "{}", error);
}

#[test]
fn background_backstop_answers_timeout() {
    let backend = Arc::new(SlowBackend { delay: Duration::from_millis(500) });
    let mut handler = BackgroundHandler::new(
        backend,
        RetryPolicy::immediate(1),
        PersonaStore::new(temp_path("bg_slow.json")),
        Duration::from_millis(50),
    );
    assert_eq!(ask(&mut handler).error.as_deref(), Some(REQUEST_TIMED_OUT));
}

#[test]
fn background_ignores_popup_opened() {
    let mut handler = background_handler(Arc::new(MockBackend::new("[]")), "bg_popup.json");
    assert!(handler.handle(Request::PopupOpened).is_none());
    assert!(handler.handle(Request::Ping).is_none());
}
