use std::time::Duration;

use form_autofill::error::{AiError, TransportError};
use form_autofill::field::field_model::{Field, FieldKind};
use form_autofill::fill::fill_model::FillResult;
use form_autofill::fill::selection::{NO_SUGGESTION, SuggestionRow};
use form_autofill::report::console::{
    AI_UNAVAILABLE, CONNECTION_ISSUE, describe_ai_error, describe_fill_failure,
    describe_transport_error, format_fields, format_fill_result, format_rows,
};
use form_autofill::suggest::matcher::MatchKind;

// ============================================================================
// Helper builders
// ============================================================================

fn row(id: &str, value: &str, confidence: f32, checked: bool) -> SuggestionRow {
    SuggestionRow {
        field_id: id.to_string(),
        field_name: id.to_string(),
        value_text: value.to_string(),
        confidence,
        kind: MatchKind::ExactId,
        checked,
    }
}

fn empty_row(id: &str) -> SuggestionRow {
    SuggestionRow {
        kind: MatchKind::None,
        ..row(id, NO_SUGGESTION, 0.0, false)
    }
}

// ============================================================================
// Tables
// ============================================================================

#[test]
fn fields_table_lists_every_field() {
    let fields = vec![
        Field::new("name", "Full Name", FieldKind::Text),
        Field::new("email", "Email", FieldKind::Email),
    ];
    let out = format_fields(&fields);
    assert!(out.starts_with("=== 2 fields detected ===\n"));
    assert!(out.contains("[email] Email"));
    assert_eq!(out.lines().count(), 3);
}

#[test]
fn rows_show_percent_band_and_fill_control() {
    let rows = vec![
        row("email", "ada@example.com", 0.92, true),
        row("role", "Engineer", 0.5, false),
        empty_row("fax"),
    ];
    let out = format_rows(&rows);
    assert!(out.contains("[x] email"));
    assert!(out.contains("ada@example.com  (92%, high)"));
    assert!(out.contains("Engineer  (50%, medium)"));
    assert!(out.contains("[ ] fax"));
    assert!(out.contains(NO_SUGGESTION));
    assert!(out.trim_end().ends_with("Fill Selected (1)"));
}

#[test]
fn fill_control_disabled_when_nothing_checked() {
    let out = format_rows(&[empty_row("fax")]);
    assert!(out.trim_end().ends_with("Fill Selected (0) (disabled)"));
}

// ============================================================================
// Fill results
// ============================================================================

#[test]
fn complete_fill_message() {
    let result = FillResult {
        filled_count: 3,
        errors: vec![],
    };
    assert_eq!(format_fill_result(&result), "Successfully filled all 3 fields!\n");
}

#[test]
fn partial_fill_message_lists_failures() {
    let result = FillResult {
        filled_count: 1,
        errors: vec!["Field not found: fax".into()],
    };
    assert_eq!(
        format_fill_result(&result),
        "Filled 1 fields successfully!\n1 fields could not be filled.\n    [FAIL] Field not found: fax\n"
    );
}

#[test]
fn fill_failure_hints() {
    let out = describe_fill_failure(&TransportError::NotLoaded);
    assert!(out.starts_with("Failed to fill fields: Content script not loaded."));
    assert!(out.contains("Try refreshing the page"));

    let timeout = TransportError::Timeout {
        context: "FILL_SELECTED_FIELDS".into(),
        timeout: Duration::from_secs(30),
    };
    assert!(describe_fill_failure(&timeout).contains("slow to respond"));

    let no_tab = TransportError::Remote("No active tab found".into());
    assert!(describe_fill_failure(&no_tab).contains("on the form page"));

    let other = TransportError::Remote("page is busy".into());
    assert_eq!(describe_fill_failure(&other), "Failed to fill fields: page is busy");
}

// ============================================================================
// Suggestion errors
// ============================================================================

#[test]
fn transport_errors_map_to_user_messages() {
    assert_eq!(describe_transport_error(&TransportError::NotLoaded), CONNECTION_ISSUE);
    assert_eq!(
        describe_transport_error(&TransportError::Remote("AI service returned HTTP 503: busy".into())),
        AI_UNAVAILABLE
    );

    let config = TransportError::Remote("AI service returned HTTP 401: bad key".into());
    assert!(describe_transport_error(&config).contains("API key must be configured"));

    let plain = TransportError::Remote("No suggestions content received from AI".into());
    assert_eq!(describe_transport_error(&plain), "No suggestions content received from AI");
}

#[test]
fn ai_errors_map_to_user_messages() {
    let missing = AiError::MissingApiKey {
        env_var: "OPENROUTER_API_KEY".into(),
    };
    assert!(describe_ai_error(&missing).contains("Set OPENROUTER_API_KEY"));
    assert_eq!(describe_ai_error(&AiError::Connection("reset".into())), CONNECTION_ISSUE);
    assert_eq!(
        describe_ai_error(&AiError::Status {
            status: 400,
            body: String::new()
        }),
        AI_UNAVAILABLE
    );
    assert_eq!(describe_ai_error(&AiError::EmptyResponse), AI_UNAVAILABLE);
}
