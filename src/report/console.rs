use crate::error::{AiError, TransportError};
use crate::field::field_model::Field;
use crate::fill::fill_model::FillResult;
use crate::fill::selection::{ConfidenceBand, SuggestionRow, fill_button};

// ============================================================================
// Console reporter: formatted terminal output
// ============================================================================

pub const CONNECTION_ISSUE: &str =
    "Connection issue detected. Please check your internet connection and try again.";
pub const AI_UNAVAILABLE: &str = "AI service is temporarily unavailable. Please try again later.";

/// Field list as printed by `scan`.
///
/// ```text
/// === 3 fields detected ===
///   1. name            [text]      Full Name
///   2. email           [email]     Email
/// ```
pub fn format_fields(fields: &[Field]) -> String {
    let mut out = format!("=== {} fields detected ===\n", fields.len());
    for (i, field) in fields.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {:<20} [{}] {}\n",
            i + 1,
            field.id,
            field.kind.as_str(),
            field.name
        ));
    }
    out
}

/// Suggestion table, one row per field, followed by the fill control.
pub fn format_rows(rows: &[SuggestionRow]) -> String {
    let mut out = String::new();

    for (i, row) in rows.iter().enumerate() {
        let checkbox = if row.checked { "[x]" } else { "[ ]" };
        if row.has_suggestion() {
            let band = match row.band() {
                ConfidenceBand::High => "high",
                ConfidenceBand::Medium => "medium",
                ConfidenceBand::Low => "low",
            };
            out.push_str(&format!(
                "{:>3}. {} {:<24} {}  ({}%, {})\n",
                i + 1,
                checkbox,
                row.field_name,
                row.value_text,
                row.confidence_pct(),
                band
            ));
        } else {
            out.push_str(&format!(
                "{:>3}. {} {:<24} {}\n",
                i + 1,
                checkbox,
                row.field_name,
                row.value_text
            ));
        }
    }

    let (label, enabled) = fill_button(rows);
    out.push_str(&format!(
        "\n{}{}\n",
        label,
        if enabled { "" } else { " (disabled)" }
    ));
    out
}

pub fn format_fill_result(result: &FillResult) -> String {
    if result.errors.is_empty() {
        return format!("Successfully filled all {} fields!\n", result.filled_count);
    }

    let mut out = format!(
        "Filled {} fields successfully!\n{} fields could not be filled.\n",
        result.filled_count,
        result.errors.len()
    );
    for error in &result.errors {
        out.push_str(&format!("    [FAIL] {}\n", error));
    }
    out
}

/// Message for a fill that failed as a whole, with a hint on what to do.
pub fn describe_fill_failure(error: &TransportError) -> String {
    let message = error.to_string();
    let mut out = format!("Failed to fill fields: {}", message);

    if message.contains("Content script not loaded") {
        out.push_str("\n\nTry refreshing the page and scanning for fields again.");
    } else if message.contains("timed out") {
        out.push_str("\n\nThe page might be slow to respond. Try again in a moment.");
    } else if message.contains("No active tab") {
        out.push_str("\n\nMake sure you're on the form page you want to fill.");
    }
    out
}

/// User-facing text for a failed suggestion fetch.
pub fn describe_transport_error(error: &TransportError) -> String {
    if error.is_configuration() {
        return format!(
            "{}\n\nCheck the AI settings: an API key must be configured.",
            error
        );
    }
    if error.is_network() {
        return CONNECTION_ISSUE.to_string();
    }
    match error {
        TransportError::Remote(message) => describe_remote_message(message),
        other => other.to_string(),
    }
}

pub fn describe_ai_error(error: &AiError) -> String {
    match error {
        AiError::MissingApiKey { env_var } => format!(
            "AI service is not configured. Set {} to your API key and try again.",
            env_var
        ),
        e if e.is_network() => CONNECTION_ISSUE.to_string(),
        AiError::Status { .. } | AiError::Decode(_) | AiError::EmptyResponse => {
            AI_UNAVAILABLE.to_string()
        }
        other => other.to_string(),
    }
}

fn describe_remote_message(message: &str) -> String {
    if ["API", "OpenAI", "OpenRouter", "AI service"]
        .iter()
        .any(|k| message.contains(k))
    {
        return AI_UNAVAILABLE.to_string();
    }
    message.to_string()
}
