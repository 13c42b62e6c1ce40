use serde::Serialize;

use crate::fill::fill_model::SelectedField;
use crate::suggest::matcher::{Match, MatchKind};

pub const NO_SUGGESTION: &str = "No suggestion";

/// Default threshold above which a row starts out checked.
pub const DEFAULT_CHECK_THRESHOLD: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn of(confidence: f32) -> Self {
        if confidence > 0.7 {
            ConfidenceBand::High
        } else if confidence > 0.4 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

/// One line of the suggestions table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionRow {
    pub field_id: String,
    pub field_name: String,
    /// Suggested value, or `"No suggestion"`.
    pub value_text: String,
    pub confidence: f32,
    pub kind: MatchKind,
    pub checked: bool,
}

impl SuggestionRow {
    pub fn from_match(m: &Match, threshold: f32) -> Self {
        let (value_text, confidence) = match &m.suggestion {
            Some(s) => (s.value.clone(), s.confidence),
            None => (NO_SUGGESTION.to_string(), 0.0),
        };
        SuggestionRow {
            field_id: m.field.id.clone(),
            field_name: m.field.name.clone(),
            value_text,
            confidence,
            kind: m.kind,
            checked: m.suggestion.is_some() && confidence > threshold,
        }
    }

    pub fn has_suggestion(&self) -> bool {
        self.value_text != NO_SUGGESTION
    }

    /// Whole-number percentage, as shown next to the value.
    pub fn confidence_pct(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }

    pub fn band(&self) -> ConfidenceBand {
        ConfidenceBand::of(self.confidence)
    }
}

pub fn build_rows(matches: &[Match], threshold: f32) -> Vec<SuggestionRow> {
    matches
        .iter()
        .map(|m| SuggestionRow::from_match(m, threshold))
        .collect()
}

/// Checked rows that carry a value, in row order.
pub fn selected_fields(rows: &[SuggestionRow]) -> Vec<SelectedField> {
    rows.iter()
        .filter(|r| r.checked && r.has_suggestion())
        .map(|r| SelectedField::new(&r.field_id, &r.value_text, &r.field_name))
        .collect()
}

/// Label of the fill control and whether it is enabled.
pub fn fill_button(rows: &[SuggestionRow]) -> (String, bool) {
    let count = selected_fields(rows).len();
    (format!("Fill Selected ({})", count), count > 0)
}
