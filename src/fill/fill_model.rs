use serde::{Deserialize, Serialize};

/// One approved write: the field's identifier, the value to put in it and the
/// field's display name for the fallback lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedField {
    pub id: String,
    pub value: String,
    #[serde(rename = "fieldName", default)]
    pub field_name: String,
}

impl SelectedField {
    pub fn new(id: &str, value: &str, field_name: &str) -> Self {
        SelectedField {
            id: id.to_string(),
            value: value.to_string(),
            field_name: field_name.to_string(),
        }
    }

    /// Key named in a "not found" error.
    pub fn display_key(&self) -> &str {
        if self.id.is_empty() { &self.field_name } else { &self.id }
    }
}

/// Payload of `FILL_SELECTED_FIELDS`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillRequest {
    pub selected_fields: Vec<SelectedField>,
}

/// Outcome of one fill batch. Always produced, even when every field failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResult {
    pub filled_count: usize,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl FillResult {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}
