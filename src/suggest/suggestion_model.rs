use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Confidence assumed when the model gives none (or gives garbage).
pub const DEFAULT_CONFIDENCE: f32 = 0.8;

// ============================================================================
// Raw records, as the model emitted them
// ============================================================================

/// `{ "id": ..., "value": ..., "confidence": ... }`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrentShape {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `name` / `label` / `fieldName` when the record has no `id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// `{ "fieldName": ..., "suggestedValue": ... }`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LegacyShape {
    #[serde(rename = "fieldName", skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(rename = "suggestedValue", skip_serializing_if = "Option::is_none")]
    pub suggested_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// A suggestion record exactly as parsed, in either naming convention.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawSuggestion {
    Current(CurrentShape),
    Legacy(LegacyShape),
}

impl RawSuggestion {
    /// Classify a decoded JSON value. Non-objects are not suggestions.
    pub fn from_value(value: &Value) -> Option<RawSuggestion> {
        let obj = value.as_object()?;
        let confidence = obj.get("confidence").and_then(confidence_from_value);

        let is_legacy = !obj.contains_key("id")
            && !obj.contains_key("value")
            && (obj.contains_key("fieldName") || obj.contains_key("suggestedValue"));

        if is_legacy {
            return Some(RawSuggestion::Legacy(LegacyShape {
                field_name: text_field(obj, "fieldName"),
                suggested_value: text_field(obj, "suggestedValue"),
                confidence,
            }));
        }

        Some(RawSuggestion::Current(CurrentShape {
            id: text_field(obj, "id"),
            name: text_field(obj, "name")
                .or_else(|| text_field(obj, "label"))
                .or_else(|| text_field(obj, "fieldName")),
            value: text_field(obj, "value").or_else(|| text_field(obj, "suggestedValue")),
            confidence,
        }))
    }

    /// Key the model used for the field: id first, then the label-ish name.
    pub fn key(&self) -> Option<&str> {
        match self {
            RawSuggestion::Current(s) => s.id.as_deref().or(s.name.as_deref()),
            RawSuggestion::Legacy(s) => s.field_name.as_deref(),
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            RawSuggestion::Current(s) => s.value.as_deref(),
            RawSuggestion::Legacy(s) => s.suggested_value.as_deref(),
        }
    }

    pub fn confidence(&self) -> Option<f32> {
        match self {
            RawSuggestion::Current(s) => s.confidence,
            RawSuggestion::Legacy(s) => s.confidence,
        }
    }

    /// Collapse into a `Suggestion`; `None` when key or value is missing.
    pub fn normalize(&self) -> Option<Suggestion> {
        let key = self.key()?.trim();
        let value = self.value()?;
        if key.is_empty() || value.trim().is_empty() {
            return None;
        }
        Some(Suggestion {
            field_key: key.to_string(),
            value: value.to_string(),
            confidence: self.confidence().unwrap_or(DEFAULT_CONFIDENCE),
        })
    }
}

impl<'de> Deserialize<'de> for RawSuggestion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RawSuggestion::from_value(&value)
            .ok_or_else(|| D::Error::custom("suggestion record must be a JSON object"))
    }
}

/// Strings pass through, numbers and booleans are stringified, anything else
/// (null, arrays, objects, empty strings) counts as absent.
fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn confidence_from_value(value: &Value) -> Option<f32> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    normalize_confidence(raw)
}

/// Map a model-supplied confidence into [0, 1]. Values in (1, 100] are read
/// as percentages.
pub fn normalize_confidence(raw: f64) -> Option<f32> {
    if !raw.is_finite() {
        return None;
    }
    let scaled = if raw > 1.0 && raw <= 100.0 { raw / 100.0 } else { raw };
    Some(scaled.clamp(0.0, 1.0) as f32)
}

// ============================================================================
// Normalized suggestion
// ============================================================================

/// A candidate value for some field, keyed the way the model named the field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub field_key: String,
    pub value: String,
    pub confidence: f32,
}

impl Suggestion {
    pub fn new(field_key: &str, value: &str, confidence: f32) -> Self {
        Suggestion {
            field_key: field_key.to_string(),
            value: value.to_string(),
            confidence,
        }
    }
}

/// Ingestion boundary in front of the matcher: drops records missing a key
/// or a value, keeps input order.
pub fn normalize_all(raw: &[RawSuggestion]) -> Vec<Suggestion> {
    raw.iter().filter_map(RawSuggestion::normalize).collect()
}
