use serde::{Deserialize, Serialize};

/// Kind of control a detected field writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Select,
    Email,
    Tel,
    Url,
    #[serde(other)]
    Unknown,
}

impl FieldKind {
    /// Map a DOM `type` attribute (or tag name) to a field kind.
    pub fn from_dom(input_type: Option<&str>, tag: &str) -> FieldKind {
        match input_type.unwrap_or(tag) {
            "text" | "input" => FieldKind::Text,
            "textarea" => FieldKind::Textarea,
            "select" | "select-one" => FieldKind::Select,
            "email" => FieldKind::Email,
            "tel" => FieldKind::Tel,
            "url" => FieldKind::Url,
            _ => FieldKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Email => "email",
            FieldKind::Tel => "tel",
            FieldKind::Url => "url",
            FieldKind::Unknown => "unknown",
        }
    }
}

/// A form input found by one detection pass.
///
/// `id` is unique within the pass that produced it. The page element itself
/// is never retained: writes re-resolve the element from `id` (and `name` as
/// a fallback) at the moment of the write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Tag name of the control (`input`, `textarea`, `select`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl Field {
    pub fn new(id: &str, name: &str, kind: FieldKind) -> Self {
        Field {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            label: None,
            placeholder: None,
            element: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    /// Identifying strings in tie-break order: id, name, label, placeholder.
    pub fn identifiers(&self) -> [Option<&str>; 4] {
        [
            Some(self.id.as_str()),
            Some(self.name.as_str()),
            self.label.as_deref(),
            self.placeholder.as_deref(),
        ]
    }

    /// Name shown in error messages: the id when present, else the name.
    pub fn display_key(&self) -> &str {
        if self.id.is_empty() { &self.name } else { &self.id }
    }
}

/// SHA-1 over the identifying data of a detection pass. Equal fingerprints
/// mean the UI rows of one pass line up with the rows of the other.
pub fn fields_fingerprint(fields: &[Field]) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    for field in fields {
        hasher.update(field.id.as_bytes());
        hasher.update([0x1f]);
        hasher.update(field.name.as_bytes());
        hasher.update([0x1f]);
        hasher.update(field.kind.as_str().as_bytes());
        hasher.update([0x1e]);
    }
    format!("{:x}", hasher.finalize())
}
