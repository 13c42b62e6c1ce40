use serde::{Deserialize, Serialize};

/// Snapshot of a live page: the controls, their labels and, when the page
/// renders questions as a list, the question container.
///
/// Serialized as the JSON page fixtures the CLI and tests load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub elements: Vec<PageElement>,
    #[serde(default)]
    pub labels: Vec<LabelElement>,
    /// Question list (`div[role=list]` on survey pages). `None` when absent.
    #[serde(default)]
    pub form_container: Option<Vec<ContainerItem>>,
    /// Interaction log, appended by every write.
    #[serde(default)]
    pub events: Vec<DomEvent>,
    #[serde(skip)]
    pub(crate) focused: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    pub tag: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub readonly: bool,
    /// Removed from the page since the snapshot was taken.
    #[serde(default)]
    pub detached: bool,
}

impl PageElement {
    pub fn attribute(&self, attr: Attribute) -> Option<&str> {
        match attr {
            Attribute::Name => self.name.as_deref(),
            Attribute::Placeholder => self.placeholder.as_deref(),
            Attribute::AriaLabel => self.aria_label.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

/// `<label for="...">`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelElement {
    #[serde(rename = "for")]
    pub for_id: String,
    pub text: String,
}

/// One question of a list-style form: its heading and the indices of the
/// controls rendered under it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerItem {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub controls: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Focus,
    Input,
    Change,
    Blur,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomEvent {
    pub element: usize,
    pub kind: EventKind,
}

/// Attributes the generic selector fallback searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Name,
    Placeholder,
    AriaLabel,
}

impl Document {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn element(&self, index: usize) -> Option<&PageElement> {
        self.elements.get(index).filter(|el| !el.detached)
    }

    /// Current value of the attached element carrying `id`.
    pub fn value_of(&self, id: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|el| !el.detached && el.id.as_deref() == Some(id))
            .map(|el| el.value.as_str())
    }

    /// Events recorded against one element, in order.
    pub fn events_for(&self, index: usize) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|e| e.element == index)
            .map(|e| e.kind)
            .collect()
    }

    /// Remove an element from the page while keeping indices stable.
    pub fn detach(&mut self, id: &str) -> bool {
        match self
            .elements
            .iter_mut()
            .find(|el| el.id.as_deref() == Some(id))
        {
            Some(el) => {
                el.detached = true;
                true
            }
            None => false,
        }
    }
}
