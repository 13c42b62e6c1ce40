use crate::error::DomError;
use crate::page::page_model::{Attribute, Document, DomEvent, EventKind, SelectOption};

/// Handle to an element, valid only for the resolution that produced it.
/// Never stored across a suspension point; fields are re-resolved by
/// identifier at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementRef(pub usize);

/// How a resolved element can be written.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    TextEntry,
    Select(Vec<SelectOption>),
    Other(String),
}

/// Input types that are not free-text entry.
const NON_TEXT_INPUTS: [&str; 9] = [
    "checkbox", "radio", "submit", "button", "reset", "image", "file", "hidden", "range",
];

/// The live page as seen by the fill executor.
pub trait PageDom {
    fn element_by_id(&self, id: &str) -> Option<ElementRef>;

    /// Whether the page renders its questions inside a list container.
    fn has_form_container(&self) -> bool;

    /// First text input, textarea or select under the container item whose
    /// heading equals `heading` (trimmed, case-insensitive).
    fn container_control(&self, heading: &str) -> Option<ElementRef>;

    /// First `tag` element whose `attr` contains `needle` (CSS `[attr*=needle]`).
    fn query_attribute_contains(&self, tag: &str, attr: Attribute, needle: &str)
    -> Option<ElementRef>;

    fn control_kind(&self, el: ElementRef) -> Result<ControlKind, DomError>;

    fn focus(&mut self, el: ElementRef) -> Result<(), DomError>;
    fn set_value(&mut self, el: ElementRef, value: &str) -> Result<(), DomError>;
    fn dispatch(&mut self, el: ElementRef, kind: EventKind) -> Result<(), DomError>;
    fn blur(&mut self, el: ElementRef) -> Result<(), DomError>;
}

impl Document {
    fn attached(&self, el: ElementRef) -> Result<&crate::page::page_model::PageElement, DomError> {
        self.element(el.0).ok_or(DomError::Detached(el.0))
    }

    fn record(&mut self, el: ElementRef, kind: EventKind) {
        self.events.push(DomEvent {
            element: el.0,
            kind,
        });
    }

    fn is_container_control(&self, index: usize) -> bool {
        self.element(index).is_some_and(|el| match el.tag.as_str() {
            "input" => el.input_type.as_deref().unwrap_or("text") == "text",
            "textarea" | "select" => true,
            _ => false,
        })
    }
}

impl PageDom for Document {
    fn element_by_id(&self, id: &str) -> Option<ElementRef> {
        if id.is_empty() {
            return None;
        }
        self.elements
            .iter()
            .position(|el| !el.detached && el.id.as_deref() == Some(id))
            .map(ElementRef)
    }

    fn has_form_container(&self) -> bool {
        self.form_container.is_some()
    }

    fn container_control(&self, heading: &str) -> Option<ElementRef> {
        let wanted = heading.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }

        let items = self.form_container.as_ref()?;
        let item = items.iter().find(|item| {
            item.heading
                .as_deref()
                .is_some_and(|h| h.trim().to_lowercase() == wanted)
        })?;

        // Text input first, then textarea, then select
        let by_tag = |tag: &str| {
            item.controls.iter().copied().find(|&i| {
                self.is_container_control(i)
                    && self.element(i).is_some_and(|el| el.tag == tag)
            })
        };

        by_tag("input")
            .or_else(|| by_tag("textarea"))
            .or_else(|| by_tag("select"))
            .map(ElementRef)
    }

    fn query_attribute_contains(
        &self,
        tag: &str,
        attr: Attribute,
        needle: &str,
    ) -> Option<ElementRef> {
        // [attr*=""] never matches
        if needle.is_empty() {
            return None;
        }
        self.elements
            .iter()
            .position(|el| {
                !el.detached
                    && el.tag == tag
                    && el.attribute(attr).is_some_and(|v| v.contains(needle))
            })
            .map(ElementRef)
    }

    fn control_kind(&self, el: ElementRef) -> Result<ControlKind, DomError> {
        let element = self.attached(el)?;
        let kind = match element.tag.as_str() {
            "textarea" => ControlKind::TextEntry,
            "select" => ControlKind::Select(element.options.clone()),
            "input" => {
                let input_type = element.input_type.as_deref().unwrap_or("text");
                if NON_TEXT_INPUTS.contains(&input_type) {
                    ControlKind::Other(format!("input type={}", input_type))
                } else {
                    ControlKind::TextEntry
                }
            }
            other => ControlKind::Other(other.to_string()),
        };
        Ok(kind)
    }

    fn focus(&mut self, el: ElementRef) -> Result<(), DomError> {
        self.attached(el)?;
        self.focused = Some(el.0);
        self.record(el, EventKind::Focus);
        Ok(())
    }

    fn set_value(&mut self, el: ElementRef, value: &str) -> Result<(), DomError> {
        let element = self.attached(el)?;
        if element.disabled {
            return Err(DomError::Disabled);
        }
        if element.readonly {
            return Err(DomError::ReadOnly);
        }
        self.elements[el.0].value = value.to_string();
        Ok(())
    }

    fn dispatch(&mut self, el: ElementRef, kind: EventKind) -> Result<(), DomError> {
        self.attached(el)?;
        self.record(el, kind);
        Ok(())
    }

    fn blur(&mut self, el: ElementRef) -> Result<(), DomError> {
        self.attached(el)?;
        if self.focused == Some(el.0) {
            self.focused = None;
        }
        self.record(el, EventKind::Blur);
        Ok(())
    }
}
