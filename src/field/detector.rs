use tracing::debug;

use crate::field::field_model::{Field, FieldKind};
use crate::page::page_model::{ContainerItem, Document};

/// Input types picked up by the generic scan.
const GENERIC_INPUT_TYPES: [&str; 4] = ["text", "email", "tel", "url"];

/// Scan the page for fillable fields.
///
/// Pages with a question list container are scanned item by item; all other
/// pages fall back to a document-order scan of text inputs, textareas and
/// selects. Controls without an `id` are given one so later writes can find
/// them again, which is why the page is borrowed mutably.
pub fn detect_fields(doc: &mut Document) -> Vec<Field> {
    let fields = match doc.form_container.clone() {
        Some(items) => detect_container_fields(doc, &items),
        None => detect_generic_fields(doc),
    };
    debug!(count = fields.len(), "detected form fields");
    fields
}

fn detect_container_fields(doc: &mut Document, items: &[ContainerItem]) -> Vec<Field> {
    let mut fields = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let position = index + 1;
        let name = item
            .heading
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Field {}", position));

        // Synthesized names mean the item has no question text
        if name.starts_with("Field ") {
            continue;
        }

        let control = first_container_control(doc, &item.controls, "input")
            .or_else(|| first_container_control(doc, &item.controls, "textarea"))
            .or_else(|| first_container_control(doc, &item.controls, "select"));

        let (id, kind, tag) = match control {
            Some(i) => {
                let el = &mut doc.elements[i];
                let id = match el.id.as_deref() {
                    Some(id) if !id.is_empty() => id.to_string(),
                    _ => {
                        let assigned = format!("field-{}", position);
                        el.id = Some(assigned.clone());
                        assigned
                    }
                };
                let kind = match el.tag.as_str() {
                    "input" => FieldKind::Text,
                    "textarea" => FieldKind::Textarea,
                    _ => FieldKind::Select,
                };
                (id, kind, Some(el.tag.clone()))
            }
            None => (format!("field-{}", position), FieldKind::Unknown, None),
        };

        fields.push(Field {
            id,
            name: name.clone(),
            kind,
            label: Some(name),
            placeholder: None,
            element: tag,
        });
    }

    fields
}

fn first_container_control(doc: &Document, controls: &[usize], tag: &str) -> Option<usize> {
    controls.iter().copied().find(|&i| {
        doc.element(i).is_some_and(|el| {
            el.tag == tag && (tag != "input" || el.input_type.as_deref().unwrap_or("text") == "text")
        })
    })
}

fn is_generic_control(tag: &str, input_type: Option<&str>) -> bool {
    match tag {
        "input" => GENERIC_INPUT_TYPES.contains(&input_type.unwrap_or("text")),
        "textarea" | "select" => true,
        _ => false,
    }
}

fn detect_generic_fields(doc: &mut Document) -> Vec<Field> {
    let candidates: Vec<usize> = doc
        .elements
        .iter()
        .enumerate()
        .filter(|(_, el)| !el.detached && is_generic_control(&el.tag, el.input_type.as_deref()))
        .map(|(i, _)| i)
        .collect();

    let mut fields = Vec::with_capacity(candidates.len());

    for (n, index) in candidates.into_iter().enumerate() {
        let position = n + 1;

        let label = doc.elements[index].id.as_deref().and_then(|id| {
            doc.labels
                .iter()
                .find(|l| l.for_id == id)
                .map(|l| l.text.trim().to_string())
        });

        let el = &mut doc.elements[index];
        let name = match &label {
            Some(text) => text.clone(),
            None => el
                .aria_label
                .clone()
                .or_else(|| el.placeholder.clone())
                .unwrap_or_else(|| format!("Field {}", position)),
        };

        let id = match el.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let assigned = format!("generic-field-{}", position);
                el.id = Some(assigned.clone());
                assigned
            }
        };

        let kind = match el.tag.as_str() {
            "input" => FieldKind::from_dom(el.input_type.as_deref(), "text"),
            tag => FieldKind::from_dom(None, tag),
        };

        fields.push(Field {
            id,
            name: name.trim().to_string(),
            kind,
            label,
            placeholder: el.placeholder.clone(),
            element: Some(el.tag.clone()),
        });
    }

    fields
}
