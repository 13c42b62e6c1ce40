use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::FillError;
use crate::fill::fill_model::{FillResult, SelectedField};
use crate::page::dom::{ControlKind, ElementRef, PageDom};
use crate::page::page_model::{Attribute, EventKind, SelectOption};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{TraceEvent, TraceStage};

/// Generic lookups by field name, tried in order after id and container.
const FALLBACK_SELECTORS: [(&str, Attribute); 8] = [
    ("input", Attribute::Name),
    ("input", Attribute::Placeholder),
    ("input", Attribute::AriaLabel),
    ("textarea", Attribute::Name),
    ("textarea", Attribute::Placeholder),
    ("textarea", Attribute::AriaLabel),
    ("select", Attribute::Name),
    ("select", Attribute::AriaLabel),
];

/// Sequential writer of approved values into the page.
#[derive(Debug, Clone)]
pub struct FillExecutor {
    /// Pause between two consecutive field writes.
    pub pause: Duration,
}

impl Default for FillExecutor {
    fn default() -> Self {
        FillExecutor {
            pause: Duration::from_millis(50),
        }
    }
}

impl FillExecutor {
    pub fn new(pause: Duration) -> Self {
        FillExecutor { pause }
    }

    /// Write every selected field, one at a time.
    ///
    /// A field that cannot be resolved or written adds one entry to
    /// `errors` and the batch moves on.
    pub fn fill_all<D: PageDom + ?Sized>(
        &self,
        dom: &mut D,
        selected: &[SelectedField],
        tracer: Option<&TraceLogger>,
    ) -> FillResult {
        let mut result = FillResult::default();

        for (i, field) in selected.iter().enumerate() {
            if i > 0 && !self.pause.is_zero() {
                thread::sleep(self.pause);
            }

            match fill_one(dom, field) {
                Ok(()) => {
                    result.filled_count += 1;
                    debug!(field = %field.display_key(), "filled field");
                    if let Some(t) = tracer {
                        t.log(&TraceEvent::now(TraceStage::Fill, "filled").with_field(&field.id));
                    }
                }
                Err(e) => {
                    warn!(field = %field.display_key(), error = %e, "field fill failed");
                    if let Some(t) = tracer {
                        t.log(
                            &TraceEvent::now(TraceStage::Fill, "failed")
                                .with_field(&field.id)
                                .with_detail(&e),
                        );
                    }
                    result.errors.push(e.to_string());
                }
            }
        }

        info!(
            filled = result.filled_count,
            failed = result.errors.len(),
            "fill batch complete"
        );
        result
    }
}

/// Locate the live control for a field: by id, then by container heading,
/// then by name-bearing attributes.
pub fn resolve<D: PageDom + ?Sized>(dom: &D, field: &SelectedField) -> Option<ElementRef> {
    if let Some(el) = dom.element_by_id(&field.id) {
        return Some(el);
    }

    if dom.has_form_container() {
        if let Some(el) = dom.container_control(&field.field_name) {
            debug!(field = %field.field_name, "resolved through form container");
            return Some(el);
        }
    }

    FALLBACK_SELECTORS
        .iter()
        .find_map(|(tag, attr)| dom.query_attribute_contains(tag, *attr, &field.field_name))
}

fn fill_one<D: PageDom + ?Sized>(dom: &mut D, field: &SelectedField) -> Result<(), FillError> {
    let el = resolve(dom, field)
        .ok_or_else(|| FillError::NotFound(field.display_key().to_string()))?;

    let write_err = |e: crate::error::DomError| FillError::Write {
        field: field.display_key().to_string(),
        message: e.to_string(),
    };

    match dom.control_kind(el).map_err(write_err)? {
        ControlKind::TextEntry => {
            dom.focus(el).map_err(write_err)?;
            dom.set_value(el, &field.value).map_err(write_err)?;
            dom.dispatch(el, EventKind::Input).map_err(write_err)?;
            dom.dispatch(el, EventKind::Change).map_err(write_err)?;
            dom.blur(el).map_err(write_err)?;
        }
        ControlKind::Select(options) => {
            let option = find_option(&options, &field.value).ok_or_else(|| {
                FillError::NoMatchingOption {
                    field: field.display_key().to_string(),
                    value: field.value.clone(),
                }
            })?;
            dom.set_value(el, &option.value).map_err(write_err)?;
            dom.dispatch(el, EventKind::Change).map_err(write_err)?;
        }
        ControlKind::Other(tag) => {
            return Err(FillError::Unsupported {
                field: field.display_key().to_string(),
                tag,
            });
        }
    }

    Ok(())
}

/// Option whose value equals `wanted`, else whose text contains it
/// (case-insensitive).
pub fn find_option<'a>(options: &'a [SelectOption], wanted: &str) -> Option<&'a SelectOption> {
    let needle = wanted.to_lowercase();
    options
        .iter()
        .find(|o| o.value == wanted)
        .or_else(|| options.iter().find(|o| o.text.to_lowercase().contains(&needle)))
}
