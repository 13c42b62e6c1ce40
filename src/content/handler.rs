use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::field::detector::detect_fields;
use crate::field::field_model::Field;
use crate::fill::executor::FillExecutor;
use crate::page::page_model::Document;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{TraceEvent, TraceStage};
use crate::transport::message::{FillResponse, MessageHandler, PongResponse, Request, to_body};

/// Page side of the extension: detects fields and writes approved values.
pub struct ContentHandler {
    document: Document,
    executor: FillExecutor,
    /// Wait before a fill batch starts.
    settle: Duration,
    tracer: Option<Arc<TraceLogger>>,
}

impl ContentHandler {
    pub fn new(document: Document, executor: FillExecutor, settle: Duration) -> Self {
        ContentHandler {
            document,
            executor,
            settle,
            tracer: None,
        }
    }

    pub fn with_tracer(mut self, tracer: Arc<TraceLogger>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    fn scan(&mut self) -> Vec<Field> {
        let fields = detect_fields(&mut self.document);
        if let Some(t) = &self.tracer {
            t.log(&TraceEvent::now(TraceStage::Detect, "scanned").with_detail(format!("{} fields", fields.len())));
        }
        fields
    }
}

impl MessageHandler for ContentHandler {
    fn handle(&mut self, request: Request) -> Option<Value> {
        match request {
            Request::Ping => Some(to_body(&PongResponse { pong: true })),
            Request::GetFields => {
                let fields = self.scan();
                info!(count = fields.len(), "answered GET_FIELDS");
                Some(to_body(&fields))
            }
            Request::FillSelectedFields { selected_fields } => {
                if !self.settle.is_zero() {
                    thread::sleep(self.settle);
                }
                let result = self.executor.fill_all(
                    &mut self.document,
                    &selected_fields,
                    self.tracer.as_deref(),
                );
                Some(to_body(&FillResponse::completed(result)))
            }
            other => {
                debug!(kind = other.kind(), "ignoring message not meant for the page");
                None
            }
        }
    }
}
