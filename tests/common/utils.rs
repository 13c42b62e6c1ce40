#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use form_autofill::background::handler::BackgroundHandler;
use form_autofill::content::handler::ContentHandler;
use form_autofill::error::AiError;
use form_autofill::fill::executor::FillExecutor;
use form_autofill::page::page_model::Document;
use form_autofill::persona::store::PersonaStore;
use form_autofill::session::session::{Session, SessionConfig};
use form_autofill::suggest::ai_client::{CompletionBackend, MockBackend};
use form_autofill::suggest::retry::RetryPolicy;
use form_autofill::transport::channel::LocalChannel;

pub type LocalSession = Session<LocalChannel<ContentHandler>, LocalChannel<BackgroundHandler>>;

pub fn fixture(name: &str) -> PathBuf {
    let base = std::env::current_dir().unwrap();
    base.join("tests").join("fixtures").join(name)
}

pub fn page(name: &str) -> Document {
    let text = std::fs::read_to_string(fixture(name)).unwrap();
    Document::from_json(&text).unwrap()
}

/// Fresh path under the system temp dir, unique per test name and process.
pub fn temp_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("form_autofill_tests_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

/// Backend that fails a fixed number of times before answering.
pub struct ScriptedBackend {
    failures_left: AtomicU32,
    calls: AtomicU32,
    failure: fn() -> AiError,
    response: String,
}

impl ScriptedBackend {
    pub fn new(failures: u32, failure: fn() -> AiError, response: &str) -> Self {
        ScriptedBackend {
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
            failure,
            response: response.to_string(),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionBackend for ScriptedBackend {
    fn complete(&self, _system: &str, _user: &str) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err((self.failure)());
        }
        Ok(self.response.clone())
    }
}

/// Backend that takes a while to answer.
pub struct SlowBackend {
    pub delay: Duration,
}

impl CompletionBackend for SlowBackend {
    fn complete(&self, _system: &str, _user: &str) -> Result<String, AiError> {
        std::thread::sleep(self.delay);
        Ok("[]".to_string())
    }
}

pub fn unavailable() -> AiError {
    AiError::Status {
        status: 503,
        body: "upstream busy".into(),
    }
}

pub fn unauthorized() -> AiError {
    AiError::Status {
        status: 401,
        body: "bad key".into(),
    }
}

pub fn content_handler(doc: Document) -> ContentHandler {
    ContentHandler::new(doc, FillExecutor::new(Duration::ZERO), Duration::ZERO)
}

pub fn background_handler(backend: Arc<dyn CompletionBackend>, store_name: &str) -> BackgroundHandler {
    BackgroundHandler::new(
        backend,
        RetryPolicy::immediate(3),
        PersonaStore::new(temp_path(store_name)),
        Duration::from_secs(5),
    )
}

/// Session over in-process channels with zero pauses and a canned AI answer.
pub fn local_session(page_name: &str, ai_response: &str) -> LocalSession {
    let content = LocalChannel::new("content", content_handler(page(page_name)));
    let background = LocalChannel::new(
        "background",
        background_handler(Arc::new(MockBackend::new(ai_response)), &format!("{}.persona.json", page_name)),
    );
    Session::new(content, background, SessionConfig::default())
}
