use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::suggest::matcher::Match;
use crate::trace::trace::TraceEvent;

/// Append-only JSONL audit trail of detect, match and fill decisions.
///
/// Shared between the session and the content side through an `Arc`; every
/// failure degrades to a warning so auditing never breaks a fill.
pub struct TraceLogger {
    path: Option<PathBuf>,
    sink: Option<Mutex<File>>,
}

impl TraceLogger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                debug!(path = %path.display(), "audit trail opened");
                Self {
                    path: Some(path.to_path_buf()),
                    sink: Some(Mutex::new(file)),
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not open trace file; auditing disabled");
                Self::disabled()
            }
        }
    }

    /// A logger that drops every event.
    pub fn disabled() -> Self {
        Self { path: None, sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn log(&self, event: &TraceEvent) {
        self.append(std::slice::from_ref(event));
    }

    /// One record per field for a whole suggestion fetch, written as one
    /// block so concurrent fill records never interleave with it.
    pub fn log_matches(&self, matches: &[Match]) {
        let events: Vec<TraceEvent> = matches.iter().map(TraceEvent::from_match).collect();
        self.append(&events);
    }

    fn append(&self, events: &[TraceEvent]) {
        let Some(sink) = &self.sink else {
            return;
        };

        let mut block = String::new();
        for event in events {
            match serde_json::to_string(event) {
                Ok(line) => {
                    block.push_str(&line);
                    block.push('\n');
                }
                Err(e) => warn!(stage = ?event.stage, error = %e, "dropping unserializable trace event"),
            }
        }
        if block.is_empty() {
            return;
        }

        let mut file = match sink.lock() {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "trace logger lock poisoned");
                return;
            }
        };
        if let Err(e) = file.write_all(block.as_bytes()) {
            warn!(error = %e, "failed to append trace events");
        }
    }
}
