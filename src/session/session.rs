use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::field::field_model::{Field, fields_fingerprint};
use crate::fill::fill_model::{FillResult, SelectedField};
use crate::fill::selection::{self, DEFAULT_CHECK_THRESHOLD, SuggestionRow};
use crate::suggest::matcher::{Match, match_fields};
use crate::suggest::suggestion_model::normalize_all;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{TraceEvent, TraceStage};
use crate::transport::channel::Channel;
use crate::transport::message::{FillResponse, PongResponse, Request, SuggestionsResponse};

/// Deadlines and defaults the orchestrator works with.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub scan_timeout: Duration,
    pub suggestions_timeout: Duration,
    pub ping_timeout: Duration,
    pub fill_timeout: Duration,
    pub check_threshold: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            scan_timeout: Duration::from_secs(30),
            suggestions_timeout: Duration::from_secs(90),
            ping_timeout: Duration::from_secs(5),
            fill_timeout: Duration::from_secs(30),
            check_threshold: DEFAULT_CHECK_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FillOutcome {
    /// No checked row carried a value; nothing was sent.
    NothingSelected,
    Completed(FillResult),
}

/// State of one popup lifetime: the current field list, the matches from
/// the latest suggestion fetch and the user's checkbox choices.
pub struct Session<C: Channel = Box<dyn Channel>, B: Channel = Box<dyn Channel>> {
    content: C,
    background: B,
    config: SessionConfig,

    fields: Vec<Field>,
    fingerprint: Option<String>,
    matches: Vec<Match>,
    rows: Vec<SuggestionRow>,

    tracer: Option<Arc<TraceLogger>>,
}

impl<C: Channel, B: Channel> Session<C, B> {
    pub fn new(content: C, background: B, config: SessionConfig) -> Self {
        Session {
            content,
            background,
            config,
            fields: Vec::new(),
            fingerprint: None,
            matches: Vec::new(),
            rows: Vec::new(),
            tracer: None,
        }
    }

    pub fn with_tracer(mut self, tracer: Arc<TraceLogger>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut C {
        &mut self.content
    }

    pub fn background(&self) -> &B {
        &self.background
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn rows(&self) -> &[SuggestionRow] {
        &self.rows
    }

    fn trace(&self, event: TraceEvent) {
        if let Some(t) = &self.tracer {
            t.log(&event);
        }
    }

    /// Tell the background side the popup is up. It never answers.
    pub fn open(&mut self) {
        match self.background.request(&Request::PopupOpened, self.config.ping_timeout) {
            Ok(_) | Err(TransportError::NoResponse(_)) => {}
            Err(e) => debug!(error = %e, "POPUP_OPENED not delivered"),
        }
    }

    /// Ask the page for its fields. Rows from the previous fetch survive
    /// only when the field list is unchanged.
    pub fn scan(&mut self) -> Result<&[Field], TransportError> {
        let reply = self
            .content
            .request(&Request::GetFields, self.config.scan_timeout)?;
        let fields: Vec<Field> = decode(reply, "GET_FIELDS")?;

        let fingerprint = fields_fingerprint(&fields);
        if self.fingerprint.as_deref() != Some(fingerprint.as_str()) {
            debug!(fingerprint = %fingerprint, "field list changed; clearing suggestions");
            self.matches.clear();
            self.rows.clear();
        }

        info!(count = fields.len(), "scanned fields");
        self.fingerprint = Some(fingerprint);
        self.fields = fields;
        Ok(&self.fields)
    }

    /// Fetch suggestions for the current fields and rebuild every row.
    pub fn fetch_suggestions(&mut self) -> Result<&[SuggestionRow], TransportError> {
        let request = Request::GetAiSuggestions {
            fields: self.fields.clone(),
        };
        let reply = self
            .background
            .request(&request, self.config.suggestions_timeout)?;
        let response: SuggestionsResponse = decode(reply, "GET_AI_SUGGESTIONS")?;

        if let Some(error) = response.error {
            warn!(error = %error, "suggestion fetch failed");
            return Err(TransportError::Remote(error));
        }

        let raw = response.suggestions.unwrap_or_default();
        let suggestions = normalize_all(&raw);
        if suggestions.len() < raw.len() {
            debug!(dropped = raw.len() - suggestions.len(), "dropped incomplete suggestion records");
        }

        self.apply_suggestions(match_fields(&self.fields, &suggestions));
        Ok(&self.rows)
    }

    /// Replace the whole match set at once.
    fn apply_suggestions(&mut self, matches: Vec<Match>) {
        if let Some(t) = &self.tracer {
            t.log_matches(&matches);
        }
        self.rows = selection::build_rows(&matches, self.config.check_threshold);
        self.matches = matches;
    }

    /// Toggle a row. Rows without a suggestion cannot be checked.
    pub fn set_checked(&mut self, index: usize, checked: bool) -> bool {
        match self.rows.get_mut(index) {
            Some(row) if row.has_suggestion() || !checked => {
                row.checked = checked;
                true
            }
            _ => false,
        }
    }

    pub fn selected_fields(&self) -> Vec<SelectedField> {
        selection::selected_fields(&self.rows)
    }

    /// Send the checked rows to the page. The page must answer `PING` first.
    pub fn fill_selected(&mut self) -> Result<FillOutcome, TransportError> {
        let selected = self.selected_fields();
        if selected.is_empty() {
            info!("no fields selected");
            return Ok(FillOutcome::NothingSelected);
        }

        let alive = self
            .content
            .request(&Request::Ping, self.config.ping_timeout)
            .ok()
            .and_then(|reply| serde_json::from_value::<PongResponse>(reply).ok())
            .is_some_and(|p| p.pong);
        if !alive {
            warn!("page did not answer PING");
            self.trace(TraceEvent::now(TraceStage::Transport, "not-loaded"));
            return Err(TransportError::NotLoaded);
        }

        let request = Request::FillSelectedFields {
            selected_fields: selected,
        };
        let reply = self.content.request(&request, self.config.fill_timeout)?;
        let response: FillResponse = decode(reply, "FILL_SELECTED_FIELDS")?;

        if !response.success {
            let error = response.error.unwrap_or_else(|| "Unknown error".to_string());
            self.trace(TraceEvent::now(TraceStage::Transport, "fill-rejected").with_detail(&error));
            return Err(TransportError::Remote(error));
        }

        Ok(FillOutcome::Completed(FillResult {
            filled_count: response.filled_count.unwrap_or(0),
            errors: response.errors.unwrap_or_default(),
        }))
    }
}

fn decode<T: DeserializeOwned>(reply: Value, context: &str) -> Result<T, TransportError> {
    serde_json::from_value(reply).map_err(|e| TransportError::Json {
        context: format!("{} reply", context),
        source: e,
    })
}
