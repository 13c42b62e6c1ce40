use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::suggest::matcher::{Match, MatchKind};

/// Pipeline stage an audit record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStage {
    Detect,
    Parse,
    Match,
    Fill,
    Transport,
}

#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub stage: TraceStage,

    pub field: Option<String>,
    pub outcome: String,
    pub detail: Option<String>,

    pub confidence: Option<f32>,
}

impl TraceEvent {
    pub fn now(stage: TraceStage, outcome: impl ToString) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            stage,
            field: None,
            outcome: outcome.to_string(),
            detail: None,
            confidence: None,
        }
    }

    /// One record per matcher decision.
    pub fn from_match(m: &Match) -> Self {
        let outcome = match m.kind {
            MatchKind::ExactId => "exact-id",
            MatchKind::ExactName => "exact-name",
            MatchKind::Partial => "partial",
            MatchKind::None => "none",
        };
        let mut event = Self::now(TraceStage::Match, outcome).with_field(&m.field.id);
        if let Some(s) = &m.suggestion {
            event = event
                .with_detail(format!("key={}", s.field_key))
                .with_confidence(s.confidence);
        }
        event
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}
