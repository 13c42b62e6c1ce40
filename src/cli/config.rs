use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::fill::selection::DEFAULT_CHECK_THRESHOLD;
use crate::persona::store::DEFAULT_STORE_PATH;
use crate::session::session::SessionConfig;
use crate::suggest::ai_client::{DEFAULT_API_KEY_ENV, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::suggest::retry::RetryPolicy;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-autofill",
    version,
    about = "Fill web forms from a saved persona with AI-generated suggestions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: form-autofill.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Append match/fill audit records to this JSONL file
    #[arg(long, global = true)]
    pub trace: Option<String>,

    /// Page bridge program speaking NDJSON on stdin/stdout (instead of --page)
    #[arg(long, global = true)]
    pub bridge: Option<String>,

    /// Chat-completions model
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Chat-completions endpoint
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect fillable fields on a page
    Scan {
        /// Page snapshot (JSON)
        #[arg(long)]
        page: Option<String>,

        /// Print fields as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse raw model output into suggestion records
    Parse {
        /// File with the model output (default: stdin)
        #[arg(long)]
        input: Option<String>,
    },

    /// Scan a page and show AI suggestions for its fields
    Suggest {
        #[arg(long)]
        page: Option<String>,

        /// Canned model output instead of calling the AI service
        #[arg(long)]
        mock_response: Option<String>,
    },

    /// Scan, suggest and fill the default-checked fields
    Fill {
        #[arg(long)]
        page: Option<String>,

        #[arg(long)]
        mock_response: Option<String>,

        /// Only fill these field ids (overrides default checks)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Write the filled page snapshot here
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Manage the saved persona
    Persona {
        #[command(subcommand)]
        action: PersonaCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum PersonaCommand {
    /// Save a persona profile from a JSON file
    Import {
        #[arg(long)]
        file: String,
    },
    /// Print the saved persona
    Show,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-autofill.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub fill: FillConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

/// All values in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_request_secs")]
    pub request: u64,
    #[serde(default = "default_backstop_secs")]
    pub backstop: u64,
    #[serde(default = "default_suggestions_secs")]
    pub suggestions: u64,
    #[serde(default = "default_ping_secs")]
    pub ping: u64,
    #[serde(default = "default_fill_secs")]
    pub fill: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: 30,
            backstop: 60,
            suggestions: 90,
            ping: 5,
            fill: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            jitter: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillConfig {
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_check_threshold")]
    pub default_check_threshold: f32,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            pause_ms: 50,
            settle_ms: 100,
            default_check_threshold: DEFAULT_CHECK_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_STORE_PATH.to_string(),
        }
    }
}

// Serde default helpers
fn default_api_key_env() -> String { DEFAULT_API_KEY_ENV.to_string() }
fn default_request_secs() -> u64 { 30 }
fn default_backstop_secs() -> u64 { 60 }
fn default_suggestions_secs() -> u64 { 90 }
fn default_ping_secs() -> u64 { 5 }
fn default_fill_secs() -> u64 { 30 }
fn default_max_attempts() -> u32 { 3 }
fn default_base_delay_ms() -> u64 { 1000 }
fn default_max_delay_ms() -> u64 { 10_000 }
fn default_jitter() -> f64 { 0.1 }
fn default_pause_ms() -> u64 { 50 }
fn default_settle_ms() -> u64 { 100 }
fn default_check_threshold() -> f32 { DEFAULT_CHECK_THRESHOLD }
fn default_store_path() -> String { DEFAULT_STORE_PATH.to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

pub const DEFAULT_CONFIG_PATH: &str = "form-autofill.yaml";

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => match serde_yaml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = config_path, error = %e, "malformed config file; using defaults");
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Endpoint and model: CLI > config > built-in default.
pub fn resolve_ai(cli: &Cli, config: &AppConfig) -> (String, String) {
    let endpoint = cli
        .endpoint
        .clone()
        .or_else(|| config.ai.endpoint.clone())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let model = cli
        .model
        .clone()
        .or_else(|| config.ai.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    (endpoint, model)
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter: self.jitter.clamp(0.0, 1.0),
        }
    }
}

impl AppConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            scan_timeout: Duration::from_secs(self.timeouts.fill),
            suggestions_timeout: Duration::from_secs(self.timeouts.suggestions),
            ping_timeout: Duration::from_secs(self.timeouts.ping),
            fill_timeout: Duration::from_secs(self.timeouts.fill),
            check_threshold: self.fill.default_check_threshold,
        }
    }
}
