use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::background::handler::BackgroundHandler;
use crate::cli::config::AppConfig;
use crate::content::handler::ContentHandler;
use crate::fill::executor::FillExecutor;
use crate::page::page_model::Document;
use crate::persona::persona_model::PersonaData;
use crate::persona::store::PersonaStore;
use crate::report::console::{
    describe_fill_failure, describe_transport_error, format_fields, format_fill_result, format_rows,
};
use crate::session::session::{FillOutcome, Session};
use crate::suggest::ai_client::{CompletionBackend, MockBackend, OpenRouterBackend};
use crate::suggest::parser::parse_with_strategy;
use crate::suggest::suggestion_model::normalize_all;
use crate::trace::logger::TraceLogger;
use crate::transport::channel::{Channel, LocalChannel};
use crate::transport::process::ProcessChannel;

type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Settings resolved from CLI flags and the config file.
pub struct Context {
    pub config: AppConfig,
    pub endpoint: String,
    pub model: String,
    pub bridge: Option<String>,
    pub tracer: Option<Arc<TraceLogger>>,
}

// ============================================================================
// Wiring
// ============================================================================

fn load_page(path: &str) -> CmdResult<Document> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read page snapshot {}: {}", path, e))?;
    let doc = Document::from_json(&text)
        .map_err(|e| format!("page snapshot {} is not valid: {}", path, e))?;
    Ok(doc)
}

fn content_handler(ctx: &Context, page: &str) -> CmdResult<ContentHandler> {
    let fill = &ctx.config.fill;
    let mut handler = ContentHandler::new(
        load_page(page)?,
        FillExecutor::new(Duration::from_millis(fill.pause_ms)),
        Duration::from_millis(fill.settle_ms),
    );
    if let Some(t) = &ctx.tracer {
        handler = handler.with_tracer(Arc::clone(t));
    }
    Ok(handler)
}

fn bridge_channel(ctx: &Context, program: &str) -> CmdResult<ProcessChannel> {
    let ready_timeout = Duration::from_secs(ctx.config.timeouts.fill);
    Ok(ProcessChannel::launch(program, &[], ready_timeout)?)
}

fn background_channel(ctx: &Context, mock_response: Option<&str>) -> CmdResult<LocalChannel<BackgroundHandler>> {
    let timeouts = &ctx.config.timeouts;
    let backend: Arc<dyn CompletionBackend> = match mock_response {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read mock response {}: {}", path, e))?;
            Arc::new(MockBackend::new(&text))
        }
        None => Arc::new(OpenRouterBackend::new(
            &ctx.endpoint,
            &ctx.model,
            &ctx.config.ai.api_key_env,
            Duration::from_secs(timeouts.request),
        )),
    };

    let handler = BackgroundHandler::new(
        backend,
        ctx.config.retry.to_policy(),
        PersonaStore::new(&ctx.config.storage.path),
        Duration::from_secs(timeouts.backstop),
    );
    Ok(LocalChannel::new("background", handler))
}

fn new_session<C: Channel>(ctx: &Context, content: C, background: LocalChannel<BackgroundHandler>) -> Session<C, LocalChannel<BackgroundHandler>> {
    let session = Session::new(content, background, ctx.config.session_config());
    match &ctx.tracer {
        Some(t) => session.with_tracer(Arc::clone(t)),
        None => session,
    }
}

const NO_PAGE: &str = "either --page or --bridge is required";

// ============================================================================
// scan subcommand
// ============================================================================

pub fn cmd_scan(ctx: &Context, page: Option<&str>, json: bool) -> CmdResult {
    let background = background_channel(ctx, None)?;

    let fields = match (page, ctx.bridge.as_deref()) {
        (Some(path), _) => {
            let content = LocalChannel::new("content", content_handler(ctx, path)?);
            let mut session = new_session(ctx, content, background);
            session.scan()?.to_vec()
        }
        (None, Some(program)) => {
            let mut session = new_session(ctx, bridge_channel(ctx, program)?, background);
            session.scan()?.to_vec()
        }
        (None, None) => return Err(NO_PAGE.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&fields)?);
    } else {
        print!("{}", format_fields(&fields));
    }
    Ok(())
}

// ============================================================================
// parse subcommand
// ============================================================================

pub fn cmd_parse(input: Option<&str>) -> CmdResult {
    let content = match input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let (records, strategy) = parse_with_strategy(&content);
    let suggestions = normalize_all(&records);
    info!(strategy = ?strategy, records = records.len(), usable = suggestions.len(), "parsed input");

    println!("{}", serde_json::to_string_pretty(&suggestions)?);
    Ok(())
}

// ============================================================================
// suggest / fill subcommands
// ============================================================================

fn suggest_rows<C: Channel>(session: &mut Session<C, LocalChannel<BackgroundHandler>>) -> CmdResult {
    session.open();
    session.scan()?;
    if let Err(e) = session.fetch_suggestions() {
        return Err(describe_transport_error(&e).into());
    }
    print!("{}", format_rows(session.rows()));
    Ok(())
}

pub fn cmd_suggest(ctx: &Context, page: Option<&str>, mock_response: Option<&str>) -> CmdResult {
    let background = background_channel(ctx, mock_response)?;

    match (page, ctx.bridge.as_deref()) {
        (Some(path), _) => {
            let content = LocalChannel::new("content", content_handler(ctx, path)?);
            suggest_rows(&mut new_session(ctx, content, background))
        }
        (None, Some(program)) => {
            suggest_rows(&mut new_session(ctx, bridge_channel(ctx, program)?, background))
        }
        (None, None) => Err(NO_PAGE.into()),
    }
}

fn fill_rows<C: Channel>(
    session: &mut Session<C, LocalChannel<BackgroundHandler>>,
    only: &[String],
) -> CmdResult {
    suggest_rows(session)?;

    if !only.is_empty() {
        let ids: Vec<String> = session.rows().iter().map(|r| r.field_id.clone()).collect();
        for (i, id) in ids.iter().enumerate() {
            session.set_checked(i, only.contains(id));
        }
    }

    match session.fill_selected() {
        Ok(FillOutcome::NothingSelected) => {
            println!("No fields selected.");
            Ok(())
        }
        Ok(FillOutcome::Completed(result)) => {
            print!("{}", format_fill_result(&result));
            Ok(())
        }
        Err(e) => Err(describe_fill_failure(&e).into()),
    }
}

pub fn cmd_fill(
    ctx: &Context,
    page: Option<&str>,
    mock_response: Option<&str>,
    only: &[String],
    output: Option<&str>,
) -> CmdResult {
    let background = background_channel(ctx, mock_response)?;

    match (page, ctx.bridge.as_deref()) {
        (Some(path), _) => {
            let content = LocalChannel::new("content", content_handler(ctx, path)?);
            let mut session = new_session(ctx, content, background);
            fill_rows(&mut session, only)?;

            if let Some(out) = output {
                let doc = session.content().handler().document();
                std::fs::write(out, doc.to_json_pretty()?)?;
                println!("Filled page written to {}", out);
            }
            Ok(())
        }
        (None, Some(program)) => {
            fill_rows(&mut new_session(ctx, bridge_channel(ctx, program)?, background), only)
        }
        (None, None) => Err(NO_PAGE.into()),
    }
}

// ============================================================================
// persona subcommand
// ============================================================================

pub fn cmd_persona_import(ctx: &Context, file: &str) -> CmdResult {
    let text = std::fs::read_to_string(file)?;
    let persona: PersonaData = serde_json::from_str(&text)
        .map_err(|e| format!("{} is not a valid persona profile: {}", file, e))?;

    let store = PersonaStore::new(&ctx.config.storage.path);
    store.save(&persona)?;
    println!("Persona saved to {}", store.path().display());
    Ok(())
}

pub fn cmd_persona_show(ctx: &Context) -> CmdResult {
    let store = PersonaStore::new(&ctx.config.storage.path);
    match store.load()? {
        Some(persona) if !persona.is_empty() => {
            for (label, value) in persona.entries() {
                println!("{:<16} {}", label, value);
            }
        }
        _ => println!("No persona saved."),
    }
    Ok(())
}
