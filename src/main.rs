use std::sync::Arc;

use clap::Parser;
use form_autofill::cli::commands::{
    Context, cmd_fill, cmd_parse, cmd_persona_import, cmd_persona_show, cmd_scan, cmd_suggest,
};
use form_autofill::cli::config::{Cli, Commands, PersonaCommand, load_config, resolve_ai};
use form_autofill::trace::logger::TraceLogger;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn init_logging(verbose: u8) {
    let debug_forced = std::env::var("FORM_AUTOFILL_DEBUG").is_ok_and(|v| v == "true");
    let level = match (verbose, debug_forced) {
        (_, true) if verbose < 2 => "debug",
        (0, _) => "warn",
        (1, _) => "info",
        (2, _) => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref());

    // Resolve AI settings: CLI > config > defaults
    let (endpoint, model) = resolve_ai(&cli, &config);
    let ctx = Context {
        config,
        endpoint,
        model,
        bridge: cli.bridge.clone(),
        tracer: cli.trace.as_deref().map(|path| Arc::new(TraceLogger::new(path))),
    };

    match cli.command {
        Commands::Scan { page, json } => cmd_scan(&ctx, page.as_deref(), json)?,
        Commands::Parse { input } => cmd_parse(input.as_deref())?,
        Commands::Suggest {
            page,
            mock_response,
        } => cmd_suggest(&ctx, page.as_deref(), mock_response.as_deref())?,
        Commands::Fill {
            page,
            mock_response,
            only,
            output,
        } => cmd_fill(
            &ctx,
            page.as_deref(),
            mock_response.as_deref(),
            &only,
            output.as_deref(),
        )?,
        Commands::Persona { action } => match action {
            PersonaCommand::Import { file } => cmd_persona_import(&ctx, &file)?,
            PersonaCommand::Show => cmd_persona_show(&ctx)?,
        },
    }

    Ok(())
}
