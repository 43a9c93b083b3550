use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use disclosure_common::observability::{LogConfig, init_logging};
use disclosure_common::{CandidateQuery, ErrorPayload, LookupError};
use disclosure_config::{DisclosureConfig, DisclosureConfigLoader, LoggingConfig};
use disclosure_extract::{CandidateRecord, assemble, extract_document};
use disclosure_web::LookupService;

use cli::{Cli, Command, ExtractArgs, ServeArgs};
mod cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let Cli { config, command } = Cli::parse();

    // 1) Load config (env wins over the file)
    let mut cfg: DisclosureConfig = DisclosureConfigLoader::new()
        .with_optional_file(&config)
        .load()
        .with_context(|| format!("failed to load configuration from {}", config.display()))?;

    init_logging(log_config(&cfg.logging))?;
    tracing::debug!(config = %config.display(), candidates = cfg.candidates.len(), "app.config_loaded");

    match Command::or_default(command) {
        Command::Serve(args) => {
            apply_serve_overrides(&mut cfg, args);
            let service = LookupService::from_config(&cfg)?;
            disclosure_api::start_server(&cfg.server, service).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Lookup(args) => {
            let service = LookupService::from_config(&cfg)?;
            print_outcome(service.lookup(&args.name).await)
        }
        Command::Extract(args) => print_outcome(extract_file(&args)),
    }
}

fn log_config(logging: &LoggingConfig) -> LogConfig {
    LogConfig {
        app_name: "disclosure",
        log_dir: logging.dir.clone(),
        emit_stderr: logging.emit_stderr,
        format: logging.format,
        default_filter: logging.filter.clone(),
    }
}

fn apply_serve_overrides(cfg: &mut DisclosureConfig, args: ServeArgs) {
    if let Some(port) = args.port {
        cfg.server.port = port;
    }
    if let Some(host) = args.host {
        cfg.server.host = host;
    }
}

/// Offline extraction of a saved page, assembled like a live lookup.
fn extract_file(args: &ExtractArgs) -> Result<CandidateRecord, LookupError> {
    let bytes = std::fs::read(&args.file)
        .map_err(|e| LookupError::Client(format!("cannot read {}: {e}", args.file.display())))?;

    let name = args.name.clone().unwrap_or_else(|| file_stem(&args.file));
    let query = CandidateQuery::parse(&name)?;
    let source_url = args
        .url
        .clone()
        .unwrap_or_else(|| args.file.display().to_string());

    let fields = extract_document(&bytes)?;
    Ok(assemble(&query, &source_url, &fields))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace(['_', '-'], " "))
        .unwrap_or_default()
}

/// Record on stdout, or the error object on stderr with a failing exit code.
fn print_outcome(outcome: Result<CandidateRecord, LookupError>) -> Result<ExitCode> {
    match outcome {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}", serde_json::to_string_pretty(&ErrorPayload::from(&e))?);
            Ok(ExitCode::FAILURE)
        }
    }
}
