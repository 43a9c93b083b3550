//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Candidate disclosure lookup service.
#[derive(Debug, Parser)]
#[command(name = "disclosure", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file; missing is fine, defaults and env still apply.
    #[arg(short, long, global = true, env = "DISCLOSURE_CONFIG", default_value = "disclosure.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the JSON API (default)
    Serve(ServeArgs),

    /// Look up one candidate and print the record
    Lookup(LookupArgs),

    /// Extract fields from a saved disclosure page
    Extract(ExtractArgs),
}

#[derive(Debug, Default, Parser)]
pub struct ServeArgs {
    /// Port to listen on, overriding `server.port`
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Interface to bind, overriding `server.host`
    #[arg(long)]
    pub host: Option<String>,
}

#[derive(Debug, Parser)]
pub struct LookupArgs {
    /// Candidate name, e.g. "Hema Malini"
    pub name: String,
}

#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Path to an HTML file
    pub file: PathBuf,

    /// Name to fall back on when the page has no title; defaults to the file stem
    #[arg(short, long)]
    pub name: Option<String>,

    /// Source URL to record; defaults to the file path
    #[arg(short, long)]
    pub url: Option<String>,
}

impl Command {
    /// The subcommand to run when none is given.
    pub fn or_default(command: Option<Command>) -> Command {
        command.unwrap_or_else(|| Command::Serve(ServeArgs::default()))
    }
}
