use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "spritecycle",
    author,
    version,
    about = "Fetches a sprite set and cycles through its images",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Configuration file to use instead of the discovered `config.toml`.
    #[arg(long, global = true, value_name = "FILE", env = "SPRITECYCLE_CONFIG")]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Resource to request on startup (defaults to `session.default_name`).
    #[arg(value_name = "NAME")]
    pub name: Option<String>,

    /// Serve resources from a local directory instead of the HTTP API.
    #[arg(long, value_name = "DIR")]
    pub local: Option<PathBuf>,

    /// Base url of a PokeAPI-compatible endpoint.
    #[arg(long, value_name = "URL", env = "SPRITECYCLE_API_BASE")]
    pub api_base: Option<String>,

    /// Time between animation frames (e.g. `500ms`, `1s`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub interval: Option<Duration>,

    /// How long the invalid-input signal stays up.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub flash: Option<Duration>,

    /// Worker threads used for provider calls.
    #[arg(long, value_name = "COUNT")]
    pub workers: Option<usize>,

    /// Send names to the provider exactly as typed, apart from trimming.
    #[arg(long)]
    pub preserve_case: bool,

    /// Exit after this long instead of waiting for `:quit` or end of input.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub run_for: Option<Duration>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect the resolved configuration.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the configuration file location.
    Where,
    /// Print the effective configuration as TOML.
    Show,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("duration must not be empty".to_string());
    }
    let duration = humantime::parse_duration(trimmed)
        .map_err(|err| format!("invalid duration '{trimmed}': {err}"))?;
    if duration.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(duration)
}
