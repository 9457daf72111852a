use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossbeam_channel::{after, never, select, unbounded, Receiver};
use provider::{HttpProvider, LocalProvider, ResourceProvider};
use scheduler::SessionRuntime;
use spriteconfig::SpriteConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::input::{parse_line, Input};
use crate::paths::AppPaths;
use crate::settings;
use crate::view::ConsoleView;

pub fn run(args: RunArgs, config_file: Option<&Path>) -> Result<()> {
    let paths = AppPaths::discover()?;
    let path = settings::config_path(&paths, config_file);
    let config = settings::load_config(&path, config_file.is_some())?;
    let config = settings::apply_overrides(config, &args)?;
    tracing::debug!(
        config = %path.display(),
        interval = ?config.session.animation_interval,
        workers = config.session.workers,
        "resolved spritecycle configuration"
    );

    let provider = build_provider(&config)?;
    let initial = args
        .name
        .clone()
        .unwrap_or_else(|| config.session.default_name.clone());

    let runtime = SessionRuntime::spawn(config.session.clone(), provider, ConsoleView::stdout())
        .context("failed to start session runtime")?;
    tracing::info!(name = %initial, "starting spritecycle session");
    runtime.request(initial)?;
    runtime.become_visible()?;

    let lines = spawn_stdin_reader()?;
    drive(&runtime, &lines, args.run_for)?;

    runtime
        .shutdown()
        .context("session runtime did not shut down cleanly")
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn build_provider(config: &SpriteConfig) -> Result<Arc<dyn ResourceProvider>> {
    if let Some(root) = &config.provider.local_root {
        if !root.is_dir() {
            bail!("local resource directory {} does not exist", root.display());
        }
        tracing::info!(root = %root.display(), "serving resources from local directory");
        return Ok(Arc::new(LocalProvider::new(root.clone())));
    }

    let provider = HttpProvider::new(&config.provider.api_base, config.provider.timeout)
        .context("failed to construct http provider")?;
    tracing::info!(api_base = %config.provider.api_base, "using http provider");
    Ok(Arc::new(provider))
}

fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("spritecycle-stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%err, "failed to read standard input");
                        break;
                    }
                }
            }
        })
        .context("failed to spawn stdin reader")?;
    Ok(rx)
}

/// Feeds input lines to the runtime until `:quit`, end of input, or the
/// `--run-for` deadline. With a deadline set, closed input keeps the session
/// running until it passes.
fn drive(
    runtime: &SessionRuntime,
    lines: &Receiver<String>,
    run_for: Option<Duration>,
) -> Result<()> {
    let deadline = run_for.map(after).unwrap_or_else(never);
    let mut input_open = true;
    loop {
        let input = if input_open { lines.clone() } else { never() };
        select! {
            recv(input) -> line => match line {
                Ok(line) => match parse_line(&line) {
                    Input::Request(name) => runtime.request(name)?,
                    Input::Show => runtime.become_visible()?,
                    Input::Hide => runtime.become_hidden()?,
                    Input::Quit => {
                        tracing::info!("quit requested");
                        return Ok(());
                    }
                    Input::Unknown(command) => {
                        tracing::warn!(%command, "unknown command; expected :show, :hide or :quit");
                    }
                },
                Err(_) => {
                    if run_for.is_none() {
                        tracing::debug!("input closed; stopping");
                        return Ok(());
                    }
                    input_open = false;
                }
            },
            recv(deadline) -> _ => {
                tracing::info!("run time elapsed; stopping");
                return Ok(());
            }
        }
    }
}
