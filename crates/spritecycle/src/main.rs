mod cli;
mod input;
mod paths;
mod run;
mod settings;
mod view;

use std::path::Path;

use anyhow::Result;
use cli::{Command, ConfigAction};
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Config(config_cmd)) => {
            handle_config_command(config_cmd.action, cli.config.as_deref())
        }
        None => run::run(cli.run, cli.config.as_deref()),
    }
}

fn handle_config_command(action: ConfigAction, config_file: Option<&Path>) -> Result<()> {
    let paths = AppPaths::discover()?;
    let path = settings::config_path(&paths, config_file);

    match action {
        ConfigAction::Where => {
            println!("Configuration:");
            println!("  dir:   {}", paths.config_dir().display());
            if path.exists() {
                println!("  file:  {}", path.display());
            } else {
                println!("  file:  {} (not present; defaults in use)", path.display());
            }
        }
        ConfigAction::Show => {
            let config = settings::load_config(&path, config_file.is_some())?;
            print!("{}", config.to_toml_string()?);
        }
    }
    Ok(())
}
