use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use spriteconfig::{NameCase, SpriteConfig};

use crate::cli::RunArgs;
use crate::paths::AppPaths;

/// Picks the configuration file: an explicit path wins over the discovered one.
pub fn config_path(paths: &AppPaths, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths.config_file())
}

/// Loads the configuration at `path`. A missing discovered file yields the
/// defaults; a missing explicit file is an error.
pub fn load_config(path: &Path, explicit: bool) -> Result<SpriteConfig> {
    if !path.exists() {
        if explicit {
            bail!("configuration file {} does not exist", path.display());
        }
        tracing::debug!(path = %path.display(), "no configuration file; using defaults");
        return Ok(SpriteConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration at {}", path.display()))?;
    let config = SpriteConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to load configuration at {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

/// Layers command-line flags over the file configuration and re-validates.
pub fn apply_overrides(mut config: SpriteConfig, args: &RunArgs) -> Result<SpriteConfig> {
    if let Some(root) = &args.local {
        config.provider.local_root = Some(root.clone());
    }
    if let Some(api_base) = &args.api_base {
        config.provider.api_base = api_base.clone();
    }
    if let Some(interval) = args.interval {
        config.session.animation_interval = interval;
    }
    if let Some(flash) = args.flash {
        config.session.error_flash = flash;
    }
    if let Some(workers) = args.workers {
        config.session.workers = workers;
    }
    if args.preserve_case {
        config.session.name_case = NameCase::Preserve;
    }
    config
        .validate()
        .context("invalid configuration after applying command-line flags")?;
    Ok(config)
}
