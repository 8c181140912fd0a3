//! Write a starter config file

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::info;

/// Create `config.toml` under `base_dir` (default `~/.vidpulse`)
pub async fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<Config> {
    let mut config = Config::default();
    config.init_paths(base_dir);

    if config.is_initialized() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config.paths.config_file.display()
        )));
    }

    config.save()?;
    info!("Initialized vidpulse in {}", config.paths.base_dir.display());
    Ok(config)
}
