use crate::commands::Out;
use crate::{Config, Result};
use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};

/// Writes a configuration file with the default settings to `path`, or to
/// [`Config::default_path`] when `path` is `None`.
///
/// # Errors
/// - A file already exists at the target path.
/// - The platform has no configuration directory and no path was given.
pub fn init_config(path: Option<&Path>) -> Result<Out<PathBuf>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::default_path().ok_or_else(|| {
            anyhow!("Unable to find a configuration directory, pass a path to init-config")
        })?,
    };
    let config = Config::create(&path).context("Unable to create the config file")?;
    let written = config.config_path().unwrap_or(&path).to_path_buf();
    Ok(Out::new(
        format!("Wrote default configuration to {}", written.display()),
        written,
    ))
}
