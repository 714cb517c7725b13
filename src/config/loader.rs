// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{BuildConfig, BuildFlags, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw overlay.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file, validate it and build the immutable
/// [`BuildConfig`] rooted at the file's directory.
pub fn load_and_validate(path: impl AsRef<Path>, flags: BuildFlags) -> Result<BuildConfig> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    BuildConfig::try_from((raw, config_root_dir(path), flags))
}

/// Resolve the configuration for a CLI invocation.
///
/// - An explicit path must exist.
/// - Otherwise `Sitepipe.toml` in the current directory is used if present,
///   and the built-in defaults rooted at the current directory if not.
pub fn resolve_config(explicit: Option<&Path>, flags: BuildFlags) -> Result<BuildConfig> {
    if let Some(path) = explicit {
        return load_and_validate(path, flags);
    }

    let default_path = default_config_path();
    if default_path.is_file() {
        debug!(path = ?default_path, "loading default config file");
        return load_and_validate(&default_path, flags);
    }

    debug!("no config file found; using built-in defaults");
    BuildConfig::try_from((RawConfigFile::default(), current_dir(), flags))
}

/// Default config file location: `Sitepipe.toml` in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Sitepipe.toml")
}

/// Project root for a config path.
///
/// - A non-empty parent (e.g. "site/Sitepipe.toml") is the root.
/// - A bare filename falls back to the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => current_dir(),
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
