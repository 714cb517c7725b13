// src/config/mod.rs

//! Configuration for sitepipe.
//!
//! Responsibilities:
//! - Define the TOML-backed overlay and the immutable [`BuildConfig`] (`model.rs`).
//! - Derive the path/glob table from folder constants (`paths.rs`).
//! - Load an optional config file from disk (`loader.rs`).
//! - Validate the overlay before it becomes a `BuildConfig` (`validate.rs`).

pub mod loader;
pub mod model;
pub mod paths;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, resolve_config};
pub use model::{
    BuildConfig, BuildFlags, ImageSettings, ImageSource, RawConfigFile, ScriptSettings,
    ServerSettings, StyleSettings, ToolCommands, WatchSettings,
};
pub use paths::{PathSettings, PathTable};
