// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::config::BuildFlags;

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build the site's styles, scripts, images and fonts, run Jekyll, and serve with live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run (e.g. `build`, `clean`, `serve`, `update`, `build:styles`).
    #[arg(value_name = "TASK", default_value = "default")]
    pub task: String,

    /// Minify styles and scripts and leave out dev-only tooling.
    #[arg(long)]
    pub production: bool,

    /// Include `_drafts` in the Jekyll build and watch them in `serve`.
    #[arg(long)]
    pub drafts: bool,

    /// Path to an optional config file (TOML) overriding the built-in paths,
    /// image table, tool commands and server address.
    ///
    /// Default: `Sitepipe.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the execution plan for TASK without running it.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the task table and exit.
    #[arg(long)]
    pub list: bool,
}

impl CliArgs {
    pub fn flags(&self) -> BuildFlags {
        BuildFlags {
            production: self.production,
            drafts: self.drafts,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_defaults_to_default_and_flags_are_off() {
        let args = CliArgs::parse_from(["sitepipe"]);
        assert_eq!(args.task, "default");
        assert!(!args.production);
        assert!(!args.drafts);
    }

    #[test]
    fn reads_task_and_both_flags() {
        let args = CliArgs::parse_from(["sitepipe", "serve", "--drafts", "--production"]);
        assert_eq!(args.task, "serve");
        let flags = args.flags();
        assert!(flags.production);
        assert!(flags.drafts);
    }
}
