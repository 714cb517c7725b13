// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::paths::{PathSettings, PathTable, normalize_pattern};
use crate::types::{ImageFormat, MissingImagePolicy, TriggerWhileRunningBehaviour};

/// Build-time switches read once from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildFlags {
    /// Minify styles/scripts and leave out dev-only tooling.
    pub production: bool,
    /// Include unpublished `_drafts` content.
    pub drafts: bool,
}

/// Optional config file overlay, as read from TOML.
///
/// Every section is optional; missing keys fall back to the built-in site
/// defaults:
///
/// ```toml
/// [paths]
/// site_dir = "public/"
///
/// [images]
/// missing_source = "warn"
///
/// [[images.source]]
/// name = "hero"
/// ext = "jpg"
/// widths = [320, 640]
/// formats = ["jpg", "webp"]
/// quality = 80
///
/// [tools]
/// sass = ["npx", "sass"]
///
/// [server]
/// port = 4000
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfigFile {
    pub paths: PathSettings,
    pub styles: StyleSettings,
    pub scripts: ScriptSettings,
    pub images: ImageSettings,
    pub tools: ToolCommands,
    pub server: ServerSettings,
    pub watch: WatchSettings,
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StyleSettings {
    /// Entry stylesheet inside `app_sass_files`.
    pub entry: String,
    /// Output file name written to both output roots.
    pub output: String,
    /// Extra Sass load paths, relative to the bower components dir.
    pub bower_load_paths: Vec<String>,
    /// Browser targets handed to the vendor prefixer via `BROWSERSLIST`.
    pub browsers: Vec<String>,
}

impl Default for StyleSettings {
    fn default() -> Self {
        Self {
            entry: "main.scss".to_string(),
            output: "main.css".to_string(),
            bower_load_paths: vec![
                "bourbon/app/assets/stylesheets".to_string(),
                "neat/app/assets/stylesheets".to_string(),
                "font-awesome/scss".to_string(),
            ],
            browsers: vec!["last 2 versions".to_string(), "ie >= 10".to_string()],
        }
    }
}

/// `[scripts]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptSettings {
    /// Output file name written to both output roots.
    pub output: String,
    /// Append the tota11y toolbar when not building for production.
    pub dev_tota11y: bool,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            output: "main.js".to_string(),
            dev_tota11y: true,
        }
    }
}

/// One responsive-image source and the variants generated from it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ImageSource {
    /// Path of the source relative to `app_image_files`, without extension.
    pub name: String,
    /// Source file extension.
    pub ext: String,
    /// Nominal widths; these appear in the generated file names.
    pub widths: Vec<u32>,
    pub formats: Vec<ImageFormat>,
    /// Encoder quality (1-100). Only lossy formats use it.
    pub quality: u8,
    /// Multiplier applied to the nominal width to get the pixel width.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

impl ImageSource {
    pub fn new(
        name: &str,
        ext: &str,
        widths: &[u32],
        formats: &[ImageFormat],
        quality: u8,
        scale: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            ext: ext.to_string(),
            widths: widths.to_vec(),
            formats: formats.to_vec(),
            quality,
            scale,
        }
    }

    /// Source file name, e.g. `hero-cropped.jpg`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.ext)
    }
}

/// `[images]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ImageSettings {
    pub missing_source: MissingImagePolicy,
    #[serde(rename = "source")]
    pub sources: Vec<ImageSource>,
}

impl Default for ImageSettings {
    fn default() -> Self {
        use ImageFormat::{Jpg, Png, Webp};

        Self {
            missing_source: MissingImagePolicy::Error,
            sources: vec![
                ImageSource::new("hero-cropped", "jpg", &[320, 640, 800, 1024, 1440], &[Jpg], 60, 1.1),
                ImageSource::new("FrontendMastersScott-closeup", "jpg", &[400, 800], &[Jpg, Webp], 95, 1.0),
                ImageSource::new(
                    "FrontendMastersScott-fullshot",
                    "jpg",
                    &[400, 800, 1600],
                    &[Jpg, Webp],
                    95,
                    1.0,
                ),
                ImageSource::new("FrontendMastersClassroom", "jpg", &[400, 800, 1500], &[Jpg, Webp], 95, 1.0),
                ImageSource::new("AngularComponents", "png", &[250, 490], &[Png], 100, 1.0),
            ],
        }
    }
}

/// `[tools]` section: argv of each external collaborator.
///
/// An empty `autoprefixer` list skips the prefixing stage.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolCommands {
    pub sass: Vec<String>,
    pub autoprefixer: Vec<String>,
    pub uglify: Vec<String>,
    pub jekyll: Vec<String>,
    pub bower: Vec<String>,
    pub bundle: Vec<String>,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

impl Default for ToolCommands {
    fn default() -> Self {
        Self {
            sass: argv(&["sass"]),
            autoprefixer: argv(&["npx", "postcss", "--use", "autoprefixer"]),
            uglify: argv(&["npx", "uglifyjs", "--compress", "--mangle"]),
            jekyll: argv(&[
                "bundle",
                "exec",
                "jekyll",
                "build",
                "--config",
                "_config.yml,_app/localhost_config.yml",
            ]),
            bower: argv(&["bower"]),
            bundle: argv(&["bundle"]),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct WatchSettings {
    /// Only trigger when the changed file's content hash differs from the
    /// last one seen.
    pub use_hash: bool,
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,
    /// Maximum number of queued trigger batches.
    pub queue_length: usize,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            use_hash: false,
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::Queue,
            queue_length: 1,
        }
    }
}

/// Immutable, validated configuration shared (via `Arc`) by every pipeline.
///
/// Only constructed through [`BuildConfig::from_flags`] or
/// `TryFrom<(RawConfigFile, PathBuf, BuildFlags)>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct BuildConfig {
    root: PathBuf,
    flags: BuildFlags,
    paths: PathTable,
    pub styles: StyleSettings,
    pub scripts: ScriptSettings,
    pub images: ImageSettings,
    pub tools: ToolCommands,
    pub server: ServerSettings,
    pub watch: WatchSettings,
}

impl BuildConfig {
    /// Built-in site defaults with the given flags, rooted at `root`.
    pub fn from_flags(root: impl Into<PathBuf>, flags: BuildFlags) -> Self {
        Self::new_unchecked(root.into(), flags, RawConfigFile::default())
    }

    pub(crate) fn new_unchecked(root: PathBuf, flags: BuildFlags, raw: RawConfigFile) -> Self {
        Self {
            root,
            flags,
            paths: PathTable::derive(&raw.paths),
            styles: raw.styles,
            scripts: raw.scripts,
            images: raw.images,
            tools: raw.tools,
            server: raw.server,
            watch: raw.watch,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn flags(&self) -> BuildFlags {
        self.flags
    }

    pub fn paths(&self) -> &PathTable {
        &self.paths
    }

    /// Resolve a path-table entry (possibly empty or slash-prefixed) against
    /// the project root.
    pub fn resolve(&self, rel: &str) -> PathBuf {
        let rel = normalize_pattern(rel);
        if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }

    /// Both output roots, resolved.
    pub fn output_roots(&self) -> Vec<PathBuf> {
        self.paths
            .output_dirs()
            .iter()
            .map(|d| self.resolve(d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_handles_empty_jekyll_dir() {
        let cfg = BuildConfig::from_flags("/site", BuildFlags::default());
        assert_eq!(cfg.resolve(""), PathBuf::from("/site"));
        assert_eq!(cfg.resolve("_site/"), PathBuf::from("/site/_site"));
        assert_eq!(
            cfg.output_roots(),
            vec![PathBuf::from("/site"), PathBuf::from("/site/_site")]
        );
    }

    #[test]
    fn default_image_table_has_five_sources() {
        let images = ImageSettings::default();
        let names: Vec<_> = images.sources.iter().map(|s| s.file_name()).collect();
        assert_eq!(names[0], "hero-cropped.jpg");
        assert_eq!(names[4], "AngularComponents.png");
        assert_eq!(images.sources.len(), 5);
    }
}
