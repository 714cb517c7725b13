// src/config/validate.rs

use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::model::{BuildConfig, BuildFlags, RawConfigFile};
use crate::errors::{Result, SitepipeError};

impl TryFrom<(RawConfigFile, PathBuf, BuildFlags)> for BuildConfig {
    type Error = SitepipeError;

    fn try_from(
        (raw, root, flags): (RawConfigFile, PathBuf, BuildFlags),
    ) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw, flags)?;
        Ok(BuildConfig::new_unchecked(root, flags, raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile, flags: BuildFlags) -> Result<()> {
    validate_images(cfg)?;
    validate_tools(cfg, flags)?;
    validate_watch(cfg)?;
    Ok(())
}

fn validate_images(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();

    for source in cfg.images.sources.iter() {
        if !seen.insert(source.file_name()) {
            return Err(SitepipeError::ConfigError(format!(
                "image '{}' is configured more than once",
                source.file_name()
            )));
        }
        if source.widths.is_empty() || source.widths.contains(&0) {
            return Err(SitepipeError::ConfigError(format!(
                "image '{}' needs at least one width and all widths must be > 0",
                source.name
            )));
        }
        if source.formats.is_empty() {
            return Err(SitepipeError::ConfigError(format!(
                "image '{}' needs at least one output format",
                source.name
            )));
        }
        if !(1..=100).contains(&source.quality) {
            return Err(SitepipeError::ConfigError(format!(
                "image '{}' quality must be within 1..=100 (got {})",
                source.name, source.quality
            )));
        }
        if !(source.scale.is_finite() && source.scale > 0.0) {
            return Err(SitepipeError::ConfigError(format!(
                "image '{}' scale must be a positive number (got {})",
                source.name, source.scale
            )));
        }
    }
    Ok(())
}

fn validate_tools(cfg: &RawConfigFile, flags: BuildFlags) -> Result<()> {
    for (key, argv) in [("sass", &cfg.tools.sass), ("jekyll", &cfg.tools.jekyll)] {
        if argv.is_empty() {
            return Err(SitepipeError::ConfigError(format!(
                "[tools].{key} must name a command"
            )));
        }
    }
    if flags.production && cfg.tools.uglify.is_empty() {
        return Err(SitepipeError::ConfigError(
            "[tools].uglify must name a command for --production builds".to_string(),
        ));
    }
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.queue_length == 0 {
        return Err(SitepipeError::ConfigError(
            "[watch].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::ImageSource;
    use crate::types::ImageFormat;

    fn build(raw: RawConfigFile, flags: BuildFlags) -> Result<BuildConfig> {
        BuildConfig::try_from((raw, PathBuf::from("."), flags))
    }

    #[test]
    fn defaults_are_valid_in_both_modes() {
        assert!(build(RawConfigFile::default(), BuildFlags::default()).is_ok());
        let prod = BuildFlags {
            production: true,
            drafts: true,
        };
        assert!(build(RawConfigFile::default(), prod).is_ok());
    }

    #[test]
    fn rejects_zero_width_and_bad_quality() {
        let mut raw = RawConfigFile::default();
        raw.images.sources = vec![ImageSource::new("a", "jpg", &[0], &[ImageFormat::Jpg], 60, 1.0)];
        assert!(matches!(
            build(raw, BuildFlags::default()),
            Err(SitepipeError::ConfigError(msg)) if msg.contains("widths")
        ));

        let mut raw = RawConfigFile::default();
        raw.images.sources = vec![ImageSource::new("a", "jpg", &[10], &[ImageFormat::Jpg], 0, 1.0)];
        assert!(matches!(
            build(raw, BuildFlags::default()),
            Err(SitepipeError::ConfigError(msg)) if msg.contains("quality")
        ));
    }

    #[test]
    fn rejects_duplicate_image_sources() {
        let mut raw = RawConfigFile::default();
        let src = ImageSource::new("a", "jpg", &[10], &[ImageFormat::Jpg], 60, 1.0);
        raw.images.sources = vec![src.clone(), src];
        assert!(build(raw, BuildFlags::default()).is_err());
    }

    #[test]
    fn production_requires_a_minifier() {
        let mut raw = RawConfigFile::default();
        raw.tools.uglify.clear();
        assert!(build(raw.clone(), BuildFlags::default()).is_ok());
        let prod = BuildFlags {
            production: true,
            drafts: false,
        };
        assert!(matches!(
            build(raw, prod),
            Err(SitepipeError::ConfigError(msg)) if msg.contains("uglify")
        ));
    }

    #[test]
    fn rejects_zero_queue_length() {
        let mut raw = RawConfigFile::default();
        raw.watch.queue_length = 0;
        assert!(build(raw, BuildFlags::default()).is_err());
    }
}
