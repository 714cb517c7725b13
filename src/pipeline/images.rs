// src/pipeline/images.rs

//! Responsive image variants.
//!
//! Each configured source is resized to every listed width and encoded in
//! every listed format. Variants are named `{name}_{width}.{format}` after
//! the nominal width, while the pixel width is `round(width * scale)`.
//! Images are never enlarged.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;

use anyhow::Context;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use tracing::{debug, info, warn};

use crate::config::ImageSource;
use crate::errors::{Result, SitepipeError};
use crate::fs::collect_glob;
use crate::pipeline::PipelineContext;
use crate::pipeline::output::{display_rel, write_into};
use crate::types::{ImageFormat, MissingImagePolicy};

/// One output file derived from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageVariant {
    pub file_name: String,
    /// Nominal width, as it appears in the file name.
    pub width: u32,
    /// Target pixel width before the no-enlargement clamp.
    pub pixel_width: u32,
    pub format: ImageFormat,
    pub quality: u8,
}

/// Pixel width for a nominal width and scale factor.
pub fn pixel_width(width: u32, scale: f64) -> u32 {
    ((width as f64) * scale).round().max(1.0) as u32
}

/// The widths × formats cross product for one source, widths outermost.
pub fn variants(source: &ImageSource) -> Vec<ImageVariant> {
    let base = source.name.rsplit('/').next().unwrap_or(&source.name);
    source
        .widths
        .iter()
        .flat_map(|&width| {
            source.formats.iter().map(move |&format| ImageVariant {
                file_name: format!("{base}_{width}.{}", format.extension()),
                width,
                pixel_width: pixel_width(width, source.scale),
                format,
                quality: source.quality,
            })
        })
        .collect()
}

/// Decode `bytes` and encode every variant. CPU bound; run it off the async
/// workers.
pub fn render_variants(bytes: &[u8], variants: &[ImageVariant]) -> Result<Vec<(String, Vec<u8>)>> {
    let img = image::load_from_memory(bytes)?;
    let mut out = Vec::with_capacity(variants.len());
    for variant in variants {
        let resized = resize_to(&img, variant.pixel_width);
        let encoded = encode(&resized, variant.format, variant.quality)?;
        out.push((variant.file_name.clone(), encoded));
    }
    Ok(out)
}

fn resize_to(img: &DynamicImage, target: u32) -> DynamicImage {
    if target >= img.width() {
        return img.clone();
    }
    let height = ((img.height() as u64 * target as u64) / img.width() as u64).max(1) as u32;
    img.resize_exact(target, height, FilterType::Lanczos3)
}

fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        ImageFormat::Jpg => {
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, quality).write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
        ImageFormat::Png => {
            let rgba = img.to_rgba8();
            PngEncoder::new(&mut buf).write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        ImageFormat::Webp => {
            let rgba = img.to_rgba8();
            WebPEncoder::new_lossless(&mut buf).write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
    }
    Ok(buf.into_inner())
}

/// Source files under `app_image_files`, keyed by their relative path
/// including the extension (`team/portrait.jpg`).
fn find_sources(ctx: &PipelineContext) -> Result<HashMap<String, PathBuf>> {
    let cfg = &ctx.config;
    let paths = cfg.paths();
    let base = cfg.resolve(&paths.app_image_files);

    let mut found = HashMap::new();
    for path in collect_glob(ctx.fs.as_ref(), cfg.root(), &paths.app_image_files_glob)? {
        let Ok(rel) = path.strip_prefix(&base) else {
            continue;
        };
        let key = rel.to_string_lossy().replace('\\', "/");
        found.insert(key, path);
    }
    Ok(found)
}

pub async fn build_images(ctx: &PipelineContext) -> Result<()> {
    let cfg = &ctx.config;
    let paths = cfg.paths();
    let dirs = [
        cfg.resolve(&paths.jekyll_image_files),
        cfg.resolve(&paths.site_image_files),
    ];
    let sources = find_sources(ctx)?;

    for source in cfg.images.sources.iter() {
        let Some(path) = sources.get(&source.file_name()) else {
            match cfg.images.missing_source {
                MissingImagePolicy::Error => {
                    return Err(SitepipeError::MissingImage(source.file_name()));
                }
                MissingImagePolicy::Warn => {
                    warn!(source = %source.file_name(), "image source missing; skipping");
                    continue;
                }
            }
        };

        let bytes = ctx.fs.read(path)?;
        let planned = variants(source);
        debug!(source = %source.name, variants = planned.len(), "rendering image");

        let rendered = tokio::task::spawn_blocking(move || render_variants(&bytes, &planned))
            .await
            .context("image worker panicked")??;

        for (file_name, data) in rendered {
            for written in write_into(ctx, &dirs, &file_name, &data)? {
                info!(
                    source = %source.file_name(),
                    path = %display_rel(ctx, &written),
                    bytes = data.len(),
                    "image variant"
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn source(widths: &[u32], formats: &[ImageFormat], scale: f64) -> ImageSource {
        ImageSource::new("hero-cropped", "jpg", widths, formats, 60, scale)
    }

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 40])));
        encode(&img, ImageFormat::Jpg, 90).unwrap()
    }

    #[test]
    fn names_follow_nominal_width_and_format() {
        let names: Vec<_> = variants(&source(&[400, 800], &[ImageFormat::Jpg, ImageFormat::Webp], 1.0))
            .into_iter()
            .map(|v| v.file_name)
            .collect();
        assert_eq!(
            names,
            vec!["hero-cropped_400.jpg", "hero-cropped_400.webp", "hero-cropped_800.jpg", "hero-cropped_800.webp"]
        );
    }

    #[test]
    fn scale_changes_pixels_not_names() {
        let v = variants(&source(&[320, 1440], &[ImageFormat::Jpg], 1.1));
        assert_eq!(v[0].file_name, "hero-cropped_320.jpg");
        assert_eq!(v[0].pixel_width, 352);
        assert_eq!(v[1].pixel_width, 1584);
    }

    #[test]
    fn never_enlarges_small_sources() {
        let v = variants(&source(&[40, 400], &[ImageFormat::Png], 1.0));
        let out = render_variants(&jpeg(100, 50), &v).unwrap();

        let small = image::load_from_memory(&out[0].1).unwrap();
        assert_eq!((small.width(), small.height()), (40, 20));
        let big = image::load_from_memory(&out[1].1).unwrap();
        assert_eq!(big.width(), 100);
    }

    #[test]
    fn webp_output_decodes() {
        let v = variants(&source(&[32], &[ImageFormat::Webp], 1.0));
        let out = render_variants(&jpeg(64, 64), &v).unwrap();
        let decoded = image::load_from_memory(&out[0].1).unwrap();
        assert_eq!(decoded.width(), 32);
    }
}
