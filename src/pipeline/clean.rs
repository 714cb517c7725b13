// src/pipeline/clean.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::dag::CleanTarget;
use crate::errors::Result;
use crate::pipeline::PipelineContext;

/// Paths a clean target deletes. Files for bundles, whole trees otherwise.
pub fn clean_paths(ctx: &PipelineContext, target: CleanTarget) -> Vec<PathBuf> {
    let cfg = &ctx.config;
    let paths = cfg.paths();
    match target {
        CleanTarget::Styles => cfg
            .output_roots()
            .into_iter()
            .map(|r| r.join(&cfg.styles.output))
            .collect(),
        CleanTarget::Scripts => cfg
            .output_roots()
            .into_iter()
            .map(|r| r.join(&cfg.scripts.output))
            .collect(),
        CleanTarget::Images => vec![
            cfg.resolve(&paths.jekyll_image_files),
            cfg.resolve(&paths.site_image_files),
        ],
        CleanTarget::Fonts => vec![
            cfg.resolve(&paths.jekyll_font_files),
            cfg.resolve(&paths.site_font_files),
        ],
        CleanTarget::Jekyll => vec![cfg.resolve(&paths.site_dir)],
    }
}

/// Delete the outputs of `target`. Recursive removal runs on the blocking
/// pool.
pub async fn clean(ctx: &PipelineContext, target: CleanTarget) -> Result<()> {
    let fs = Arc::clone(&ctx.fs);
    let paths = clean_paths(ctx, target);

    tokio::task::spawn_blocking(move || -> Result<()> {
        for path in paths {
            match target {
                CleanTarget::Styles | CleanTarget::Scripts => fs.remove_file(&path)?,
                _ => fs.remove_dir_all(&path)?,
            }
            info!(?target, path = ?path, "removed");
        }
        Ok(())
    })
    .await
    .context("clean worker panicked")?
}
