// src/pipeline/vendor.rs

//! Copies of third-party stylesheets into the Sass base partials.

use std::path::Path;

use tracing::{info, warn};

use crate::config::paths::normalize_pattern;
use crate::errors::Result;
use crate::fs::collect_glob;
use crate::pipeline::PipelineContext;

fn copy(ctx: &PipelineContext, from: &Path, to: &Path) -> Result<()> {
    let data = ctx.fs.read(from)?;
    ctx.fs.write(to, &data)?;
    info!(from = ?from, to = ?to, bytes = data.len(), "copied");
    Ok(())
}

fn base_partial(ctx: &PipelineContext, name: &str) -> std::path::PathBuf {
    ctx.config
        .resolve(&format!("{}/base/{name}", ctx.config.paths().app_sass_files))
}

/// `bower_components/normalize.css/normalize.css` → `styles/base/_reset.scss`.
pub fn normalize_css(ctx: &PipelineContext) -> Result<()> {
    let paths = ctx.config.paths();
    let src = ctx.config.resolve(&normalize_pattern(&format!(
        "{}normalize.css/normalize.css",
        paths.bower_components_dir
    )));
    if !ctx.fs.is_file(&src) {
        warn!(path = ?src, "normalize.css not installed; nothing to copy");
        return Ok(());
    }
    copy(ctx, &src, &base_partial(ctx, "_reset.scss"))
}

/// `vendor/fontello*/css/fontello.css` → `styles/base/_fontello.scss`.
pub fn fontello_css(ctx: &PipelineContext) -> Result<()> {
    let pattern = format!("{}/fontello*/css/fontello.css", ctx.config.paths().app_vendor_files);
    let found = collect_glob(ctx.fs.as_ref(), ctx.config.root(), &pattern)?;
    let Some(src) = found.first() else {
        warn!(%pattern, "no fontello stylesheet found");
        return Ok(());
    };
    if found.len() > 1 {
        warn!(count = found.len(), using = ?src, "several fontello packages; using the first");
    }
    copy(ctx, src, &base_partial(ctx, "_fontello.scss"))
}
