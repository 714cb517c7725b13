// src/pipeline/fonts.rs

use tracing::warn;

use crate::errors::Result;
use crate::fs::collect_glob;
use crate::pipeline::PipelineContext;
use crate::pipeline::output::write_into;

/// Glob of the Fontello font files, relative to the project root.
pub fn fontello_font_glob(ctx: &PipelineContext) -> String {
    format!("{}/fontello*/font/*.*", ctx.config.paths().app_vendor_files)
}

/// Copy every Fontello font file, flattened, into both font directories.
pub fn place_fonts(ctx: &PipelineContext) -> Result<()> {
    let cfg = &ctx.config;
    let paths = cfg.paths();
    let dirs = [
        cfg.resolve(&paths.jekyll_font_files),
        cfg.resolve(&paths.site_font_files),
    ];

    let files = collect_glob(ctx.fs.as_ref(), cfg.root(), &fontello_font_glob(ctx))?;
    if files.is_empty() {
        warn!(pattern = %fontello_font_glob(ctx), "no font files found");
    }

    for file in files {
        let Some(name) = file.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let data = ctx.fs.read(&file)?;
        write_into(ctx, &dirs, &name, &data)?;
    }
    Ok(())
}
