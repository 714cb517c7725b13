// src/pipeline/output.rs

use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::Result;
use crate::pipeline::PipelineContext;

/// Write `contents` as `file_name` into every directory of `dirs`.
pub fn write_into(
    ctx: &PipelineContext,
    dirs: &[PathBuf],
    file_name: &str,
    contents: &[u8],
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let path = dir.join(file_name);
        ctx.fs.write(&path, contents)?;
        info!(path = %display_rel(ctx, &path), bytes = contents.len(), "wrote");
        written.push(path);
    }
    Ok(written)
}

/// Write a bundle (`main.css`, `main.js`) into both output roots.
pub fn write_to_output_roots(
    ctx: &PipelineContext,
    file_name: &str,
    contents: &[u8],
) -> Result<Vec<PathBuf>> {
    write_into(ctx, &ctx.config.output_roots(), file_name, contents)
}

/// Path relative to the project root, for log lines.
pub fn display_rel(ctx: &PipelineContext, path: &Path) -> String {
    path.strip_prefix(ctx.config.root())
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
