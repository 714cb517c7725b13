// src/pipeline/scripts.rs

use tracing::{debug, error, warn};

use crate::errors::Result;
use crate::exec::ToolInvocation;
use crate::fs::collect_glob;
use crate::pipeline::PipelineContext;
use crate::pipeline::output::write_to_output_roots;

/// Concatenate the sorted app scripts, plus the tota11y toolbar on dev
/// builds when it is enabled.
pub fn concat_scripts(ctx: &PipelineContext) -> Result<String> {
    let cfg = &ctx.config;
    let paths = cfg.paths();

    let mut parts = Vec::new();
    for file in collect_glob(ctx.fs.as_ref(), cfg.root(), &paths.app_js_files_glob)? {
        debug!(path = ?file, "adding script");
        parts.push(ctx.fs.read_to_string(&file)?);
    }

    if !cfg.flags().production && cfg.scripts.dev_tota11y {
        let tota11y = cfg.resolve(&paths.tota11y);
        if ctx.fs.is_file(&tota11y) {
            parts.push(ctx.fs.read_to_string(&tota11y)?);
        } else {
            warn!(path = ?tota11y, "tota11y not found; building without it");
        }
    }

    Ok(parts.join("\n"))
}

pub async fn build_scripts(ctx: &PipelineContext) -> Result<()> {
    let bundle = concat_scripts(ctx)?.into_bytes();
    let cfg = &ctx.config;

    let bundle = if cfg.flags().production {
        let invocation = ToolInvocation::new(cfg.tools.uglify.clone(), cfg.root()).stdin(bundle);
        ctx.tools
            .run(invocation)
            .await
            .inspect_err(|e| error!(error = %e, "minification failed"))?
            .stdout
    } else {
        bundle
    };

    write_to_output_roots(ctx, &cfg.scripts.output, &bundle)?;
    Ok(())
}
