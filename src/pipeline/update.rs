// src/pipeline/update.rs

//! Package manager refreshes.

use tracing::info;

use crate::errors::Result;
use crate::exec::ToolInvocation;
use crate::pipeline::PipelineContext;

async fn run_steps(ctx: &PipelineContext, base: &[String], subcommands: &[&str]) -> Result<()> {
    for sub in subcommands {
        let mut argv = base.to_vec();
        argv.push(sub.to_string());
        ctx.tools
            .run(ToolInvocation::new(argv, ctx.config.root()))
            .await?;
    }
    Ok(())
}

pub async fn update_bower(ctx: &PipelineContext) -> Result<()> {
    run_steps(ctx, &ctx.config.tools.bower, &["install", "prune", "update"]).await?;
    info!("Bower Update Complete");
    Ok(())
}

pub async fn update_bundle(ctx: &PipelineContext) -> Result<()> {
    run_steps(ctx, &ctx.config.tools.bundle, &["install", "update"]).await?;
    info!("Bundle Update Complete");
    Ok(())
}
