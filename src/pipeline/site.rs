// src/pipeline/site.rs

use tracing::{debug, error};

use crate::config::BuildConfig;
use crate::errors::Result;
use crate::exec::ToolInvocation;
use crate::pipeline::PipelineContext;

/// The Jekyll build invocation, with `--drafts` when drafts are on.
pub fn jekyll_invocation(cfg: &BuildConfig) -> ToolInvocation {
    let mut argv = cfg.tools.jekyll.clone();
    if cfg.flags().drafts {
        argv.push("--drafts".to_string());
    }
    ToolInvocation::new(argv, cfg.root())
}

pub async fn build_jekyll(ctx: &PipelineContext) -> Result<()> {
    let output = ctx
        .tools
        .run(jekyll_invocation(&ctx.config))
        .await
        .inspect_err(|e| error!(error = %e, "jekyll build failed"))?;

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!(tool = "jekyll", "{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildFlags;

    #[test]
    fn drafts_flag_appends_drafts() {
        let cfg = BuildConfig::from_flags(
            "/site",
            BuildFlags {
                production: false,
                drafts: true,
            },
        );
        let argv = jekyll_invocation(&cfg).argv;
        assert_eq!(argv.first().map(String::as_str), Some("bundle"));
        assert_eq!(argv.last().map(String::as_str), Some("--drafts"));

        let plain = BuildConfig::from_flags("/site", BuildFlags::default());
        assert!(!jekyll_invocation(&plain).argv.contains(&"--drafts".to_string()));
    }
}
