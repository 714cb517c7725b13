// src/pipeline/styles.rs

//! Sass compilation followed by vendor prefixing.

use tracing::{debug, error};

use crate::config::BuildConfig;
use crate::config::paths::normalize_pattern;
use crate::errors::Result;
use crate::exec::ToolInvocation;
use crate::pipeline::PipelineContext;
use crate::pipeline::output::write_to_output_roots;
use crate::serve::ReloadEvent;

/// `--style` value handed to Sass.
pub fn output_style(cfg: &BuildConfig) -> &'static str {
    if cfg.flags().production {
        "compressed"
    } else {
        "expanded"
    }
}

/// The Sass invocation for the configured entry stylesheet.
pub fn sass_invocation(cfg: &BuildConfig) -> ToolInvocation {
    let paths = cfg.paths();
    let mut argv = cfg.tools.sass.clone();
    argv.push("--no-source-map".to_string());
    argv.push(format!("--style={}", output_style(cfg)));
    argv.push(format!("--load-path={}", normalize_pattern(&paths.app_sass_files)));
    for extra in cfg.styles.bower_load_paths.iter() {
        let dir = normalize_pattern(&format!("{}{}", paths.bower_components_dir, extra));
        argv.push(format!("--load-path={dir}"));
    }
    argv.push(normalize_pattern(&format!(
        "{}/{}",
        paths.app_sass_files, cfg.styles.entry
    )));
    ToolInvocation::new(argv, cfg.root())
}

/// The prefixer invocation, or `None` when prefixing is disabled.
pub fn autoprefixer_invocation(cfg: &BuildConfig, css: Vec<u8>) -> Option<ToolInvocation> {
    if cfg.tools.autoprefixer.is_empty() {
        return None;
    }
    let browsers = cfg.styles.browsers.join(", ");
    Some(
        ToolInvocation::new(cfg.tools.autoprefixer.clone(), cfg.root())
            .env("BROWSERSLIST", &browsers)
            .stdin(css),
    )
}

pub async fn build_styles(ctx: &PipelineContext) -> Result<()> {
    let css = compile(ctx).await.inspect_err(|e| {
        error!(error = %e, "stylesheet build failed");
    })?;
    write_to_output_roots(ctx, &ctx.config.styles.output, &css)?;
    ctx.notify(ReloadEvent::Css);
    Ok(())
}

async fn compile(ctx: &PipelineContext) -> Result<Vec<u8>> {
    let cfg = &ctx.config;
    let compiled = ctx.tools.run(sass_invocation(cfg)).await?.stdout;
    debug!(bytes = compiled.len(), "sass finished");

    match autoprefixer_invocation(cfg, compiled.clone()) {
        Some(invocation) => Ok(ctx.tools.run(invocation).await?.stdout),
        None => {
            debug!("autoprefixer disabled");
            Ok(compiled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildFlags;

    #[test]
    fn dev_build_uses_expanded_output_and_all_load_paths() {
        let cfg = BuildConfig::from_flags("/site", BuildFlags::default());
        let inv = sass_invocation(&cfg);
        assert_eq!(
            inv.argv,
            vec![
                "sass",
                "--no-source-map",
                "--style=expanded",
                "--load-path=_app/styles",
                "--load-path=_app/bower_components/bourbon/app/assets/stylesheets",
                "--load-path=_app/bower_components/neat/app/assets/stylesheets",
                "--load-path=_app/bower_components/font-awesome/scss",
                "_app/styles/main.scss",
            ]
        );
        assert_eq!(inv.cwd, std::path::PathBuf::from("/site"));
    }

    #[test]
    fn production_build_compresses() {
        let flags = BuildFlags {
            production: true,
            drafts: false,
        };
        let cfg = BuildConfig::from_flags("/site", flags);
        assert!(sass_invocation(&cfg).argv.contains(&"--style=compressed".to_string()));
    }

    #[test]
    fn prefixer_gets_browser_list_and_css_on_stdin() {
        let cfg = BuildConfig::from_flags("/site", BuildFlags::default());
        let inv = autoprefixer_invocation(&cfg, b"a{}".to_vec()).unwrap();
        assert_eq!(
            inv.env,
            vec![("BROWSERSLIST".to_string(), "last 2 versions, ie >= 10".to_string())]
        );
        assert_eq!(inv.stdin.as_deref(), Some(&b"a{}"[..]));
    }

    #[test]
    fn empty_prefixer_command_skips_the_stage() {
        let mut cfg = BuildConfig::from_flags("/site", BuildFlags::default());
        cfg.tools.autoprefixer.clear();
        assert!(autoprefixer_invocation(&cfg, Vec::new()).is_none());
    }
}
