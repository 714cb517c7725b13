// src/pipeline/mod.rs

//! The work behind each task action.
//!
//! Every pipeline reads and writes through the [`FileSystem`] seam and runs
//! external programs through the [`ToolRunner`] seam, both carried by a
//! shared [`PipelineContext`].

use std::sync::Arc;

use tracing::debug;

use crate::config::BuildConfig;
use crate::dag::TaskAction;
use crate::errors::Result;
use crate::exec::ToolRunner;
use crate::fs::FileSystem;
use crate::serve::{ReloadEvent, ReloadHub};

pub mod clean;
pub mod fonts;
pub mod images;
pub mod output;
pub mod scripts;
pub mod site;
pub mod styles;
pub mod update;
pub mod vendor;

/// Everything a pipeline needs, shared read-only between concurrent steps.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub config: Arc<BuildConfig>,
    pub fs: Arc<dyn FileSystem>,
    pub tools: Arc<dyn ToolRunner>,
    /// Present only while the dev server runs.
    pub reload: Option<ReloadHub>,
}

impl PipelineContext {
    pub fn new(
        config: Arc<BuildConfig>,
        fs: Arc<dyn FileSystem>,
        tools: Arc<dyn ToolRunner>,
    ) -> Self {
        Self {
            config,
            fs,
            tools,
            reload: None,
        }
    }

    pub fn with_reload(mut self, hub: ReloadHub) -> Self {
        self.reload = Some(hub);
        self
    }

    /// Push a reload to connected browsers, if any.
    pub fn notify(&self, event: ReloadEvent) {
        match &self.reload {
            Some(hub) => hub.notify(event),
            None => debug!(?event, "no dev server; reload skipped"),
        }
    }
}

/// Run the pipeline behind `action`.
pub async fn run_action(action: TaskAction, ctx: &PipelineContext) -> Result<()> {
    match action {
        TaskAction::None | TaskAction::Serve => Ok(()),
        TaskAction::Styles => styles::build_styles(ctx).await,
        TaskAction::Scripts => scripts::build_scripts(ctx).await,
        TaskAction::Images => images::build_images(ctx).await,
        TaskAction::Jekyll => site::build_jekyll(ctx).await,
        TaskAction::Clean(target) => clean::clean(ctx, target).await,
        TaskAction::Reload(event) => {
            ctx.notify(event);
            Ok(())
        }
        TaskAction::UpdateBower => update::update_bower(ctx).await,
        TaskAction::UpdateBundle => update::update_bundle(ctx).await,
        TaskAction::NormalizeCss => vendor::normalize_css(ctx),
        TaskAction::FontelloCss => vendor::fontello_css(ctx),
        TaskAction::FontelloFonts => fonts::place_fonts(ctx),
    }
}
