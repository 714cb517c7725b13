// src/watch/patterns.rs

use anyhow::Context;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::BuildConfig;
use crate::config::paths::normalize_pattern;
use crate::engine::TaskName;
use crate::errors::Result;

const JEKYLL_WATCH: &str = "build:jekyll:watch";

/// A set of globs that, when a changed file matches, triggers one task.
#[derive(Debug, Clone)]
pub struct WatchRule {
    task: TaskName,
    patterns: Vec<String>,
    include: GlobSet,
    exclude: GlobSet,
}

fn glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid watch pattern: {pattern}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

impl WatchRule {
    pub fn new(task: &str, patterns: &[String], excludes: &[String]) -> Result<Self> {
        let patterns: Vec<String> = patterns.iter().map(|p| normalize_pattern(p)).collect();
        let excludes: Vec<String> = excludes.iter().map(|p| normalize_pattern(p)).collect();
        Ok(Self {
            task: task.to_string(),
            include: glob_set(&patterns)?,
            exclude: glob_set(&excludes)?,
            patterns,
        })
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// `rel` is a `/`-separated path relative to the project root.
    pub fn matches(&self, rel: &str) -> bool {
        self.include.is_match(rel) && !self.exclude.is_match(rel)
    }
}

/// The site's watch table, derived from the path table and flags.
pub fn build_watch_rules(cfg: &BuildConfig) -> Result<Vec<WatchRule>> {
    let p = cfg.paths();
    let jekyll = |file: &str| format!("{}{}", p.jekyll_dir, file);

    let mut rules = vec![
        WatchRule::new(
            JEKYLL_WATCH,
            &[jekyll("_config.yml"), jekyll("_app/localhost_config.yml")],
            &[],
        )?,
        WatchRule::new("build:styles", &[p.app_sass_files_glob.clone()], &[])?,
        WatchRule::new("build:scripts:watch", &[p.app_js_files_glob.clone()], &[])?,
        WatchRule::new(JEKYLL_WATCH, &[p.jekyll_post_files_glob.clone()], &[])?,
    ];

    if cfg.flags().drafts {
        rules.push(WatchRule::new(
            JEKYLL_WATCH,
            &[p.jekyll_draft_files_glob.clone()],
            &[],
        )?);
    }

    rules.push(WatchRule::new(
        JEKYLL_WATCH,
        &[p.jekyll_html_files_glob.clone()],
        &[p.site_html_files_glob.clone()],
    )?);
    rules.push(WatchRule::new(
        JEKYLL_WATCH,
        &[
            jekyll("feed.xml"),
            jekyll("_data/**/*.{yml,yaml,csv,json}"),
            jekyll("favicon.ico"),
        ],
        &[],
    )?);

    Ok(rules)
}

/// Tasks triggered by a change to `rel`, each at most once, in rule order.
pub fn tasks_for_path(rules: &[WatchRule], rel: &str) -> Vec<TaskName> {
    let mut tasks: Vec<TaskName> = Vec::new();
    for rule in rules.iter().filter(|r| r.matches(rel)) {
        if !tasks.iter().any(|t| t == rule.task()) {
            tasks.push(rule.task().to_string());
        }
    }
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildFlags;

    fn rules(drafts: bool) -> Vec<WatchRule> {
        let cfg = BuildConfig::from_flags(
            "/site",
            BuildFlags {
                production: false,
                drafts,
            },
        );
        build_watch_rules(&cfg).unwrap()
    }

    #[test]
    fn asset_changes_map_to_their_pipelines() {
        let r = rules(false);
        assert_eq!(tasks_for_path(&r, "_app/styles/base/_reset.scss"), vec!["build:styles"]);
        assert_eq!(tasks_for_path(&r, "_app/scripts/nav.js"), vec!["build:scripts:watch"]);
        assert_eq!(tasks_for_path(&r, "_posts/2016-01-01-hello.md"), vec![JEKYLL_WATCH]);
        assert_eq!(tasks_for_path(&r, "_data/team.yml"), vec![JEKYLL_WATCH]);
        assert_eq!(tasks_for_path(&r, "_config.yml"), vec![JEKYLL_WATCH]);
    }

    #[test]
    fn generated_site_html_is_ignored() {
        let r = rules(false);
        assert_eq!(tasks_for_path(&r, "_layouts/default.html"), vec![JEKYLL_WATCH]);
        assert!(tasks_for_path(&r, "_site/index.html").is_empty());
        assert!(tasks_for_path(&r, "_site/blog/post.html").is_empty());
        assert!(tasks_for_path(&r, "main.css").is_empty());
    }

    #[test]
    fn drafts_are_watched_only_with_the_flag() {
        assert!(tasks_for_path(&rules(false), "_drafts/idea.md").is_empty());
        assert_eq!(tasks_for_path(&rules(true), "_drafts/idea.md"), vec![JEKYLL_WATCH]);
    }
}
