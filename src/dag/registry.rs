// src/dag/registry.rs

//! The site's fixed task table.

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::engine::TaskName;
use crate::errors::{Result, SitepipeError};
use crate::serve::ReloadEvent;

/// Which outputs a `clean:*` task deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanTarget {
    Styles,
    Scripts,
    Images,
    Fonts,
    Jekyll,
}

/// The work a task performs once its dependencies and sequence are done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Pure grouping task.
    None,
    Styles,
    Scripts,
    Images,
    Jekyll,
    Clean(CleanTarget),
    /// Notify connected browsers.
    Reload(ReloadEvent),
    /// Marker for the dev-server task; the server itself is started by the
    /// caller once the plan has finished.
    Serve,
    UpdateBower,
    UpdateBundle,
    NormalizeCss,
    FontelloCss,
    FontelloFonts,
}

/// One named task.
///
/// Execution order within a task: all `deps` (concurrently), then each
/// `sequence` phase in order (tasks inside a phase concurrently), then the
/// task's own `action`.
#[derive(Debug, Clone)]
pub struct TaskDef {
    pub name: TaskName,
    pub deps: Vec<TaskName>,
    pub sequence: Vec<Vec<TaskName>>,
    pub action: TaskAction,
    pub description: &'static str,
}

impl TaskDef {
    fn new(name: &str, action: TaskAction, description: &'static str) -> Self {
        Self {
            name: name.to_string(),
            deps: Vec::new(),
            sequence: Vec::new(),
            action,
            description,
        }
    }

    fn deps(mut self, deps: &[&str]) -> Self {
        self.deps = deps.iter().map(|d| d.to_string()).collect();
        self
    }

    fn then(mut self, phase: &[&str]) -> Self {
        self.sequence.push(phase.iter().map(|d| d.to_string()).collect());
        self
    }

    /// Every task this one references, through `deps` or `sequence`.
    pub fn referenced(&self) -> impl Iterator<Item = &TaskName> {
        self.deps.iter().chain(self.sequence.iter().flatten())
    }
}

fn standard_defs() -> Vec<TaskDef> {
    use TaskAction as A;

    vec![
        TaskDef::new("build:styles", A::Styles, "Compile Sass, add vendor prefixes, write main.css"),
        TaskDef::new("clean:styles", A::Clean(CleanTarget::Styles), "Delete main.css"),
        TaskDef::new("build:scripts", A::Scripts, "Concatenate (and minify) scripts into main.js"),
        TaskDef::new("clean:scripts", A::Clean(CleanTarget::Scripts), "Delete main.js"),
        TaskDef::new("build:images", A::Images, "Generate responsive image variants"),
        TaskDef::new("clean:images", A::Clean(CleanTarget::Images), "Delete generated images"),
        TaskDef::new("build:fonts", A::None, "Place icon fonts in the output roots").deps(&["fontello:fonts"]),
        TaskDef::new("clean:fonts", A::Clean(CleanTarget::Fonts), "Delete placed fonts"),
        TaskDef::new("build:jekyll", A::Jekyll, "Run the Jekyll build"),
        TaskDef::new("clean:jekyll", A::Clean(CleanTarget::Jekyll), "Delete the generated site"),
        TaskDef::new("clean", A::None, "Delete every generated output").deps(&[
            "clean:jekyll",
            "clean:fonts",
            "clean:images",
            "clean:scripts",
            "clean:styles",
        ]),
        TaskDef::new("build", A::None, "Clean, build all assets, then run Jekyll")
            .then(&["clean"])
            .then(&["build:scripts", "build:images", "build:styles", "build:fonts"])
            .then(&["build:jekyll"]),
        TaskDef::new("default", A::None, "Alias for build").deps(&["build"]),
        TaskDef::new(
            "build:jekyll:watch",
            A::Reload(ReloadEvent::Full),
            "Run Jekyll, then reload browsers",
        )
        .deps(&["build:jekyll"]),
        TaskDef::new(
            "build:scripts:watch",
            A::Reload(ReloadEvent::Full),
            "Build scripts, then reload browsers",
        )
        .deps(&["build:scripts"]),
        TaskDef::new("serve", A::Serve, "Build, serve the site and rebuild on change").deps(&["build"]),
        TaskDef::new("update:bower", A::UpdateBower, "bower install, prune and update"),
        TaskDef::new("update:bundle", A::UpdateBundle, "bundle install and update"),
        TaskDef::new("normalize-css", A::NormalizeCss, "Copy normalize.css into the Sass base partials"),
        TaskDef::new("fontello:css", A::FontelloCss, "Copy the Fontello stylesheet as a Sass partial"),
        TaskDef::new("fontello:fonts", A::FontelloFonts, "Copy Fontello font files into the output roots"),
        TaskDef::new("fontello", A::None, "Place all Fontello files").deps(&["fontello:css", "fontello:fonts"]),
        TaskDef::new("update", A::None, "Update packages, refresh vendored partials and rebuild")
            .deps(&["update:bower", "update:bundle"])
            .then(&["normalize-css"])
            .then(&["build"]),
    ]
}

/// Validated, immutable task table keyed by task name.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, TaskDef>,
}

impl TaskRegistry {
    /// The site's built-in task table.
    pub fn standard() -> Result<Self> {
        Self::from_defs(standard_defs())
    }

    /// Build a registry, rejecting duplicate names, unknown or self
    /// references, and cycles.
    pub fn from_defs(defs: Vec<TaskDef>) -> Result<Self> {
        let mut tasks = BTreeMap::new();
        for def in defs {
            if tasks.contains_key(&def.name) {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{}' is defined more than once",
                    def.name
                )));
            }
            tasks.insert(def.name.clone(), def);
        }

        let registry = Self { tasks };
        registry.validate_references()?;
        registry.validate_acyclic()?;
        Ok(registry)
    }

    fn validate_references(&self) -> Result<()> {
        for (name, def) in self.tasks.iter() {
            for dep in def.referenced() {
                if !self.tasks.contains_key(dep) {
                    return Err(SitepipeError::TaskNotFound(format!(
                        "'{dep}' (referenced by task '{name}')"
                    )));
                }
                if dep == name {
                    return Err(SitepipeError::ConfigError(format!(
                        "task '{name}' cannot depend on itself"
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_acyclic(&self) -> Result<()> {
        // Edge direction: referenced -> referencing task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.tasks.keys() {
            graph.add_node(name.as_str());
        }
        for (name, def) in self.tasks.iter() {
            for dep in def.referenced() {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        toposort(&graph, None).map(|_| ()).map_err(|cycle| {
            SitepipeError::DagCycle(format!(
                "cycle detected in task table involving task '{}'",
                cycle.node_id()
            ))
        })
    }

    pub fn get(&self, name: &str) -> Option<&TaskDef> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// All tasks, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &TaskDef> {
        self.tasks.values()
    }
}
