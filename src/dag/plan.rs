// src/dag/plan.rs

//! Expansion of requested targets into an explicit DAG of steps.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::registry::{TaskAction, TaskRegistry};
use crate::engine::TaskName;
use crate::errors::{Result, SitepipeError};

/// One step of a plan: a task plus every step that must succeed first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub name: TaskName,
    pub action: TaskAction,
    pub predecessors: BTreeSet<TaskName>,
}

/// A resolved, acyclic set of steps for one run.
///
/// Each task appears at most once, however many times it is reachable.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    targets: Vec<TaskName>,
    steps: BTreeMap<TaskName, PlanStep>,
    order: Vec<TaskName>,
}

impl ExecutionPlan {
    /// Expand `targets` against the registry.
    ///
    /// - A task waits for the whole closure of its `deps`.
    /// - Sequence phase N waits for the task's deps and all earlier phases.
    ///   A step reached again in a later phase keeps its earlier place.
    /// - The task itself runs after its deps and every phase.
    pub fn for_targets<S: AsRef<str>>(registry: &TaskRegistry, targets: &[S]) -> Result<Self> {
        let mut expander = Expander {
            registry,
            preds: BTreeMap::new(),
            closures: HashMap::new(),
        };

        let mut target_names = Vec::with_capacity(targets.len());
        for target in targets {
            let target = target.as_ref();
            expander.expand(target)?;
            target_names.push(target.to_string());
        }

        let steps: BTreeMap<TaskName, PlanStep> = expander
            .preds
            .into_iter()
            .map(|(name, predecessors)| {
                let action = registry
                    .get(&name)
                    .map(|def| def.action)
                    .unwrap_or(TaskAction::None);
                (
                    name.clone(),
                    PlanStep {
                        name,
                        action,
                        predecessors,
                    },
                )
            })
            .collect();

        let order = topological_order(&steps)?;

        Ok(Self {
            targets: target_names,
            steps,
            order,
        })
    }

    pub fn targets(&self) -> &[TaskName] {
        &self.targets
    }

    /// Steps in a valid execution order.
    pub fn order(&self) -> &[TaskName] {
        &self.order
    }

    pub fn step(&self, name: &str) -> Option<&PlanStep> {
        self.steps.get(name)
    }

    pub fn steps(&self) -> impl Iterator<Item = &PlanStep> {
        self.order.iter().filter_map(|n| self.steps.get(n))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps that list `name` as a predecessor.
    pub fn dependents_of(&self, name: &str) -> Vec<&TaskName> {
        self.steps
            .values()
            .filter(|s| s.predecessors.contains(name))
            .map(|s| &s.name)
            .collect()
    }
}

struct Expander<'a> {
    registry: &'a TaskRegistry,
    preds: BTreeMap<TaskName, BTreeSet<TaskName>>,
    /// Every step a task's expansion produced, the task included.
    closures: HashMap<TaskName, BTreeSet<TaskName>>,
}

impl Expander<'_> {
    fn expand(&mut self, name: &str) -> Result<BTreeSet<TaskName>> {
        if let Some(closure) = self.closures.get(name) {
            return Ok(closure.clone());
        }

        let def = self
            .registry
            .get(name)
            .ok_or_else(|| SitepipeError::TaskNotFound(name.to_string()))?;

        self.preds.entry(name.to_string()).or_default();

        let mut before: BTreeSet<TaskName> = BTreeSet::new();
        for dep in def.deps.iter() {
            let closure = self.expand(dep)?;
            before.extend(closure);
        }

        for phase in def.sequence.iter() {
            let mut phase_steps = BTreeSet::new();
            for member in phase {
                phase_steps.extend(self.expand(member)?);
            }
            for step in phase_steps.difference(&before) {
                self.preds
                    .entry(step.clone())
                    .or_default()
                    .extend(before.iter().cloned());
            }
            before.extend(phase_steps);
        }

        self.preds
            .entry(name.to_string())
            .or_default()
            .extend(before.iter().cloned());

        let mut closure = before;
        closure.insert(name.to_string());
        self.closures.insert(name.to_string(), closure.clone());
        Ok(closure)
    }
}

fn topological_order(steps: &BTreeMap<TaskName, PlanStep>) -> Result<Vec<TaskName>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for name in steps.keys() {
        graph.add_node(name.as_str());
    }
    for step in steps.values() {
        for pred in step.predecessors.iter() {
            graph.add_edge(pred.as_str(), step.name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(SitepipeError::DagCycle(format!(
            "cycle detected in execution plan involving task '{}'",
            cycle.node_id()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(plan: &ExecutionPlan, name: &str) -> usize {
        plan.order()
            .iter()
            .position(|n| n == name)
            .unwrap_or_else(|| panic!("{name} not in plan"))
    }

    #[test]
    fn build_runs_clean_then_assets_then_jekyll() {
        let reg = TaskRegistry::standard().unwrap();
        let plan = ExecutionPlan::for_targets(&reg, &["build"]).unwrap();

        let clean = position(&plan, "clean");
        for asset in ["build:scripts", "build:images", "build:styles", "build:fonts", "fontello:fonts"] {
            assert!(clean < position(&plan, asset), "{asset} must follow clean");
            assert!(position(&plan, asset) < position(&plan, "build:jekyll"));
        }
        assert_eq!(plan.order().last().map(String::as_str), Some("build"));
    }

    #[test]
    fn assets_in_one_phase_do_not_wait_for_each_other() {
        let reg = TaskRegistry::standard().unwrap();
        let plan = ExecutionPlan::for_targets(&reg, &["build"]).unwrap();

        let styles = plan.step("build:styles").unwrap();
        assert!(!styles.predecessors.contains("build:scripts"));
        assert!(styles.predecessors.contains("clean:jekyll"));
        assert_eq!(plan.step("fontello:fonts").unwrap().predecessors.len(), 6);
    }

    #[test]
    fn single_pipeline_target_has_no_clean() {
        let reg = TaskRegistry::standard().unwrap();
        let plan = ExecutionPlan::for_targets(&reg, &["build:styles"]).unwrap();
        assert_eq!(plan.order(), ["build:styles".to_string()]);
    }

    #[test]
    fn update_builds_after_normalize_css() {
        let reg = TaskRegistry::standard().unwrap();
        let plan = ExecutionPlan::for_targets(&reg, &["update"]).unwrap();

        let normalize = position(&plan, "normalize-css");
        assert!(position(&plan, "update:bower") < normalize);
        assert!(position(&plan, "update:bundle") < normalize);
        assert!(normalize < position(&plan, "clean:styles"));
        assert!(position(&plan, "build") < position(&plan, "update"));
    }

    #[test]
    fn watch_task_reloads_after_its_pipeline() {
        let reg = TaskRegistry::standard().unwrap();
        let plan = ExecutionPlan::for_targets(&reg, &["build:jekyll:watch", "build:styles"]).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(
            plan.dependents_of("build:jekyll"),
            vec![&"build:jekyll:watch".to_string()]
        );
    }

    #[test]
    fn unknown_target_is_reported() {
        let reg = TaskRegistry::standard().unwrap();
        assert!(matches!(
            ExecutionPlan::for_targets(&reg, &["deploy"]),
            Err(SitepipeError::TaskNotFound(name)) if name == "deploy"
        ));
    }
}
