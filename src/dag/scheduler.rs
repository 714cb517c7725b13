// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::plan::ExecutionPlan;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::task_info::{RunState, ScheduledTask, TaskRunState};
use crate::engine::{TaskName, TaskOutcome};

/// Per-run state machine over an [`ExecutionPlan`].
///
/// It is responsible for:
/// - dispatching steps whose predecessors all succeeded
/// - marking steps as succeeded/failed
/// - blocking every step downstream of a failure
/// - noticing when the run is over
///
/// Steps already running when a sibling fails are left to finish.
#[derive(Debug, Default)]
pub struct Scheduler {
    plan: Option<ExecutionPlan>,
    states: HashMap<TaskName, RunState>,
    run_counter: u64,
    current_run_id: Option<u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    /// Identifier of the most recently started run (0 before the first).
    pub fn last_run_id(&self) -> u64 {
        self.run_counter
    }

    /// Read-only view of the given task's state in the current (or last) run.
    pub fn run_state_of(&self, task: &str) -> TaskRunState {
        self.states.get(task).copied().into()
    }

    /// Start a new run over `plan` and return the steps that can start
    /// immediately.
    ///
    /// Must only be called while idle; a busy scheduler ignores the plan.
    pub fn start_run(&mut self, plan: ExecutionPlan) -> SchedulerStep {
        if let Some(run_id) = self.current_run_id {
            warn!(run_id, "start_run called while a run is active; ignoring");
            return SchedulerStep::default();
        }

        self.run_counter += 1;
        let run_id = self.run_counter;
        self.current_run_id = Some(run_id);
        self.states = plan
            .order()
            .iter()
            .map(|name| (name.clone(), RunState::Pending))
            .collect();
        self.plan = Some(plan);

        info!(run_id, targets = ?self.plan.as_ref().map(|p| p.targets()), "starting run");

        let mut step = SchedulerStep {
            newly_scheduled: self.collect_ready(run_id),
            ..SchedulerStep::default()
        };
        self.maybe_finish_run(&mut step);
        step
    }

    /// Record the outcome of a running step.
    pub fn handle_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        let Some(run_id) = self.current_run_id else {
            debug!(task, "completion while idle; ignoring");
            return step;
        };

        match self.states.get(task) {
            Some(RunState::Running) => {}
            other => {
                debug!(task, state = ?other, "completion for a step that is not running; ignoring");
                return step;
            }
        }

        match outcome {
            TaskOutcome::Success => {
                debug!(task, run_id, "step succeeded");
                self.states.insert(task.to_string(), RunState::DoneSuccess);
                step.newly_scheduled = self.collect_ready(run_id);
            }
            TaskOutcome::Failed(ref reason) => {
                warn!(task, run_id, %reason, "step failed; blocking its dependents");
                self.states.insert(task.to_string(), RunState::DoneFailed);
                step.newly_failed.push(task.to_string());
                step.newly_failed.extend(self.block_dependents(task));
            }
        }

        self.maybe_finish_run(&mut step);
        step
    }

    /// Move every pending step whose predecessors all succeeded to
    /// `Running` and return them in plan order.
    fn collect_ready(&mut self, run_id: u64) -> Vec<ScheduledTask> {
        let Some(plan) = self.plan.as_ref() else {
            return Vec::new();
        };

        let mut ready = Vec::new();
        for plan_step in plan.steps() {
            if self.states.get(&plan_step.name) != Some(&RunState::Pending) {
                continue;
            }
            let satisfied = plan_step
                .predecessors
                .iter()
                .all(|p| self.states.get(p) == Some(&RunState::DoneSuccess));
            if satisfied {
                ready.push(ScheduledTask {
                    name: plan_step.name.clone(),
                    action: plan_step.action,
                    run_id,
                });
            }
        }

        for task in ready.iter() {
            self.states.insert(task.name.clone(), RunState::Running);
        }
        ready
    }

    /// Fail every pending step downstream of `failed`.
    fn block_dependents(&mut self, failed: &str) -> Vec<TaskName> {
        let Some(plan) = self.plan.as_ref() else {
            return Vec::new();
        };

        let mut blocked = Vec::new();
        let mut stack: Vec<TaskName> = plan.dependents_of(failed).into_iter().cloned().collect();
        while let Some(name) = stack.pop() {
            if self.states.get(&name) != Some(&RunState::Pending) {
                continue;
            }
            self.states.insert(name.clone(), RunState::DoneFailed);
            stack.extend(plan.dependents_of(&name).into_iter().cloned());
            blocked.push(name);
        }
        blocked
    }

    fn maybe_finish_run(&mut self, step: &mut SchedulerStep) {
        if !self.states.values().all(|s| s.is_terminal()) {
            return;
        }

        let failed = self.states.values().any(|s| *s == RunState::DoneFailed);
        info!(run_id = ?self.current_run_id, failed, "run finished");

        self.current_run_id = None;
        self.plan = None;
        step.run_just_finished = true;
        step.run_failed = failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::TaskRegistry;

    fn plan(targets: &[&str]) -> ExecutionPlan {
        let reg = TaskRegistry::standard().unwrap();
        ExecutionPlan::for_targets(&reg, targets).unwrap()
    }

    fn names(tasks: &[ScheduledTask]) -> Vec<&str> {
        tasks.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn clean_steps_start_first_then_assets() {
        let mut s = Scheduler::new();
        let first = s.start_run(plan(&["build"]));
        let mut started = names(&first.newly_scheduled);
        started.sort();
        assert_eq!(
            started,
            vec!["clean:fonts", "clean:images", "clean:jekyll", "clean:scripts", "clean:styles"]
        );

        let mut scheduled = Vec::new();
        for t in first.newly_scheduled {
            scheduled.extend(s.handle_completion(&t.name, TaskOutcome::Success).newly_scheduled);
        }
        // `clean` itself becomes ready only after all five.
        assert_eq!(names(&scheduled), vec!["clean"]);
        assert_eq!(s.run_state_of("build:jekyll"), TaskRunState::Pending);
    }

    #[test]
    fn failure_blocks_dependents_but_not_siblings() {
        let mut s = Scheduler::new();
        let first = s.start_run(plan(&["build:jekyll:watch", "build:styles"]));
        let mut started = names(&first.newly_scheduled);
        started.sort();
        assert_eq!(started, vec!["build:jekyll", "build:styles"]);

        let step = s.handle_completion("build:jekyll", TaskOutcome::Failed("exit 1".into()));
        assert_eq!(step.newly_failed, vec!["build:jekyll", "build:jekyll:watch"]);
        assert!(!step.run_just_finished);
        assert_eq!(s.run_state_of("build:styles"), TaskRunState::Running);

        let step = s.handle_completion("build:styles", TaskOutcome::Success);
        assert!(step.run_just_finished);
        assert!(step.run_failed);
        assert!(s.is_idle());
    }

    #[test]
    fn completions_for_unknown_or_idle_tasks_are_ignored() {
        let mut s = Scheduler::new();
        let step = s.handle_completion("build", TaskOutcome::Success);
        assert!(step.newly_scheduled.is_empty());

        s.start_run(plan(&["build:styles"]));
        let step = s.handle_completion("build:scripts", TaskOutcome::Success);
        assert!(step.newly_scheduled.is_empty() && !step.run_just_finished);
        assert_eq!(s.current_run_id(), Some(1));
    }

    #[test]
    fn run_ids_increase_per_run() {
        let mut s = Scheduler::new();
        let step = s.start_run(plan(&["build:styles"]));
        assert_eq!(step.newly_scheduled[0].run_id, 1);
        s.handle_completion("build:styles", TaskOutcome::Success);
        let step = s.start_run(plan(&["build:styles"]));
        assert_eq!(step.newly_scheduled[0].run_id, 2);
    }
}
