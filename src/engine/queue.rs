// src/engine/queue.rs

use std::collections::{BTreeSet, VecDeque};

use tracing::{debug, warn};

use crate::engine::TaskName;
use crate::types::TriggerWhileRunningBehaviour;

/// Triggers that arrive while a run is executing.
///
/// Each queued entry is a *batch* of task names that will become the
/// targets of one future run.
///
/// - `Queue`: a trigger opens a new batch while fewer than `max_runs`
///   batches exist, and otherwise merges into the newest batch. Nothing is
///   dropped; at worst triggers are coalesced.
/// - `Cancel`: every previously queued batch is dropped and only the latest
///   trigger is kept.
#[derive(Debug)]
pub struct TriggerQueue {
    behaviour: TriggerWhileRunningBehaviour,
    max_runs: usize,
    runs: VecDeque<BTreeSet<TaskName>>,
}

impl TriggerQueue {
    /// `max_runs` is clamped to at least 1.
    pub fn new(behaviour: TriggerWhileRunningBehaviour, max_runs: usize) -> Self {
        Self {
            behaviour,
            max_runs: max_runs.max(1),
            runs: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of queued batches.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn behaviour(&self) -> TriggerWhileRunningBehaviour {
        self.behaviour
    }

    /// Record that a task was triggered while a run is in progress.
    pub fn record_trigger(&mut self, task: &str) {
        let name = task.to_string();

        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                if self.runs.len() < self.max_runs {
                    debug!(task = %name, batches = self.runs.len() + 1, "queued trigger in a new batch");
                    self.runs.push_back(BTreeSet::from([name]));
                } else if let Some(last) = self.runs.back_mut() {
                    let inserted = last.insert(name.clone());
                    debug!(task = %name, inserted, "queue full; merged trigger into newest batch");
                }
            }
            TriggerWhileRunningBehaviour::Cancel => {
                if !self.runs.is_empty() {
                    warn!(task = %name, dropped = self.runs.len(), "dropping queued batches (cancel mode)");
                }
                self.runs.clear();
                self.runs.push_back(BTreeSet::from([name]));
            }
        }
    }

    /// Take the oldest queued batch, if any.
    pub fn next_batch(&mut self) -> Option<Vec<TaskName>> {
        self.runs.pop_front().map(|batch| batch.into_iter().collect())
    }
}
