// tests/plan_properties.rs

use std::collections::HashMap;

use proptest::prelude::*;
use sitepipe::dag::{ExecutionPlan, TaskRegistry};

fn task_names() -> Vec<String> {
    TaskRegistry::standard()
        .unwrap()
        .iter()
        .map(|d| d.name.clone())
        .collect()
}

proptest! {
    #[test]
    fn plans_are_topological_and_complete(indices in proptest::collection::vec(any::<prop::sample::Index>(), 1..4)) {
        let registry = TaskRegistry::standard().unwrap();
        let names = task_names();
        let targets: Vec<String> = indices.iter().map(|i| names[i.index(names.len())].clone()).collect();

        let plan = ExecutionPlan::for_targets(&registry, &targets).unwrap();
        let position: HashMap<&str, usize> = plan
            .order()
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();

        // Each step once.
        prop_assert_eq!(position.len(), plan.len());

        for target in targets.iter() {
            prop_assert!(plan.contains(target));
        }

        for step in plan.steps() {
            for pred in step.predecessors.iter() {
                prop_assert!(position[pred.as_str()] < position[step.name.as_str()]);
            }
            // Every dependency of a task is a predecessor of it.
            let def = registry.get(&step.name).unwrap();
            for dep in def.referenced() {
                prop_assert!(step.predecessors.contains(dep), "{} must wait for {}", step.name, dep);
            }
        }
    }
}
