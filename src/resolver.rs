//! # Dependency Resolver
//!
//! Pure ordering of a candidate step set: every predecessor of a step that
//! is itself in the candidate set comes out strictly earlier. Predecessor
//! ids outside the set (filtered-out or deleted steps) are silently
//! dropped, and the reserved "no predecessor" sentinel is skipped.
//!
//! Both functions are deterministic given identical input ordering and have
//! no side effects. [`order_steps`] tolerates cyclic predecessor chains: a
//! visited guard prevents infinite recursion, at the cost of only a
//! best-effort partial order on the steps inside the cycle.
//! [`order_steps_strict`] rejects such inputs instead, naming the ids on
//! the detected cycle; it is the administrative validation entry point.

use std::collections::{HashMap, HashSet};

use crate::constants::NO_PREDECESSOR_ID;
use crate::error::{ChangeoverError, Result};
use crate::models::StepDefinition;

/// Order candidates so that every in-set predecessor precedes its
/// dependents. Cyclic chains degrade to a best-effort order.
pub fn order_steps(candidates: &[StepDefinition]) -> Vec<StepDefinition> {
    let by_id: HashMap<i64, &StepDefinition> =
        candidates.iter().map(|step| (step.id, step)).collect();
    let mut visited = HashSet::with_capacity(candidates.len());
    let mut ordered = Vec::with_capacity(candidates.len());

    for step in candidates {
        visit(step, &by_id, &mut visited, &mut ordered);
    }
    ordered
}

fn visit(
    step: &StepDefinition,
    by_id: &HashMap<i64, &StepDefinition>,
    visited: &mut HashSet<i64>,
    ordered: &mut Vec<StepDefinition>,
) {
    // Marked before recursing: the guard against cyclic predecessor chains.
    if !visited.insert(step.id) {
        return;
    }
    for predecessor_id in step.real_predecessors() {
        if let Some(predecessor) = by_id.get(&predecessor_id) {
            visit(predecessor, by_id, visited, ordered);
        }
    }
    ordered.push(step.clone());
}

/// Like [`order_steps`], but rejects candidate sets whose in-set
/// predecessor relation is cyclic.
pub fn order_steps_strict(candidates: &[StepDefinition]) -> Result<Vec<StepDefinition>> {
    if let Some(step_ids) = find_cycle(candidates) {
        return Err(ChangeoverError::DependencyCycle { step_ids });
    }
    Ok(order_steps(candidates))
}

/// Ids on one predecessor cycle inside the candidate set, if any.
fn find_cycle(candidates: &[StepDefinition]) -> Option<Vec<i64>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InStack,
        Done,
    }

    fn dfs(
        step: &StepDefinition,
        by_id: &HashMap<i64, &StepDefinition>,
        marks: &mut HashMap<i64, Mark>,
        stack: &mut Vec<i64>,
    ) -> Option<Vec<i64>> {
        marks.insert(step.id, Mark::InStack);
        stack.push(step.id);
        for predecessor_id in step.real_predecessors() {
            let Some(predecessor) = by_id.get(&predecessor_id) else {
                continue;
            };
            match marks.get(&predecessor_id) {
                Some(Mark::Done) => {}
                Some(Mark::InStack) => {
                    let start = stack
                        .iter()
                        .position(|&id| id == predecessor_id)
                        .unwrap_or(0);
                    return Some(stack[start..].to_vec());
                }
                None => {
                    if let Some(cycle) = dfs(predecessor, by_id, marks, stack) {
                        return Some(cycle);
                    }
                }
            }
        }
        stack.pop();
        marks.insert(step.id, Mark::Done);
        None
    }

    let by_id: HashMap<i64, &StepDefinition> =
        candidates.iter().map(|step| (step.id, step)).collect();
    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    for step in candidates {
        if !marks.contains_key(&step.id) {
            if let Some(cycle) = dfs(step, &by_id, &mut marks, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn step(id: i64, predecessors: Vec<i64>) -> StepDefinition {
        StepDefinition {
            id,
            label: format!("step-{id}"),
            work_group: "press".into(),
            role: "operator".into(),
            phase: "internal".into(),
            estimated_secs: 60,
            description: String::new(),
            predecessors,
            successors: vec![],
            precondition: None,
        }
    }

    fn position(ordered: &[StepDefinition], id: i64) -> usize {
        ordered.iter().position(|s| s.id == id).unwrap()
    }

    #[test]
    fn test_predecessors_come_first() {
        let candidates = vec![step(3, vec![1, 2]), step(2, vec![1]), step(1, vec![])];
        let ordered = order_steps(&candidates);
        assert_eq!(ordered.len(), 3);
        assert!(position(&ordered, 1) < position(&ordered, 2));
        assert!(position(&ordered, 2) < position(&ordered, 3));
    }

    #[test]
    fn test_sentinel_and_out_of_set_ids_are_ignored() {
        let candidates = vec![
            step(10, vec![NO_PREDECESSOR_ID]),
            step(11, vec![99, 10]), // 99 is not a candidate
        ];
        let ordered = order_steps(&candidates);
        assert_eq!(
            ordered.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![10, 11]
        );
    }

    #[test]
    fn test_deterministic_for_identical_input_order() {
        let candidates = vec![step(5, vec![]), step(4, vec![]), step(6, vec![4])];
        assert_eq!(order_steps(&candidates), order_steps(&candidates));
    }

    #[test]
    fn test_cycle_terminates_best_effort() {
        let candidates = vec![step(1, vec![2]), step(2, vec![1]), step(3, vec![2])];
        let ordered = order_steps(&candidates);
        // All steps present exactly once despite the 1 <-> 2 cycle.
        let mut ids: Vec<i64> = ordered.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_strict_rejects_cycles() {
        let candidates = vec![step(1, vec![2]), step(2, vec![1])];
        let err = order_steps_strict(&candidates).unwrap_err();
        match err {
            ChangeoverError::DependencyCycle { mut step_ids } => {
                step_ids.sort_unstable();
                assert_eq!(step_ids, vec![1, 2]);
            }
            other => panic!("expected DependencyCycle, got {other:?}"),
        }
    }

    #[test]
    fn test_strict_accepts_out_of_set_references() {
        let candidates = vec![step(1, vec![77]), step(2, vec![1])];
        let ordered = order_steps_strict(&candidates).unwrap();
        assert_eq!(ordered.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    proptest! {
        /// For any acyclic candidate set, every in-set predecessor lands
        /// strictly before each of its dependents.
        #[test]
        fn prop_acyclic_sets_are_totally_consistent(
            edges in proptest::collection::vec((0usize..20, 0usize..20), 0..40),
            count in 2usize..20,
        ) {
            // Predecessors only point at lower ids, so the set is acyclic.
            let mut candidates: Vec<StepDefinition> =
                (0..count).map(|i| step(i as i64 + 1, vec![])).collect();
            for (a, b) in edges {
                let (lo, hi) = (a.min(b) % count, b.max(a) % count);
                if lo < hi {
                    let predecessor_id = lo as i64 + 1;
                    candidates[hi].predecessors.push(predecessor_id);
                }
            }

            let ordered = order_steps_strict(&candidates).unwrap();
            prop_assert_eq!(ordered.len(), candidates.len());
            for s in &candidates {
                for predecessor_id in s.real_predecessors() {
                    prop_assert!(
                        position(&ordered, predecessor_id) < position(&ordered, s.id)
                    );
                }
            }
        }
    }
}
