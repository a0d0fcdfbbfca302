//! Stage dependency graph utilities.

use std::any::TypeId;
use std::collections::{BTreeSet, HashMap};

use super::Task;
use crate::error::TaskError;

/// Order `tasks` so every stage runs after its declared predecessors.
///
/// Uses Kahn's algorithm; among stages that are ready at the same time, the
/// one declared first runs first. Returns indices into `tasks`.
///
/// # Errors
///
/// Returns [`TaskError::MissingDependency`] if a predecessor is not in
/// `tasks`, or [`TaskError::DependencyCycle`] naming the stages on or behind
/// a cycle.
pub fn execution_order(tasks: &[&dyn Task]) -> Result<Vec<usize>, TaskError> {
    let type_to_idx: HashMap<TypeId, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.task_id(), i))
        .collect();

    let mut in_degree = vec![0usize; tasks.len()];
    let mut reverse_deps: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (i, t) in tasks.iter().enumerate() {
        for dep in t.dependencies() {
            let &dep_idx = type_to_idx
                .get(dep)
                .ok_or_else(|| TaskError::MissingDependency(t.name().to_string()))?;
            if let Some(count) = in_degree.get_mut(i) {
                *count += 1;
            }
            if let Some(rd) = reverse_deps.get_mut(dep_idx) {
                rd.push(i);
            }
        }
    }

    let mut ready: BTreeSet<usize> = in_degree
        .iter()
        .enumerate()
        .filter_map(|(i, &d)| (d == 0).then_some(i))
        .collect();
    let mut order = Vec::with_capacity(tasks.len());

    while let Some(idx) = ready.pop_first() {
        order.push(idx);
        if let Some(dependents) = reverse_deps.get(idx) {
            for &dep in dependents {
                if let Some(count) = in_degree.get_mut(dep) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dep);
                    }
                }
            }
        }
    }

    if order.len() == tasks.len() {
        Ok(order)
    } else {
        let stuck: Vec<&str> = tasks
            .iter()
            .enumerate()
            .filter(|(i, _)| !order.contains(i))
            .map(|(_, t)| t.name())
            .collect();
        Err(TaskError::DependencyCycle(stuck.join(", ")))
    }
}
