//! Validated task collections.

use std::collections::BTreeMap;

use super::error::ModelError;
use super::task::{Task, TaskId, Time};

/// A validated, immutable collection of tasks indexed by id.
///
/// Construction checks what [`Task`] cannot check alone: id uniqueness and
/// the existence of every referenced dependency. Cycle freedom needs no
/// check — the per-task dependency-order invariant already rules cycles out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskModel {
    tasks: BTreeMap<TaskId, Task>,
}

impl TaskModel {
    /// Builds a model from a set of tasks.
    ///
    /// # Errors
    /// [`ModelError::DuplicateTask`] if two tasks share an id;
    /// [`ModelError::UnknownDependency`] if a dependency id is absent from
    /// the set.
    pub fn new(tasks: impl IntoIterator<Item = Task>) -> Result<Self, ModelError> {
        let mut map = BTreeMap::new();
        for task in tasks {
            let id = task.id();
            if map.insert(id, task).is_some() {
                return Err(ModelError::DuplicateTask { task: id });
            }
        }
        for task in map.values() {
            for dependency in task.dependencies() {
                if !map.contains_key(&dependency) {
                    return Err(ModelError::UnknownDependency {
                        task: task.id().to_string(),
                        dependency: dependency.to_string(),
                    });
                }
            }
        }
        Ok(Self { tasks: map })
    }

    /// Looks up a task by id.
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Iterates over the tasks in ascending id order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Iterates over the task ids in ascending order.
    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.keys().copied()
    }

    /// Number of tasks in the model.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the model holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Default global deadline: the latest completion bound of any task.
    pub fn default_global_deadline(&self) -> Time {
        self.tasks
            .values()
            .map(Task::completion_bound)
            .max()
            .unwrap_or(0)
    }

    /// Earliest time `task` can start once its dependencies are accounted
    /// for: its own release, or the latest `release + wcet` among its
    /// dependencies if that comes later.
    pub fn effective_release(&self, task: &Task) -> Time {
        task.dependencies()
            .filter_map(|id| self.get(id))
            .map(|dep| dep.release() + dep.wcet())
            .fold(task.release(), Time::max)
    }

    /// The `(id, wcet)` pairs of `task`'s dependencies, ascending by id.
    pub fn dependency_wcets(&self, task: &Task) -> Vec<(TaskId, Time)> {
        task.dependencies()
            .filter_map(|id| self.get(id).map(|dep| (id, dep.wcet())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TaskModel {
        let t2 = Task::new(2, 1).unwrap().with_release(1);
        let t1 = Task::new(1, 3).unwrap();
        let t0 = Task::new(0, 2)
            .unwrap()
            .with_deadline(4)
            .with_dependency(2)
            .unwrap();
        TaskModel::new([t0, t1, t2]).unwrap()
    }

    #[test]
    fn test_model_lookup() {
        let model = sample();
        assert_eq!(model.len(), 3);
        assert_eq!(model.get(1).map(Task::wcet), Some(3));
        assert!(model.get(9).is_none());
        assert_eq!(model.task_ids().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let a = Task::new(1, 1).unwrap();
        let b = Task::new(1, 2).unwrap();
        assert_eq!(
            TaskModel::new([a, b]),
            Err(ModelError::DuplicateTask { task: 1 })
        );
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let t = Task::new(0, 1).unwrap().with_dependency(7).unwrap();
        let err = TaskModel::new([t]).unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownDependency {
                task: "0".into(),
                dependency: "7".into()
            }
        );
    }

    #[test]
    fn test_default_global_deadline() {
        let model = sample();
        // t0 deadline 4, t1 completes by 3, t2 by 2.
        assert_eq!(model.default_global_deadline(), 4);
        assert_eq!(TaskModel::default().default_global_deadline(), 0);
    }

    #[test]
    fn test_effective_release_folds_dependencies() {
        let model = sample();
        let t0 = model.get(0).unwrap();
        // t2 releases at 1 and runs 1 tick, so t0 cannot start before 2.
        assert_eq!(model.effective_release(t0), 2);
        let t1 = model.get(1).unwrap();
        assert_eq!(model.effective_release(t1), 0);
    }

    #[test]
    fn test_dependency_wcets() {
        let model = sample();
        let t0 = model.get(0).unwrap();
        assert_eq!(model.dependency_wcets(t0), vec![(2, 1)]);
    }
}
