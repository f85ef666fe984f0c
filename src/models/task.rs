//! Task model.
//!
//! A task is a unit of work with a release time, a worst-case execution
//! time, an optional deadline, and a set of dependency tasks that must
//! complete before it may start.
//!
//! # Time Representation
//! All times are unsigned ticks relative to a scheduling epoch (t=0). The
//! consumer defines what a tick and t=0 mean.

use std::collections::BTreeSet;

use super::error::ModelError;

/// Unique task identifier.
pub type TaskId = usize;

/// A point or duration on the discrete time axis.
pub type Time = u64;

/// A task to be scheduled.
///
/// Immutable once constructed; identity is the id. Dependencies are
/// recorded by id and must all be strictly greater than the task's own id —
/// this fixes a total order across tasks that the schedule diagram's
/// variable order relies on, and makes dependency cycles unrepresentable
/// (a cycle would need an edge toward a smaller id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    release: Time,
    deadline: Option<Time>,
    wcet: Time,
    dependencies: BTreeSet<TaskId>,
}

impl Task {
    /// Creates a task with the given id and worst-case execution time.
    ///
    /// # Errors
    /// [`ModelError::NonPositiveWcet`] if `wcet` is zero.
    pub fn new(id: TaskId, wcet: Time) -> Result<Self, ModelError> {
        if wcet == 0 {
            return Err(ModelError::NonPositiveWcet { task: id });
        }
        Ok(Self {
            id,
            release: 0,
            deadline: None,
            wcet,
            dependencies: BTreeSet::new(),
        })
    }

    /// Sets the release time (earliest start).
    pub fn with_release(mut self, release: Time) -> Self {
        self.release = release;
        self
    }

    /// Sets the deadline (latest completion time).
    pub fn with_deadline(mut self, deadline: Time) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Adds a dependency by id.
    ///
    /// # Errors
    /// [`ModelError::DependencyOrder`] if `dependency` does not strictly
    /// exceed this task's id.
    pub fn with_dependency(mut self, dependency: TaskId) -> Result<Self, ModelError> {
        if dependency <= self.id {
            return Err(ModelError::DependencyOrder {
                task: self.id,
                dependency,
            });
        }
        self.dependencies.insert(dependency);
        Ok(self)
    }

    /// Adds several dependencies by id.
    pub fn with_dependencies(
        self,
        dependencies: impl IntoIterator<Item = TaskId>,
    ) -> Result<Self, ModelError> {
        dependencies
            .into_iter()
            .try_fold(self, Self::with_dependency)
    }

    /// The task's id.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The task's release time (earliest time it is available to process).
    pub fn release(&self) -> Time {
        self.release
    }

    /// The task's deadline, if any.
    pub fn deadline(&self) -> Option<Time> {
        self.deadline
    }

    /// The task's worst-case execution time.
    pub fn wcet(&self) -> Time {
        self.wcet
    }

    /// Ids of the tasks that must complete before this one starts.
    pub fn dependencies(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.dependencies.iter().copied()
    }

    /// Whether this task has any dependencies.
    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }

    /// Latest completion time implied by the task alone: its deadline, or
    /// `release + wcet` when it has none.
    pub fn completion_bound(&self) -> Time {
        self.deadline.unwrap_or(self.release + self.wcet)
    }
}
