//! Schedule-space generation.
//!
//! Orchestrates the diagram engine over a task model: build the all-idle
//! state, run the fixed point of every per-(task, core) scheduling
//! morphism, then prune dependency-violating states. Each fixed-point step
//! either leaves a state unchanged or schedules exactly one more task, so
//! the iteration explores every reachable combination of scheduled subset,
//! core assignment, and start time with full structural sharing.

use tracing::debug;

use crate::mfdd::{
    Composition, ExclusiveKeyFilter, FixedPoint, Identity, InclusiveKeyFilter, Morphism,
    MorphismUnion, NodeId, Saturated,
};
use crate::models::{TaskModel, Time};

use super::dependency::DependencyLocator;
use super::encoding::{initial_state, ScheduleFactory, ScheduleKey, ScheduleValue};
use super::task_scheduler::TaskScheduler;

/// Generates the symbolic schedule space for a task model.
///
/// Without a global deadline the analysis is earliest-start: every task is
/// placed exactly at its earliest feasible start time. With one, every
/// feasible start up to the deadline slack is explored.
///
/// # Example
///
/// ```
/// use schedulability::models::{Task, TaskModel};
/// use schedulability::scheduler::{ScheduleFactory, ScheduleGenerator};
///
/// let t1 = Task::new(1, 1).unwrap();
/// let t0 = Task::new(0, 2).unwrap().with_dependency(1).unwrap();
/// let model = TaskModel::new([t0, t1]).unwrap();
///
/// let mut factory = ScheduleFactory::new();
/// let generator = ScheduleGenerator::new(2);
/// let space = generator.generate(&model, &mut factory);
/// let complete = generator.complete_schedules(&model, &mut factory, space);
/// assert!(factory.count(complete) > 0);
/// ```
#[derive(Debug, Clone)]
pub struct ScheduleGenerator {
    core_count: usize,
    global_deadline: Option<Time>,
}

impl ScheduleGenerator {
    /// Creates an earliest-start generator for the given number of cores.
    pub fn new(core_count: usize) -> Self {
        assert!(core_count > 0, "at least one core is required");
        Self {
            core_count,
            global_deadline: None,
        }
    }

    /// Switches to exhaustive analysis bounded by a global deadline.
    pub fn with_global_deadline(mut self, deadline: Time) -> Self {
        self.global_deadline = Some(deadline);
        self
    }

    /// Computes the diagram of every reachable schedule state, including
    /// partial ones, with dependency-violating states pruned.
    pub fn generate(&self, model: &TaskModel, factory: &mut ScheduleFactory) -> NodeId {
        let idle = initial_state(self.core_count, factory);

        let mut parts: Vec<Box<dyn Morphism<ScheduleKey, ScheduleValue>>> = Vec::new();
        for task in model.tasks() {
            // Schedule the task on any core, but only in states where it
            // has not been placed yet — otherwise unioning over every
            // (task, core) pair would double-schedule.
            let on_any_core = MorphismUnion::new(
                (0..self.core_count)
                    .map(|core| {
                        Box::new(TaskScheduler::new(task, model, core, self.global_deadline))
                            as Box<dyn Morphism<ScheduleKey, ScheduleValue>>
                    })
                    .collect(),
            );
            let unscheduled =
                Saturated::new(ExclusiveKeyFilter::new([ScheduleKey::Task(task.id())]));
            parts.push(Box::new(Composition::new(on_any_core, unscheduled)));
        }
        parts.push(Box::new(Identity));
        debug!(
            tasks = model.len(),
            cores = self.core_count,
            global_deadline = ?self.global_deadline,
            "running schedule-space fixed point"
        );

        let mut generator = FixedPoint::new(MorphismUnion::new(parts));
        let space = generator.apply(factory, idle);
        debug!(
            nodes = factory.created_count(),
            "fixed point reached, filtering dependencies"
        );

        let mut locator = DependencyLocator::new(model);
        locator.apply(factory, space)
    }

    /// Restricts a generated diagram to mappings that schedule every task.
    ///
    /// Intermediate partial mappings are valid members of the schedule
    /// space but are not complete schedules.
    pub fn complete_schedules(
        &self,
        model: &TaskModel,
        factory: &mut ScheduleFactory,
        space: NodeId,
    ) -> NodeId {
        if model.is_empty() {
            return space;
        }
        let mut filter = InclusiveKeyFilter::new(model.task_ids().map(ScheduleKey::Task));
        filter.apply(factory, space)
    }
}
