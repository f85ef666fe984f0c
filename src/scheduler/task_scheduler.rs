//! The per-(task, core) scheduling morphism.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::mfdd::{Morphism, NodeId};
use crate::models::{Task, TaskId, TaskModel, Time};

use super::encoding::{CoreId, ScheduleFactory, ScheduleKey, ScheduleValue};

/// Schedules one task on one core, in every state where the core region
/// admits it.
///
/// The morphism descends the core region to its target core's node and, for
/// each clock arc there, computes the task's earliest start (ETS) and
/// earliest completion (ETA). Arcs whose ETA violates the effective
/// deadline are pruned. In exhaustive mode every feasible start offset up
/// to the remaining slack produces an arc; arcs coinciding on a clock value
/// are merged by union. The task's placement is recorded under its own key
/// deeper in the diagram.
///
/// Callers must only apply this to states where the task is unscheduled —
/// the generator composes it with a saturated exclusive filter on the
/// task's key for exactly that reason.
pub struct TaskScheduler {
    task: TaskId,
    core: CoreId,
    wcet: Time,
    /// Release with dependency completions folded in.
    release: Time,
    /// The task's own deadline.
    deadline: Option<Time>,
    /// Global deadline; `None` selects earliest-start analysis, which
    /// schedules each task exactly at its ETS instead of sweeping offsets.
    horizon: Option<Time>,
    cache: HashMap<NodeId, NodeId>,
}

impl TaskScheduler {
    pub fn new(task: &Task, model: &TaskModel, core: CoreId, horizon: Option<Time>) -> Self {
        Self {
            task: task.id(),
            core,
            wcet: task.wcet(),
            release: model.effective_release(task),
            deadline: task.deadline(),
            horizon,
            cache: HashMap::new(),
        }
    }

    /// Deadline actually enforced for this analysis mode.
    fn effective_deadline(&self) -> Option<Time> {
        match self.horizon {
            None => self.deadline,
            Some(global) => Some(self.deadline.map_or(global, |own| own.min(global))),
        }
    }

    /// Expands one clock arc of the target core into scheduled arcs.
    fn schedule_arc(
        &self,
        factory: &mut ScheduleFactory,
        arc: ScheduleValue,
        child: NodeId,
        take: &mut BTreeMap<ScheduleValue, NodeId>,
    ) {
        let ets = self.release.max(arc.clock);
        let eta = ets + self.wcet;
        let deadline = self.effective_deadline();
        if let Some(deadline) = deadline {
            if eta > deadline {
                return;
            }
        }

        // In exhaustive mode the task may start anywhere in the remaining
        // slack; in earliest-start mode only at its ETS.
        let last_offset = match self.horizon {
            None => 0,
            // effective_deadline is Some whenever horizon is.
            Some(_) => deadline.unwrap_or(eta) - eta,
        };
        for offset in 0..=last_offset {
            let placed = factory.insert_assignment(
                child,
                ScheduleKey::Task(self.task),
                ScheduleValue {
                    core: arc.core,
                    clock: ets + offset,
                },
            );
            let slot = ScheduleValue {
                core: self.core,
                clock: eta + offset,
            };
            let merged = match take.get(&slot) {
                Some(&existing) => factory.union(existing, placed),
                None => placed,
            };
            take.insert(slot, merged);
        }
    }
}

impl Morphism<ScheduleKey, ScheduleValue> for TaskScheduler {
    fn apply(&mut self, factory: &mut ScheduleFactory, p: NodeId) -> NodeId {
        if p == NodeId::ZERO {
            return NodeId::ZERO;
        }
        // This morphism runs inside the core region, where every mapping
        // binds every core: One cannot appear, and skip branches are Zero.
        debug_assert_ne!(p, NodeId::ONE, "scheduler applied past the core region");
        debug_assert!(
            matches!(factory.key(p), ScheduleKey::Core(_)),
            "scheduler reached a task key before its core"
        );
        debug_assert_eq!(factory.skip(p), NodeId::ZERO, "unbound core in encoding");

        if let Some(&r) = self.cache.get(&p) {
            return r;
        }

        let own = ScheduleKey::Core(self.core);
        let key = factory.key(p);
        let result = match key.cmp(&own) {
            Ordering::Less => {
                let take: Vec<_> = factory
                    .arcs(p)
                    .to_vec()
                    .into_iter()
                    .map(|(v, c)| (v, self.apply(factory, c)))
                    .collect();
                factory.node(key, take, NodeId::ZERO)
            }
            Ordering::Equal => {
                let mut take = BTreeMap::new();
                for (arc, child) in factory.arcs(p).to_vec() {
                    self.schedule_arc(factory, arc, child, &mut take);
                }
                factory.node(own, take.into_iter().collect(), NodeId::ZERO)
            }
            // The target core sits above us in the diagram; descending past
            // it means the encoding lost a core key.
            Ordering::Greater => unreachable!("core {} missing from the encoding", self.core),
        };
        self.cache.insert(p, result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mfdd::NodeId;
    use crate::scheduler::encoding::initial_state;

    fn single_task_model(deadline: Option<Time>) -> TaskModel {
        let mut task = Task::new(0, 2).unwrap();
        if let Some(d) = deadline {
            task = task.with_deadline(d);
        }
        TaskModel::new([task]).unwrap()
    }

    #[test]
    fn test_earliest_start_schedules_at_ets() {
        let model = single_task_model(Some(4));
        let mut f = ScheduleFactory::new();
        let idle = initial_state(1, &mut f);
        let mut scheduler = TaskScheduler::new(model.get(0).unwrap(), &model, 0, None);
        let dd = scheduler.apply(&mut f, idle);

        let mappings: Vec<_> = f.mappings(dd).collect();
        assert_eq!(mappings.len(), 1);
        let m = &mappings[0];
        assert_eq!(
            m[&ScheduleKey::Core(0)],
            ScheduleValue { core: 0, clock: 2 }
        );
        assert_eq!(
            m[&ScheduleKey::Task(0)],
            ScheduleValue { core: 0, clock: 0 }
        );
    }

    #[test]
    fn test_exhaustive_sweeps_slack() {
        let model = single_task_model(Some(4));
        let mut f = ScheduleFactory::new();
        let idle = initial_state(1, &mut f);
        let mut scheduler = TaskScheduler::new(model.get(0).unwrap(), &model, 0, Some(10));
        let dd = scheduler.apply(&mut f, idle);

        // Deadline 4, wcet 2: starts 0, 1, 2 are feasible.
        assert_eq!(f.count(dd), 3);
        let starts: Vec<Time> = f
            .mappings(dd)
            .map(|m| m[&ScheduleKey::Task(0)].clock)
            .collect();
        assert_eq!(starts, vec![0, 1, 2]);
    }

    #[test]
    fn test_infeasible_deadline_prunes_to_zero() {
        let model = single_task_model(Some(1));
        let mut f = ScheduleFactory::new();
        let idle = initial_state(1, &mut f);
        let mut scheduler = TaskScheduler::new(model.get(0).unwrap(), &model, 0, None);
        assert_eq!(scheduler.apply(&mut f, idle), NodeId::ZERO);
    }

    #[test]
    fn test_dependency_pushes_release() {
        let t1 = Task::new(1, 3).unwrap().with_release(1);
        let t0 = Task::new(0, 1).unwrap().with_dependency(1).unwrap();
        let model = TaskModel::new([t0, t1]).unwrap();
        let mut f = ScheduleFactory::new();
        let idle = initial_state(1, &mut f);
        let mut scheduler = TaskScheduler::new(model.get(0).unwrap(), &model, 0, None);
        let dd = scheduler.apply(&mut f, idle);

        // t1 completes no earlier than 4, so t0's ETS is 4 even though the
        // core is free at 0.
        let m = f.mappings(dd).next().unwrap();
        assert_eq!(
            m[&ScheduleKey::Task(0)],
            ScheduleValue { core: 0, clock: 4 }
        );
    }
}
