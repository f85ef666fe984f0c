//! Concrete schedule (solution) view.
//!
//! The diagram engine hands back raw key→value mappings; this module
//! decodes one mapping into per-core timelines for inspection and display.

use std::collections::BTreeMap;
use std::fmt;

use crate::models::{TaskId, Time};

use super::encoding::{CoreId, ScheduleKey, ScheduleValue};

/// One concrete schedule, decoded from an enumerated diagram mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    lanes: BTreeMap<CoreId, CoreLane>,
}

/// A single core's timeline within a schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreLane {
    /// The core's final clock (time at which it becomes free).
    pub clock: Time,
    /// Tasks placed on the core as `(task, start)`, ordered by start time.
    pub tasks: Vec<(TaskId, Time)>,
}

impl Schedule {
    /// Decodes a diagram mapping into per-core lanes.
    pub fn from_mapping(mapping: &BTreeMap<ScheduleKey, ScheduleValue>) -> Self {
        let mut lanes: BTreeMap<CoreId, CoreLane> = BTreeMap::new();
        for (&key, &value) in mapping {
            match key {
                ScheduleKey::Core(core) => {
                    lanes.entry(core).or_default().clock = value.clock;
                }
                ScheduleKey::Task(task) => {
                    lanes
                        .entry(value.core)
                        .or_default()
                        .tasks
                        .push((task, value.clock));
                }
            }
        }
        for lane in lanes.values_mut() {
            lane.tasks.sort_by_key(|&(_, start)| start);
        }
        Self { lanes }
    }

    /// The core ids present, ascending.
    pub fn core_ids(&self) -> impl Iterator<Item = CoreId> + '_ {
        self.lanes.keys().copied()
    }

    /// The timeline of one core.
    pub fn lane(&self, core: CoreId) -> Option<&CoreLane> {
        self.lanes.get(&core)
    }

    /// Where and when a task was placed.
    pub fn placement(&self, task: TaskId) -> Option<(CoreId, Time)> {
        self.lanes.iter().find_map(|(&core, lane)| {
            lane.tasks
                .iter()
                .find(|&&(id, _)| id == task)
                .map(|&(_, start)| (core, start))
        })
    }

    /// Total number of placed tasks.
    pub fn task_count(&self) -> usize {
        self.lanes.values().map(|lane| lane.tasks.len()).sum()
    }
}

impl fmt::Display for Schedule {
    /// One line per core: `core(<id>) @ <clock>: t<id>:<start>, ...` with
    /// tasks in execution order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (core, lane) in &self.lanes {
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "core({core}) @ {}: ", lane.clock)?;
            let rendered: Vec<String> = lane
                .tasks
                .iter()
                .map(|&(task, start)| format!("t{task}:{start}"))
                .collect();
            write!(f, "{}", rendered.join(", "))?;
        }
        Ok(())
    }
}
