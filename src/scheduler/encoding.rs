//! The schedule diagram's key/value alphabet.
//!
//! A schedule-space diagram maps [`ScheduleKey`]s to [`ScheduleValue`]s:
//! one key per core tracking its next-free clock, one key per task
//! recording where and when it was placed. The key order is load-bearing:
//! every core key precedes every task key, ascending by id within each
//! category, and both the fixed-point generator and the dependency locator
//! rely on it.

use std::fmt;

use crate::mfdd::{MfddFactory, NodeId};
use crate::models::{TaskId, Time};

/// Identifier of one of the identical cores.
pub type CoreId = usize;

/// A variable of the schedule diagram.
///
/// The derived order (`Core` variant first, ids ascending) is exactly the
/// diagram's variable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScheduleKey {
    /// A core's state: its value carries the core's next-free clock.
    Core(CoreId),
    /// A task's placement: its value carries the core and start time.
    Task(TaskId),
}

impl fmt::Display for ScheduleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleKey::Core(id) => write!(f, "core({id})"),
            ScheduleKey::Task(id) => write!(f, "task({id})"),
        }
    }
}

/// A core/clock pair labelling a diagram arc.
///
/// For a core key: the core's identity and its next-free clock. For a task
/// key: the core the task runs on and the task's start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduleValue {
    pub core: CoreId,
    pub clock: Time,
}

impl fmt::Display for ScheduleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(core: {}, clock: {})", self.core, self.clock)
    }
}

/// The diagram universe instantiated with the schedule alphabet.
pub type ScheduleFactory = MfddFactory<ScheduleKey, ScheduleValue>;

/// The all-idle state: one mapping binding each core to clock 0 and no
/// task keys at all.
pub fn initial_state(core_count: usize, factory: &mut ScheduleFactory) -> NodeId {
    factory.encode([(0..core_count).map(|core| {
        (
            ScheduleKey::Core(core),
            ScheduleValue { core, clock: 0 },
        )
    })])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_order_cores_before_tasks() {
        assert!(ScheduleKey::Core(0) < ScheduleKey::Core(1));
        assert!(ScheduleKey::Core(usize::MAX) < ScheduleKey::Task(0));
        assert!(ScheduleKey::Task(0) < ScheduleKey::Task(1));
    }

    #[test]
    fn test_initial_state_is_single_idle_mapping() {
        let mut f = ScheduleFactory::new();
        let dd = initial_state(2, &mut f);
        assert_eq!(f.count(dd), 1);
        let mapping = f.mappings(dd).next().unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(
            mapping[&ScheduleKey::Core(0)],
            ScheduleValue { core: 0, clock: 0 }
        );
        assert_eq!(
            mapping[&ScheduleKey::Core(1)],
            ScheduleValue { core: 1, clock: 0 }
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ScheduleKey::Core(1).to_string(), "core(1)");
        assert_eq!(ScheduleKey::Task(3).to_string(), "task(3)");
        assert_eq!(
            ScheduleValue { core: 0, clock: 7 }.to_string(),
            "(core: 0, clock: 7)"
        );
    }
}
