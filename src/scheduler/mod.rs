//! Symbolic schedule-space construction.
//!
//! Instantiates the generic diagram engine with the scheduling alphabet and
//! provides the domain morphisms built on it:
//!
//! - **`encoding`**: keys, values, and the all-idle initial diagram.
//! - **`task_scheduler`**: the per-(task, core) scheduling morphism.
//! - **`dependency`**: the dependency/deadline constraint locator and filter.
//! - **`generator`**: orchestration — fixed point, filtering, completeness.
//! - **`schedule`**: decoding one enumerated mapping into core timelines.

mod dependency;
mod encoding;
mod generator;
mod schedule;
mod task_scheduler;

pub use dependency::{DependencyFilter, DependencyLocator};
pub use encoding::{initial_state, CoreId, ScheduleFactory, ScheduleKey, ScheduleValue};
pub use generator::ScheduleGenerator;
pub use schedule::{CoreLane, Schedule};
pub use task_scheduler::TaskScheduler;
