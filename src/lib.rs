//! Exhaustive multicore schedulability analysis.
//!
//! Given tasks with release times, worst-case execution times, optional
//! deadlines, and precedence dependencies, this crate enumerates every
//! feasible assignment of tasks to a fixed number of identical cores and
//! start times, without materializing them, and reports how many such
//! schedules exist.
//!
//! The schedule space is held in a multi-valued decision diagram: a
//! hash-consed DAG whose shared structure compresses exponentially many
//! schedules into a small node graph, on which counting costs time
//! proportional to the node count rather than the schedule count.
//!
//! # Modules
//!
//! - **`mfdd`**: the generic decision-diagram engine: node store, union,
//!   enumeration, counting, and the cached morphism framework
//! - **`models`**: `Task`, `TaskModel`, and the model error taxonomy
//! - **`scheduler`**: the scheduling alphabet, domain morphisms, and the
//!   schedule-space generator
//! - **`codec`**: the two JSON model schemas
//! - **`generate`**: random task-model generation
//!
//! # Example
//!
//! ```
//! use schedulability::models::{Task, TaskModel};
//! use schedulability::scheduler::{ScheduleFactory, ScheduleGenerator};
//!
//! let t2 = Task::new(2, 1).unwrap().with_release(1);
//! let t1 = Task::new(1, 3).unwrap();
//! let t0 = Task::new(0, 2).unwrap().with_deadline(4).with_dependency(2).unwrap();
//! let model = TaskModel::new([t0, t1, t2]).unwrap();
//!
//! let mut factory = ScheduleFactory::new();
//! let generator = ScheduleGenerator::new(2).with_global_deadline(10);
//! let space = generator.generate(&model, &mut factory);
//! let complete = generator.complete_schedules(&model, &mut factory, space);
//! assert_eq!(factory.count(complete), 44);
//! ```
//!
//! # Reference
//!
//! - Bryant (1986), "Graph-Based Algorithms for Boolean Function
//!   Manipulation"
//! - Couvreur & Thierry-Mieg (2005), "Hierarchical Decision Diagrams to
//!   Exploit Model Structure"

pub mod codec;
pub mod generate;
pub mod mfdd;
pub mod models;
pub mod scheduler;

pub use models::{ModelError, Task, TaskId, TaskModel, Time};
pub use scheduler::{Schedule, ScheduleFactory, ScheduleGenerator, ScheduleKey, ScheduleValue};
