//! Domain and deserialization errors.

use thiserror::Error;

use super::task::TaskId;

/// An error raised while constructing or decoding a task model.
///
/// Construction aborts on the first error; no partial model is ever
/// produced. The diagram engine itself is total over a validated model and
/// never returns one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A task's worst-case execution time is zero.
    #[error("task {task} must have a worst-case execution time greater than 0")]
    NonPositiveWcet { task: TaskId },

    /// A dependency id does not strictly exceed the owning task's id.
    ///
    /// Violating this would corrupt the diagram's variable-order invariant,
    /// so it is rejected at construction rather than assumed.
    #[error("dependency {dependency} of task {task} must have a greater id")]
    DependencyOrder { task: TaskId, dependency: TaskId },

    /// Two tasks share an id.
    #[error("duplicate task id {task}")]
    DuplicateTask { task: TaskId },

    /// A task references a dependency that is undefined, or (in the
    /// id-indexed schema) not yet decoded.
    #[error("task '{task}' references undefined dependency '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    /// Two named tasks depend on each other, directly or transitively.
    #[error("found circular dependency between '{task}' and '{dependency}'")]
    CircularDependency { task: String, dependency: String },

    /// A task object lacks a required field.
    #[error("task '{task}' is missing field '{field}'")]
    MissingField { task: String, field: String },

    /// A task field has the wrong type or an out-of-range value.
    #[error("field '{field}' of task '{task}' is invalid")]
    InvalidField { task: String, field: String },

    /// The input does not follow either supported JSON schema.
    #[error("task model does not follow a valid format: {0}")]
    InvalidFormat(String),
}
