//! The id-indexed array schema.
//!
//! A task model as a JSON array of task objects whose dependencies
//! reference numeric ids. Decoding walks the array in order and keeps a
//! resolution context of already-decoded tasks: referencing an id that has
//! not been decoded yet is an error, so serialized models list every task
//! after its dependencies. This is also the schema the random generator
//! writes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::models::{ModelError, Task, TaskId, TaskModel, Time};

/// Wire form of one task.
#[derive(Debug, Serialize, Deserialize)]
struct RawTask {
    id: TaskId,
    wcet: Time,
    #[serde(default)]
    release: Time,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deadline: Option<Time>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<TaskId>,
}

/// Decodes a task model from a parsed JSON array.
pub fn decode_value(root: &JsonValue) -> Result<TaskModel, ModelError> {
    let raw: Vec<RawTask> = serde_json::from_value(root.clone())
        .map_err(|e| ModelError::InvalidFormat(e.to_string()))?;

    // Resolution context: tasks decoded so far, by id.
    let mut decoded: BTreeMap<TaskId, Task> = BTreeMap::new();
    for entry in raw {
        if decoded.contains_key(&entry.id) {
            return Err(ModelError::DuplicateTask { task: entry.id });
        }
        for &dependency in &entry.dependencies {
            if !decoded.contains_key(&dependency) {
                return Err(ModelError::UnknownDependency {
                    task: entry.id.to_string(),
                    dependency: dependency.to_string(),
                });
            }
        }
        let mut task = Task::new(entry.id, entry.wcet)?.with_release(entry.release);
        if let Some(deadline) = entry.deadline {
            task = task.with_deadline(deadline);
        }
        let task = task.with_dependencies(entry.dependencies)?;
        decoded.insert(entry.id, task);
    }
    TaskModel::new(decoded.into_values())
}

/// Decodes a task model from JSON text in the array schema.
pub fn decode(json: &str) -> Result<TaskModel, ModelError> {
    let root: JsonValue =
        serde_json::from_str(json).map_err(|e| ModelError::InvalidFormat(e.to_string()))?;
    decode_value(&root)
}

/// Serializes a task model in the array schema.
///
/// Tasks are listed in descending id order; dependency ids always exceed
/// the dependent's id, so every dependency precedes its dependents and the
/// output round-trips through [`decode`].
pub fn encode(model: &TaskModel) -> Result<String, ModelError> {
    let mut raw: Vec<RawTask> = model
        .tasks()
        .map(|task| RawTask {
            id: task.id(),
            wcet: task.wcet(),
            release: task.release(),
            deadline: task.deadline(),
            dependencies: task.dependencies().collect(),
        })
        .collect();
    raw.reverse();
    serde_json::to_string_pretty(&raw).map_err(|e| ModelError::InvalidFormat(e.to_string()))
}
