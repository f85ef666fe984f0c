//! The name-keyed map schema.
//!
//! A task model as a JSON object mapping task names to task objects whose
//! dependencies reference names. Declaration order is free, since
//! dependencies are resolved recursively on demand, so circular
//! dependencies must be detected explicitly while resolving, by tracking
//! the chain of names whose resolution is in flight.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value as JsonValue};

use crate::models::{ModelError, Task, TaskModel, Time};

/// Decodes a task model from a parsed JSON object.
pub fn decode_value(root: &JsonValue) -> Result<TaskModel, ModelError> {
    let map = root.as_object().ok_or_else(|| {
        ModelError::InvalidFormat("expected an object mapping task names to task objects".into())
    })?;

    let mut built: BTreeMap<String, Task> = BTreeMap::new();
    for name in map.keys() {
        build_task(name, map, &mut built, &HashSet::new())?;
    }
    TaskModel::new(built.into_values())
}

/// Decodes a task model from JSON text in the named schema.
pub fn decode(json: &str) -> Result<TaskModel, ModelError> {
    let root: JsonValue =
        serde_json::from_str(json).map_err(|e| ModelError::InvalidFormat(e.to_string()))?;
    decode_value(&root)
}

/// Builds `name` and, first, every task it depends on.
///
/// `depended_on_by` holds the names whose resolution led here; meeting one
/// of them again as a dependency is a cycle.
fn build_task<'a>(
    name: &'a str,
    map: &'a Map<String, JsonValue>,
    built: &mut BTreeMap<String, Task>,
    depended_on_by: &HashSet<&'a str>,
) -> Result<(), ModelError> {
    // Already built as a dependency of an earlier task.
    if built.contains_key(name) {
        return Ok(());
    }

    let entry = map[name].as_object().ok_or_else(|| {
        ModelError::InvalidFormat(format!("task '{name}' is not an object"))
    })?;

    let id = require_time(entry, name, "id")? as usize;
    let wcet = require_time(entry, name, "wcet")?;
    let release = optional_time(entry, name, "release")?.unwrap_or(0);
    let deadline = optional_time(entry, name, "deadline")?;
    let dependency_names = dependency_names(entry, name)?;

    let mut resolving = depended_on_by.clone();
    resolving.insert(name);

    let mut task = Task::new(id, wcet)?.with_release(release);
    if let Some(deadline) = deadline {
        task = task.with_deadline(deadline);
    }
    for dependency in dependency_names {
        if depended_on_by.contains(dependency) {
            return Err(ModelError::CircularDependency {
                task: name.to_string(),
                dependency: dependency.to_string(),
            });
        }
        if !map.contains_key(dependency) {
            return Err(ModelError::UnknownDependency {
                task: name.to_string(),
                dependency: dependency.to_string(),
            });
        }
        build_task(dependency, map, built, &resolving)?;
        task = task.with_dependency(built[dependency].id())?;
    }

    built.insert(name.to_string(), task);
    Ok(())
}

fn require_time(
    entry: &Map<String, JsonValue>,
    task: &str,
    field: &str,
) -> Result<Time, ModelError> {
    match entry.get(field) {
        None => Err(ModelError::MissingField {
            task: task.to_string(),
            field: field.to_string(),
        }),
        Some(value) => value.as_u64().ok_or_else(|| ModelError::InvalidField {
            task: task.to_string(),
            field: field.to_string(),
        }),
    }
}

fn optional_time(
    entry: &Map<String, JsonValue>,
    task: &str,
    field: &str,
) -> Result<Option<Time>, ModelError> {
    match entry.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| ModelError::InvalidField {
                task: task.to_string(),
                field: field.to_string(),
            }),
    }
}

fn dependency_names<'a>(
    entry: &'a Map<String, JsonValue>,
    task: &str,
) -> Result<Vec<&'a str>, ModelError> {
    let Some(value) = entry.get("dependencies") else {
        return Ok(Vec::new());
    };
    let invalid = || ModelError::InvalidField {
        task: task.to_string(),
        field: "dependencies".to_string(),
    };
    let items = value.as_array().ok_or_else(invalid)?;
    items
        .iter()
        .map(|item| item.as_str().ok_or_else(invalid))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_model() {
        let json = r#"
            {
              "render": { "id": 0, "wcet": 2, "deadline": 4, "dependencies": ["fetch"] },
              "audit": { "id": 1, "wcet": 3 },
              "fetch": { "id": 2, "wcet": 1, "release": 1 }
            }
        "#;
        let model = decode(json).unwrap();
        assert_eq!(model.len(), 3);

        let render = model.get(0).unwrap();
        assert_eq!(render.deadline(), Some(4));
        assert_eq!(render.dependencies().collect::<Vec<_>>(), vec![2]);
        assert_eq!(model.get(2).unwrap().release(), 1);
    }

    #[test]
    fn test_declaration_order_is_free() {
        // The dependency is declared after its dependent.
        let json = r#"
            {
              "a": { "id": 0, "wcet": 1, "dependencies": ["b"] },
              "b": { "id": 1, "wcet": 1 }
            }
        "#;
        let model = decode(json).unwrap();
        assert_eq!(
            model.get(0).unwrap().dependencies().collect::<Vec<_>>(),
            vec![1]
        );
    }

    #[test]
    fn test_missing_field() {
        let json = r#"{ "a": { "wcet": 1 } }"#;
        assert_eq!(
            decode(json),
            Err(ModelError::MissingField {
                task: "a".into(),
                field: "id".into()
            })
        );
    }

    #[test]
    fn test_invalid_field_type() {
        let json = r#"{ "a": { "id": 0, "wcet": "fast" } }"#;
        assert_eq!(
            decode(json),
            Err(ModelError::InvalidField {
                task: "a".into(),
                field: "wcet".into()
            })
        );
        // Negative times don't fit the unsigned time axis either.
        let json = r#"{ "a": { "id": 0, "wcet": 1, "release": -2 } }"#;
        assert_eq!(
            decode(json),
            Err(ModelError::InvalidField {
                task: "a".into(),
                field: "release".into()
            })
        );
    }

    #[test]
    fn test_unknown_dependency() {
        let json = r#"{ "a": { "id": 0, "wcet": 1, "dependencies": ["ghost"] } }"#;
        assert_eq!(
            decode(json),
            Err(ModelError::UnknownDependency {
                task: "a".into(),
                dependency: "ghost".into()
            })
        );
    }

    #[test]
    fn test_circular_dependency() {
        let json = r#"
            {
              "a": { "id": 0, "wcet": 1, "dependencies": ["b"] },
              "b": { "id": 1, "wcet": 1, "dependencies": ["a"] }
            }
        "#;
        let err = decode(json).unwrap_err();
        assert!(matches!(err, ModelError::CircularDependency { .. }));
    }

    #[test]
    fn test_self_dependency_is_circular() {
        let json = r#"{ "a": { "id": 0, "wcet": 1, "dependencies": ["a"] } }"#;
        let err = decode(json).unwrap_err();
        assert!(matches!(err, ModelError::CircularDependency { .. }));
    }

    #[test]
    fn test_non_object_task_rejected() {
        let json = r#"{ "a": [1, 2, 3] }"#;
        assert!(matches!(decode(json), Err(ModelError::InvalidFormat(_))));
    }
}
