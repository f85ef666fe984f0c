//! JSON codecs for task models.
//!
//! Two wire schemas exist for the same logical model and both are
//! supported behind one construction interface:
//!
//! - [`id_array`]: a JSON array of task objects referencing dependencies by
//!   numeric id, decoded in declaration order against a resolution context.
//!   Also the serialization format.
//! - [`named_map`]: a JSON object keyed by task name, order-independent,
//!   with explicit circular-dependency detection during name resolution.
//!
//! The top-level JSON shape is unambiguous (an array can only be the id
//! schema, an object only the named schema), so [`model_from_json`]
//! dispatches on it.

pub mod id_array;
pub mod named_map;

use serde_json::Value as JsonValue;

use crate::models::{ModelError, TaskModel};

/// Decodes a task model from JSON text in either supported schema.
pub fn model_from_json(json: &str) -> Result<TaskModel, ModelError> {
    let root: JsonValue =
        serde_json::from_str(json).map_err(|e| ModelError::InvalidFormat(e.to_string()))?;
    match &root {
        JsonValue::Array(_) => id_array::decode_value(&root),
        JsonValue::Object(_) => named_map::decode_value(&root),
        _ => Err(ModelError::InvalidFormat(
            "top-level JSON must be an array of tasks or an object of named tasks".into(),
        )),
    }
}

/// Serializes a task model as JSON (id-array schema).
pub fn model_to_json(model: &TaskModel) -> Result<String, ModelError> {
    id_array::encode(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_on_shape() {
        let array = r#"[ { "id": 0, "wcet": 1 } ]"#;
        assert_eq!(model_from_json(array).unwrap().len(), 1);

        let object = r#"{ "only": { "id": 0, "wcet": 1 } }"#;
        assert_eq!(model_from_json(object).unwrap().len(), 1);

        assert!(matches!(
            model_from_json("42"),
            Err(ModelError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            model_from_json("{ ["),
            Err(ModelError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_schemas_agree_on_equivalent_input() {
        let by_id = r#"
            [
              { "id": 1, "wcet": 3 },
              { "id": 0, "wcet": 2, "dependencies": [ 1 ] }
            ]
        "#;
        let by_name = r#"
            {
              "first": { "id": 0, "wcet": 2, "dependencies": ["second"] },
              "second": { "id": 1, "wcet": 3 }
            }
        "#;
        assert_eq!(
            model_from_json(by_id).unwrap(),
            model_from_json(by_name).unwrap()
        );
    }
}
