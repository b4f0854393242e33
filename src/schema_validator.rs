//! Compiles a tool's JSON Schema (Draft-07) once at registration and
//! validates arguments against it on every call, producing field-pathed
//! error messages.
//!
//! The validator never reparses on the hot path: [`CompiledSchema::compile`]
//! is the only place schema text is turned into a `jsonschema::Validator`;
//! [`CompiledSchema::validate`] only runs the already-compiled validator.

use serde_json::Value;

/// A tool's input schema, compiled once.
pub struct CompiledSchema {
    raw: Value,
    validator: jsonschema::Validator,
}

impl CompiledSchema {
    /// Compile `schema` (expected to be a Draft-07 document). Panics only on
    /// a schema document that is itself malformed — that's a programming
    /// error in a tool's own registration, not a runtime condition.
    pub fn compile(schema: Value) -> Self {
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft7)
            .build(&schema)
            .unwrap_or_else(|e| panic!("invalid tool input schema: {e}"));
        Self {
            raw: schema,
            validator,
        }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Fill in schema-declared defaults for properties absent from a
    /// top-level JSON object, then validate. Returns the (possibly
    /// defaulted) value on success, or an aggregated, field-pathed message
    /// on failure.
    pub fn validate(&self, mut arguments: Value) -> Result<Value, String> {
        apply_defaults(&self.raw, &mut arguments);

        let errors: Vec<String> = self
            .validator
            .iter_errors(&arguments)
            .map(|e| {
                let path = json_pointer_to_dollar_path(&e.instance_path.to_string());
                format!("{path}: {e}")
            })
            .collect();

        if errors.is_empty() {
            Ok(arguments)
        } else {
            Err(format!(
                "Input validation failed: {}",
                errors.join(", ")
            ))
        }
    }
}

/// Insert `properties.<name>.default` into `instance` for every property
/// missing from a top-level object. Absence of a *required* field is still
/// a validation failure — defaulting only affects optional fields.
fn apply_defaults(schema: &Value, instance: &mut Value) {
    let (Some(properties), Value::Object(obj)) = (schema.get("properties"), instance) else {
        return;
    };
    let Value::Object(properties) = properties else {
        return;
    };
    for (name, prop_schema) in properties {
        if obj.contains_key(name) {
            continue;
        }
        if let Some(default) = prop_schema.get("default") {
            obj.insert(name.clone(), default.clone());
        }
    }
}

/// Render a JSON Pointer (`/query`, `/config/type`) as the `$.query`,
/// `$.config.type` style used in error messages and in the scenarios.
fn json_pointer_to_dollar_path(pointer: &str) -> String {
    if pointer.is_empty() {
        return "$".to_string();
    }
    let mut out = String::from("$");
    for segment in pointer.split('/').skip(1) {
        out.push('.');
        out.push_str(&segment.replace("~1", "/").replace("~0", "~"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_required_field_fails() {
        let schema = CompiledSchema::compile(json!({
            "type": "object",
            "properties": { "query": { "type": "string", "minLength": 1 } },
            "required": ["query"]
        }));
        let err = schema.validate(json!({})).unwrap_err();
        assert!(err.starts_with("Input validation failed: "));
        assert!(err.contains("$.query"));
    }

    #[test]
    fn empty_string_fails_min_length() {
        let schema = CompiledSchema::compile(json!({
            "type": "object",
            "properties": { "query": { "type": "string", "minLength": 1 } },
            "required": ["query"]
        }));
        let err = schema.validate(json!({ "query": "" })).unwrap_err();
        assert!(err.contains("$.query"));
    }

    #[test]
    fn defaults_are_applied() {
        let schema = CompiledSchema::compile(json!({
            "type": "object",
            "properties": {
                "limit": { "type": "integer", "minimum": 1, "maximum": 10000, "default": 1000 }
            }
        }));
        let value = schema.validate(json!({})).unwrap();
        assert_eq!(value["limit"], json!(1000));
    }

    #[test]
    fn connection_id_pattern_is_enforced() {
        let schema = CompiledSchema::compile(json!({
            "type": "object",
            "properties": {
                "connectionId": { "type": "string", "pattern": "^[A-Za-z0-9_-]+$" }
            },
            "required": ["connectionId"]
        }));
        assert!(schema.validate(json!({ "connectionId": "c1" })).is_ok());
        assert!(schema.validate(json!({ "connectionId": "c 1" })).is_err());
    }
}
