//! Tool input schemas and argument validation
//!
//! Servers describe their tools with a JSON-Schema-like object. Only the
//! parts the orchestration loop relies on are typed (`properties` and
//! `required`); everything else is carried along so the model still sees
//! the full schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn object_type() -> String {
    "object".to_string()
}

/// Declared input schema of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type", default = "object_type")]
    pub schema_type: String,
    /// Parameter name -> type descriptor
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Parameters the tool cannot run without
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Remaining schema keywords, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for InputSchema {
    fn default() -> Self {
        Self {
            schema_type: object_type(),
            properties: Map::new(),
            required: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl InputSchema {
    /// Lenient conversion from a raw schema; malformed schemas become empty
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Raw JSON form of the schema
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Whether `name` is a required parameter
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Check `arguments` against the schema.
    ///
    /// Reports missing required keys and values whose kind does not match
    /// the declared `type`. Unknown keys and properties without a declared
    /// type are accepted.
    pub fn validate(&self, arguments: &Value) -> Vec<SchemaViolation> {
        let empty = Map::new();
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return vec![SchemaViolation::NotAnObject {
                    found: ValueKind::of(other),
                }]
            }
        };

        let mut violations: Vec<SchemaViolation> = self
            .required
            .iter()
            .filter(|name| !args.contains_key(name.as_str()))
            .map(|name| SchemaViolation::MissingRequired { name: name.clone() })
            .collect();

        for (name, value) in args {
            let Some(declared) = self.properties.get(name).and_then(|p| p.get("type")) else {
                continue;
            };
            let allowed: Vec<&str> = match declared {
                Value::String(t) => vec![t.as_str()],
                Value::Array(types) => types.iter().filter_map(Value::as_str).collect(),
                _ => continue,
            };
            if allowed.is_empty() || allowed.iter().any(|t| ValueKind::matches(t, value)) {
                continue;
            }
            violations.push(SchemaViolation::TypeMismatch {
                name: name.clone(),
                expected: allowed.join("|"),
                found: ValueKind::of(value),
            });
        }

        violations
    }
}

/// Kind of a JSON value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Whether `value` satisfies the JSON Schema type name `schema_type`
    fn matches(schema_type: &str, value: &Value) -> bool {
        match schema_type {
            "integer" => match value {
                Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0),
                _ => false,
            },
            "number" => value.is_number(),
            "string" => value.is_string(),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "object" => value.is_object(),
            "null" => value.is_null(),
            // Unknown type keywords are not ours to reject
            _ => true,
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        };
        f.write_str(name)
    }
}

/// A single way arguments fail to match a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    NotAnObject { found: ValueKind },
    MissingRequired { name: String },
    TypeMismatch { name: String, expected: String, found: ValueKind },
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaViolation::NotAnObject { found } => {
                write!(f, "arguments must be an object, got {}", found)
            }
            SchemaViolation::MissingRequired { name } => {
                write!(f, "missing required parameter '{}'", name)
            }
            SchemaViolation::TypeMismatch { name, expected, found } => {
                write!(f, "parameter '{}' expects {}, got {}", name, expected, found)
            }
        }
    }
}
