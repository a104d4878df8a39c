//! Declared output shapes and the validator that checks values against them.
//!
//! A [`Shape`] is a small structural type: a string, an array of some
//! element shape, or an object with named fields. Validation never panics;
//! failures come back as [`ShapeViolation`] values carrying a JSON path.

use serde_json::{Map, Value};

/// Structural type of a stage output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    String,
    Array(Box<Shape>),
    Object(Vec<Field>),
}

/// One declared field of an object shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub shape: Shape,
    /// Optional fields may be absent or `null`.
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            required: true,
        }
    }

    pub fn optional(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            required: false,
        }
    }
}

impl Shape {
    pub fn array(element: Shape) -> Self {
        Shape::Array(Box::new(element))
    }

    pub fn object(fields: impl IntoIterator<Item = Field>) -> Self {
        Shape::Object(fields.into_iter().collect())
    }

    fn kind(&self) -> &'static str {
        match self {
            Shape::String => "string",
            Shape::Array(_) => "array",
            Shape::Object(_) => "object",
        }
    }

    /// Render this shape as a Gemini `responseSchema` (OpenAPI subset).
    pub fn to_response_schema(&self) -> Value {
        match self {
            Shape::String => serde_json::json!({ "type": "STRING" }),
            Shape::Array(element) => serde_json::json!({
                "type": "ARRAY",
                "items": element.to_response_schema(),
            }),
            Shape::Object(fields) => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for field in fields {
                    properties.insert(field.name.to_string(), field.shape.to_response_schema());
                    if field.required {
                        required.push(Value::String(field.name.to_string()));
                    }
                }
                let mut schema = Map::new();
                schema.insert("type".to_string(), Value::String("OBJECT".to_string()));
                schema.insert("properties".to_string(), Value::Object(properties));
                if !required.is_empty() {
                    schema.insert("required".to_string(), Value::Array(required));
                }
                Value::Object(schema)
            }
        }
    }
}

/// A value did not match its declared shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeViolation {
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{path}: missing required field {field}")]
    MissingField { path: String, field: &'static str },
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Check `value` against `shape`, returning it unchanged on success.
///
/// Unknown object fields are ignored. Array elements must all match the
/// element shape.
pub fn validate<'a>(value: &'a Value, shape: &Shape) -> Result<&'a Value, ShapeViolation> {
    check(value, shape, "$")?;
    Ok(value)
}

fn check(value: &Value, shape: &Shape, path: &str) -> Result<(), ShapeViolation> {
    let mismatch = || ShapeViolation::TypeMismatch {
        path: path.to_string(),
        expected: shape.kind(),
        found: value_kind(value),
    };

    match shape {
        Shape::String => value.as_str().map(|_| ()).ok_or_else(mismatch),
        Shape::Array(element) => {
            let items = value.as_array().ok_or_else(mismatch)?;
            for (index, item) in items.iter().enumerate() {
                check(item, element, &format!("{path}[{index}]"))?;
            }
            Ok(())
        }
        Shape::Object(fields) => {
            let object = value.as_object().ok_or_else(mismatch)?;
            for field in fields {
                match object.get(field.name) {
                    None | Some(Value::Null) if !field.required => {}
                    None => {
                        return Err(ShapeViolation::MissingField {
                            path: path.to_string(),
                            field: field.name,
                        })
                    }
                    Some(inner) => check(inner, &field.shape, &format!("{path}.{}", field.name))?,
                }
            }
            Ok(())
        }
    }
}
