//! Payload validation against a [`Schema`]
//!
//! Walks a JSON value recursively and reports every violation with its path
//! (`$.items[1].email`).

use serde_json::Value;
use thiserror::Error;

use super::schema::{FieldType, Schema};

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct ValidationError {
    /// JSON path to the offending value
    pub path: String,
    /// What went wrong
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Validator for tool arguments and structured answers
#[derive(Debug, Clone)]
pub struct SchemaValidator<'a> {
    schema: &'a Schema,
    /// Reject fields the schema does not declare
    strict: bool,
}

impl<'a> SchemaValidator<'a> {
    /// Validator that rejects undeclared fields
    pub fn strict(schema: &'a Schema) -> Self {
        Self { schema, strict: true }
    }

    /// Validator that ignores undeclared fields
    pub fn lenient(schema: &'a Schema) -> Self {
        Self { schema, strict: false }
    }

    /// Validate a value, collecting every error
    pub fn validate(&self, value: &Value) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        self.validate_record(self.schema, value, "$", &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_record(&self, schema: &Schema, value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => {
                errors.push(ValidationError::new(
                    path,
                    format!("expected object {}, got {}", schema.name, type_name(value)),
                ));
                return;
            }
        };

        for field in &schema.fields {
            let field_path = format!("{}.{}", path, field.name);
            match obj.get(&field.name) {
                None => {
                    if field.required {
                        errors.push(ValidationError::new(field_path, "missing required field"));
                    }
                }
                Some(Value::Null) if !field.required => {}
                Some(v) => self.validate_type(&field.kind, v, &field_path, errors),
            }
        }

        if self.strict {
            for key in obj.keys() {
                if schema.get(key).is_none() {
                    errors.push(ValidationError::new(format!("{}.{}", path, key), "unexpected field"));
                }
            }
        }
    }

    fn validate_type(&self, kind: &FieldType, value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
        let matches = match kind {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::List { items } => match value.as_array() {
                Some(arr) => {
                    for (i, item) in arr.iter().enumerate() {
                        self.validate_type(items, item, &format!("{}[{}]", path, i), errors);
                    }
                    true
                }
                None => false,
            },
            FieldType::Object { schema } => {
                self.validate_record(schema, value, path, errors);
                return;
            }
            FieldType::OneOf { variants } => {
                let any = variants.iter().any(|variant| {
                    let mut scratch = Vec::new();
                    self.validate_type(variant, value, path, &mut scratch);
                    scratch.is_empty()
                });
                if !any {
                    errors.push(ValidationError::new(
                        path,
                        format!("value matches none of: {}", kind.label()),
                    ));
                }
                return;
            }
        };

        if !matches {
            errors.push(ValidationError::new(
                path,
                format!("expected {}, got {}", kind.label(), type_name(value)),
            ));
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Parse a model's textual answer as JSON
///
/// Tolerates a surrounding Markdown code fence.
pub fn parse_payload(text: &str) -> Result<Value, ValidationError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    serde_json::from_str(body)
        .map_err(|e| ValidationError::new("$", format!("payload is not valid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::Field;
    use serde_json::json;

    fn contact_info() -> Schema {
        Schema::new("ContactInfo")
            .field(Field::string("name", "Person's name"))
            .field(Field::string("email", "Email address"))
    }

    fn extraction_result() -> Schema {
        let event = Schema::new("EventDetails")
            .field(Field::string("event_name", "Name of the event"))
            .field(Field::string("date", "Event date"));
        Schema::new("ExtractionResult").field(Field::list(
            "items",
            FieldType::OneOf {
                variants: vec![
                    FieldType::Object { schema: contact_info() },
                    FieldType::Object { schema: event },
                ],
            },
            "",
        ))
    }

    #[test]
    fn test_valid_record() {
        let schema = contact_info();
        let payload = json!({"name": "John Doe", "email": "john@example.com"});
        assert!(SchemaValidator::strict(&schema).validate(&payload).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let schema = contact_info();
        let payload = json!({"name": 42, "extra": true});
        let errors = SchemaValidator::strict(&schema).validate(&payload).unwrap_err();

        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::new("$.name", "expected string, got integer")));
        assert!(errors.contains(&ValidationError::new("$.email", "missing required field")));
        assert!(errors.contains(&ValidationError::new("$.extra", "unexpected field")));

        // lenient mode ignores the extra field
        let errors = SchemaValidator::lenient(&schema).validate(&payload).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_optional_field_accepts_null() {
        let schema = contact_info().field(Field::string("phone", "Phone number").optional());
        let payload = json!({"name": "A", "email": "a@b.c", "phone": null});
        assert!(SchemaValidator::strict(&schema).validate(&payload).is_ok());
    }

    #[test]
    fn test_union_list() {
        let schema = extraction_result();
        let payload = json!({"items": [
            {"name": "John Doe", "email": "john@email.com"},
            {"event_name": "Tech Conference", "date": "March 15th"}
        ]});
        assert!(SchemaValidator::strict(&schema).validate(&payload).is_ok());

        let bad = json!({"items": [{"event_name": "Tech Conference"}]});
        let errors = SchemaValidator::strict(&schema).validate(&bad).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "$.items[0]");
    }

    #[test]
    fn test_root_must_be_object() {
        let schema = contact_info();
        let errors = SchemaValidator::strict(&schema).validate(&json!(["x"])).unwrap_err();
        assert_eq!(errors[0].to_string(), "$: expected object ContactInfo, got list");
    }

    #[test]
    fn test_parse_payload() {
        assert_eq!(parse_payload(" {\"a\": 1} ").unwrap(), json!({"a": 1}));
        assert_eq!(parse_payload("```json\n{\"a\": 1}\n```").unwrap(), json!({"a": 1}));
        assert_eq!(parse_payload("```\n[1]\n```").unwrap(), json!([1]));

        let err = parse_payload("John Doe, john@example.com").unwrap_err();
        assert_eq!(err.path, "$");
        assert!(err.message.starts_with("payload is not valid JSON"));
    }
}
