//! Field schemas for tool parameters and structured answers

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Semantic type of a schema field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    /// Homogeneous list
    List { items: Box<FieldType> },
    /// Nested record
    Object { schema: Schema },
    /// Value matching any one of the variants
    OneOf { variants: Vec<FieldType> },
}

impl FieldType {
    /// Render as a JSON Schema fragment
    pub fn to_json_schema(&self) -> Value {
        match self {
            FieldType::String => json!({ "type": "string" }),
            FieldType::Integer => json!({ "type": "integer" }),
            FieldType::Number => json!({ "type": "number" }),
            FieldType::Boolean => json!({ "type": "boolean" }),
            FieldType::List { items } => json!({
                "type": "array",
                "items": items.to_json_schema(),
            }),
            FieldType::Object { schema } => schema.to_json_schema(),
            FieldType::OneOf { variants } => json!({
                "anyOf": variants.iter().map(FieldType::to_json_schema).collect::<Vec<_>>(),
            }),
        }
    }

    /// Short name used in validation messages
    pub fn label(&self) -> String {
        match self {
            FieldType::String => "string".to_string(),
            FieldType::Integer => "integer".to_string(),
            FieldType::Number => "number".to_string(),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::List { items } => format!("list of {}", items.label()),
            FieldType::Object { schema } => format!("object {}", schema.name),
            FieldType::OneOf { variants } => variants
                .iter()
                .map(FieldType::label)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

/// A named, typed field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldType,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl Field {
    /// Create a required field
    pub fn new(name: impl Into<String>, kind: FieldType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FieldType::String, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer, description)
    }

    pub fn number(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number, description)
    }

    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean, description)
    }

    pub fn list(name: impl Into<String>, items: FieldType, description: impl Into<String>) -> Self {
        Self::new(name, FieldType::List { items: Box::new(items) }, description)
    }

    pub fn object(name: impl Into<String>, schema: Schema, description: impl Into<String>) -> Self {
        Self::new(name, FieldType::Object { schema }, description)
    }

    /// Mark the field as optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// A record schema: a mapping of named, typed fields
///
/// Used both as a tool's parameter schema and as the declared shape of a
/// structured answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create an empty schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a field
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Render as a JSON Schema object
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut prop = field.kind.to_json_schema();
            if !field.description.is_empty() {
                if let Value::Object(ref mut obj) = prop {
                    obj.insert("description".to_string(), Value::String(field.description.clone()));
                }
            }
            properties.insert(field.name.clone(), prop);
        }

        let required: Vec<Value> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| Value::String(f.name.clone()))
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        });
        if let (Some(description), Value::Object(obj)) = (&self.description, &mut schema) {
            obj.insert("description".to_string(), Value::String(description.clone()));
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_info() -> Schema {
        Schema::new("ContactInfo")
            .with_description("Contact information for a person.")
            .field(Field::string("name", "The name of the person"))
            .field(Field::string("email", "The email address of the person"))
            .field(Field::string("phone", "The phone number of the person").optional())
    }

    #[test]
    fn test_json_schema_rendering() {
        let schema = contact_info().to_json_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["description"], "Contact information for a person.");
        assert_eq!(schema["properties"]["email"]["type"], "string");
        assert_eq!(
            schema["properties"]["name"]["description"],
            "The name of the person"
        );
        assert_eq!(schema["required"], json!(["name", "email"]));
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn test_nested_union_rendering() {
        let event = Schema::new("EventDetails")
            .field(Field::string("event_name", "Name of the event"))
            .field(Field::string("date", "Event date"));
        let extraction = Schema::new("ExtractionResult").field(Field::list(
            "items",
            FieldType::OneOf {
                variants: vec![
                    FieldType::Object { schema: contact_info() },
                    FieldType::Object { schema: event },
                ],
            },
            "",
        ));

        let rendered = extraction.to_json_schema();
        let variants = rendered["properties"]["items"]["items"]["anyOf"]
            .as_array()
            .unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[1]["properties"]["event_name"]["type"], "string");
        assert!(rendered["properties"]["items"].get("description").is_none());
    }

    #[test]
    fn test_schema_from_yaml() {
        let yaml = r#"
name: GetWeather
description: Get the current weather in a given location
fields:
  - name: location
    type: string
    description: City and state, e.g. Los Angeles, CA
  - name: days
    type: integer
    required: false
"#;
        let schema: Schema = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.get("location").unwrap().kind, FieldType::String);
        assert!(!schema.get("days").unwrap().required);
        assert_eq!(FieldType::List { items: Box::new(FieldType::Integer) }.label(), "list of integer");
    }
}
