//! Schema definitions for payload validation.
//!
//! A [`Schema`] describes one payload type: required keys, per-field
//! constraints and whether unknown keys are allowed. Field constraints are a
//! recursive [`FieldSchema`], so nested objects and array items are checked by
//! the same walker as top-level fields.
//!
//! Schemas are either built in ([`get_schema_by_type`]) or parsed from a
//! JSON-schema-like object with [`Schema::from_value`].

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::ValidationResult;

const UUID_PATTERN: &str = "^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$";

/// Runtime kind of a JSON value, as named in schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    /// A number without a fractional part. Values still report as `number`.
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl JsonType {
    /// Kind reported in error messages.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Boolean,
            Value::Number(_) => JsonType::Number,
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            JsonType::Integer => value
                .as_f64()
                .is_some_and(|n| value.is_i64() || value.is_u64() || n.fract() == 0.0),
            kind => *kind == JsonType::of(value),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::Boolean => "boolean",
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::Null => "null",
        }
    }
}

/// Dedicated string validators selected with `format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringFormat {
    Email,
    DateTime,
    /// Formats without a validator are accepted and ignored.
    #[serde(other)]
    Unchecked,
}

/// Compiled `pattern` constraint. Matching is unanchored unless the pattern
/// anchors itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Pattern)
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.0.is_match(value)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for Pattern {
    type Error = regex::Error;

    fn try_from(pattern: String) -> Result<Self, Self::Error> {
        Pattern::new(&pattern)
    }
}

/// Named field schemas in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Properties(Vec<(String, FieldSchema)>);

impl Properties {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.0.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.iter().find(|(n, _)| *n == name).map(|(_, schema)| schema)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds or replaces a field, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, schema: FieldSchema) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = schema,
            None => self.0.push((name, schema)),
        }
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = Properties;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field schemas")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Properties, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut properties = Properties::default();
                while let Some((name, schema)) = map.next_entry::<String, FieldSchema>()? {
                    properties.insert(name, schema);
                }
                Ok(properties)
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(JsonType),
    Many(Vec<JsonType>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<JsonType>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(kind) => vec![kind],
        OneOrMany::Many(kinds) => kinds,
    })
}

/// Constraints for a single field, possibly nested.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Allowed kinds. Empty means any kind.
    #[serde(rename = "type", default, deserialize_with = "one_or_many")]
    pub types: Vec<JsonType>,
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub pattern: Option<Pattern>,
    #[serde(default)]
    pub format: Option<StringFormat>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(rename = "enum", default)]
    pub allowed_values: Option<Vec<Value>>,
    #[serde(default)]
    pub items: Option<Box<FieldSchema>>,
    #[serde(default)]
    pub properties: Properties,
}

impl FieldSchema {
    pub fn of_type(kind: JsonType) -> Self {
        Self {
            types: vec![kind],
            ..Self::default()
        }
    }

    pub fn string() -> Self {
        Self::of_type(JsonType::String)
    }

    pub fn number() -> Self {
        Self::of_type(JsonType::Number)
    }

    pub fn boolean() -> Self {
        Self::of_type(JsonType::Boolean)
    }

    pub fn object() -> Self {
        Self::of_type(JsonType::Object)
    }

    pub fn array(items: FieldSchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of_type(JsonType::Array)
        }
    }

    /// Also accepts `null`.
    pub fn or_null(mut self) -> Self {
        if !self.types.contains(&JsonType::Null) {
            self.types.push(JsonType::Null);
        }
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn format(mut self, format: StringFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn minimum(mut self, min: f64) -> Self {
        self.minimum = Some(min);
        self
    }

    pub fn maximum(mut self, max: f64) -> Self {
        self.maximum = Some(max);
        self
    }

    pub fn one_of<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.allowed_values = Some(values.into_iter().collect());
        self
    }

    pub fn property(mut self, name: impl Into<String>, schema: FieldSchema) -> Self {
        self.properties.insert(name, schema);
        self
    }
}

/// Top-level definition of a payload type.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default = "default_additional_properties")]
    pub additional_properties: bool,
}

fn default_additional_properties() -> bool {
    true
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            required: Vec::new(),
            properties: Properties::default(),
            additional_properties: true,
        }
    }
}

impl Schema {
    /// Parses a JSON-schema-like object (`required`, `properties`,
    /// `additionalProperties`). Other keywords are ignored.
    pub fn from_value(value: &Value) -> Result<Self, AppError> {
        if !value.is_object() {
            return Err(AppError::InvalidInput(
                "Schema must be an object".to_string(),
            ));
        }
        Schema::deserialize(value)
            .map_err(|e| AppError::InvalidInput(format!("Invalid schema: {}", e)))
    }

    pub fn require(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, schema: FieldSchema) -> Self {
        self.properties.insert(name, schema);
        self
    }

    pub fn closed(mut self) -> Self {
        self.additional_properties = false;
        self
    }

    /// Whether `name` is a declared (required or described) top-level key.
    pub fn declares(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name) || self.properties.contains(name)
    }
}

// ============ Registry ============

/// Named schemas available to [`SchemaRegistry::validate`].
///
/// [`SchemaRegistry::builtin`] holds the compiled-in definitions; hosts may
/// register more without touching the validator.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
}

static BUILTIN_REGISTRY: Lazy<SchemaRegistry> = Lazy::new(|| {
    let mut registry = SchemaRegistry::default();
    registry.register("event", event_schema());
    registry.register("contact", contact_schema());
    registry
});

impl SchemaRegistry {
    /// A registry pre-loaded with the built-in `event` and `contact` schemas.
    pub fn builtin() -> Self {
        BUILTIN_REGISTRY.clone()
    }

    /// Adds a schema, returning the one it replaced.
    pub fn register(&mut self, name: impl Into<String>, schema: Schema) -> Option<Schema> {
        self.schemas.insert(name.into(), schema)
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn validate(&self, payload: &Value, schema_type: &str) -> ValidationResult {
        crate::validation::validate_with_registry(self, payload, schema_type, None)
    }
}

/// Looks up a built-in schema by name.
pub fn get_schema_by_type(schema_type: &str) -> Option<&'static Schema> {
    BUILTIN_REGISTRY.get(schema_type)
}

pub(crate) fn builtin_registry() -> &'static SchemaRegistry {
    &BUILTIN_REGISTRY
}

fn event_schema() -> Schema {
    let uuid = Pattern::new(UUID_PATTERN).expect("uuid pattern");

    Schema::default()
        .require("id")
        .require("type")
        .require("source")
        .require("env")
        .require("timestamp")
        .require("payload")
        .property("id", FieldSchema::string().pattern(uuid))
        .property("type", FieldSchema::string())
        .property(
            "source",
            FieldSchema::string().one_of(
                ["n8n", "backend", "frontend", "infra", "github", "external"].map(Value::from),
            ),
        )
        .property(
            "env",
            FieldSchema::string().one_of(["dev", "staging", "prod"].map(Value::from)),
        )
        .property(
            "timestamp",
            FieldSchema::string().format(StringFormat::DateTime),
        )
        .property("correlation_id", FieldSchema::string().or_null())
        .property("payload", FieldSchema::object())
        .closed()
}

fn contact_schema() -> Schema {
    Schema::default()
        .require("email")
        .property(
            "email",
            FieldSchema::string()
                .format(StringFormat::Email)
                .min_length(1)
                .max_length(255),
        )
        .property("first_name", FieldSchema::string().or_null().max_length(100))
        .property("last_name", FieldSchema::string().or_null().max_length(100))
        .property("company", FieldSchema::string().or_null().max_length(200))
        .property("phone", FieldSchema::string().or_null())
        .property(
            "status",
            FieldSchema::string().or_null().one_of([
                json!("new"),
                json!("contacted"),
                json!("qualified"),
                json!("converted"),
                json!("lost"),
                Value::Null,
            ]),
        )
        .closed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        assert_eq!(SchemaRegistry::builtin().names(), vec!["contact", "event"]);
        assert!(get_schema_by_type("incident").is_none());
    }

    #[test]
    fn test_builtin_contact_shape() {
        let contact = get_schema_by_type("contact").unwrap();
        assert_eq!(contact.required, vec!["email"]);
        assert!(!contact.additional_properties);
        let names: Vec<&str> = contact.properties.iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec!["email", "first_name", "last_name", "company", "phone", "status"]
        );
    }

    #[test]
    fn test_type_acceptance() {
        assert!(JsonType::Integer.accepts(&json!(3)));
        assert!(JsonType::Integer.accepts(&json!(3.0)));
        assert!(!JsonType::Integer.accepts(&json!(3.5)));
        assert!(JsonType::Number.accepts(&json!(3.5)));
        assert!(!JsonType::Object.accepts(&json!([])));
        assert_eq!(JsonType::of(&json!([])).as_str(), "array");
    }

    #[test]
    fn test_schema_from_value_keeps_property_order() {
        let schema = Schema::from_value(&json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "required": ["name"],
            "properties": {
                "zeta": {"type": "number", "minimum": 0},
                "name": {"type": ["string", "null"], "maxLength": 10, "pattern": "^[A-Z]"},
                "tags": {"type": "array", "items": {"type": "string", "format": "uri"}},
                "address": {"type": "object", "properties": {"zip": {"type": "string"}}}
            },
            "additionalProperties": false
        }))
        .unwrap();

        let names: Vec<&str> = schema.properties.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "name", "tags", "address"]);
        let name = schema.properties.get("name").unwrap();
        assert_eq!(name.types, vec![JsonType::String, JsonType::Null]);
        assert_eq!(name.pattern.as_ref().map(Pattern::as_str), Some("^[A-Z]"));
        let tags = schema.properties.get("tags").unwrap();
        assert_eq!(
            tags.items.as_ref().and_then(|i| i.format),
            Some(StringFormat::Unchecked)
        );
        assert!(schema.properties.get("address").unwrap().properties.contains("zip"));
        assert!(!schema.additional_properties);
    }

    #[test]
    fn test_schema_from_value_rejects_bad_input() {
        assert!(Schema::from_value(&json!("contact")).is_err());
        assert!(Schema::from_value(&json!({"properties": {"a": {"pattern": "("}}})).is_err());
        assert!(Schema::from_value(&json!({"properties": {"a": {"type": "date"}}})).is_err());
        assert!(Schema::from_value(&json!({})).unwrap().additional_properties);
    }

    #[test]
    fn test_register_extends_registry() {
        let mut registry = SchemaRegistry::builtin();
        assert!(registry
            .register("incident", Schema::default().require("severity"))
            .is_none());
        assert_eq!(registry.names(), vec!["contact", "event", "incident"]);
        assert!(get_schema_by_type("incident").is_none());
    }
}
