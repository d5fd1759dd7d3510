//! Payload validation against named schemas.
//!
//! Validation never fails: every problem becomes a human-readable entry in
//! [`ValidationResult::errors`]. Structural problems (non-object payload,
//! unknown schema) stop early with a single error; field problems are
//! collected exhaustively in this order:
//! 1. missing required fields, in declared order
//! 2. per-field violations, in schema property order
//! 3. unexpected fields, in payload key order

use serde_json::Value;

use crate::formats::{is_valid_date_time, is_valid_email};
use crate::models::ValidationResult;
use crate::schema::{builtin_registry, FieldSchema, JsonType, Schema, SchemaRegistry, StringFormat};

/// Validates `payload` against `schema`, or the built-in schema named
/// `schema_type` when no explicit schema is supplied.
pub fn validate_payload(
    payload: &Value,
    schema_type: &str,
    schema: Option<&Schema>,
) -> ValidationResult {
    validate_with_registry(builtin_registry(), payload, schema_type, schema)
}

/// Entry point for raw workflow input, where the schema type and an optional
/// inline schema arrive as untyped JSON.
pub fn validate_payload_value(
    payload: &Value,
    schema_type: &Value,
    schema: Option<&Value>,
) -> ValidationResult {
    if !payload.is_object() {
        return ValidationResult::rejected("Payload must be an object");
    }
    let Some(schema_type) = schema_type.as_str() else {
        return ValidationResult::rejected("Schema type must be a string");
    };

    match schema.filter(|s| !s.is_null()).map(Schema::from_value) {
        None => validate_payload(payload, schema_type, None),
        Some(Ok(schema)) => validate_payload(payload, schema_type, Some(&schema)),
        Some(Err(e)) => ValidationResult::rejected(e.to_string()),
    }
}

pub(crate) fn validate_with_registry(
    registry: &SchemaRegistry,
    payload: &Value,
    schema_type: &str,
    schema: Option<&Schema>,
) -> ValidationResult {
    let Some(payload) = payload.as_object() else {
        return ValidationResult::rejected("Payload must be an object");
    };
    if schema_type.is_empty() {
        return ValidationResult::rejected("Schema type must be a string");
    }
    let Some(schema) = schema.or_else(|| registry.get(schema_type)) else {
        return ValidationResult::rejected(format!("Unknown schema type: {}", schema_type));
    };

    let mut errors = Vec::new();

    for field in &schema.required {
        if payload.get(field).map_or(true, Value::is_null) {
            errors.push(format!("Missing required field: {}", field));
        }
    }

    for (field, field_schema) in schema.properties.iter() {
        if let Some(value) = payload.get(field) {
            collect_field_errors(value, field_schema, field, &mut errors);
        }
    }

    if !schema.additional_properties {
        for field in payload.keys() {
            if !schema.declares(field) {
                errors.push(format!("Unexpected field: {}", field));
            }
        }
    }

    if !errors.is_empty() {
        tracing::debug!(
            schema_type,
            error_count = errors.len(),
            "Payload failed validation"
        );
    }

    ValidationResult::from_errors(errors)
}

/// Validates one value against its field schema; `path` prefixes every error.
pub fn validate_field(value: &Value, schema: &FieldSchema, path: &str) -> Vec<String> {
    let mut errors = Vec::new();
    collect_field_errors(value, schema, path, &mut errors);
    errors
}

fn collect_field_errors(value: &Value, schema: &FieldSchema, path: &str, errors: &mut Vec<String>) {
    if !schema.types.is_empty() && !schema.types.iter().any(|kind| kind.accepts(value)) {
        let expected: Vec<&str> = schema.types.iter().map(JsonType::as_str).collect();
        errors.push(format!(
            "{}: expected type {}, got {}",
            path,
            expected.join(" or "),
            JsonType::of(value).as_str()
        ));
        return;
    }

    match value {
        Value::String(s) => check_string(s, schema, path, errors),
        Value::Number(n) => {
            if let Some(n) = n.as_f64() {
                check_number(n, schema, path, errors);
            }
        }
        _ => {}
    }

    if let Some(allowed) = &schema.allowed_values {
        if !allowed.iter().any(|candidate| same_value(candidate, value)) {
            let listed: Vec<String> = allowed.iter().map(display_value).collect();
            errors.push(format!(
                "{}: value must be one of: {}",
                path,
                listed.join(", ")
            ));
        }
    }

    match value {
        Value::Array(items) => {
            if let Some(item_schema) = &schema.items {
                for (index, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, index);
                    collect_field_errors(item, item_schema, &item_path, errors);
                }
            }
        }
        Value::Object(fields) => {
            for (name, sub_schema) in schema.properties.iter() {
                if let Some(sub_value) = fields.get(name) {
                    let sub_path = format!("{}.{}", path, name);
                    collect_field_errors(sub_value, sub_schema, &sub_path, errors);
                }
            }
        }
        _ => {}
    }
}

fn check_string(value: &str, schema: &FieldSchema, path: &str, errors: &mut Vec<String>) {
    let length = value.chars().count();

    if let Some(min) = schema.min_length {
        if length < min {
            errors.push(format!("{}: string length must be at least {}", path, min));
        }
    }
    if let Some(max) = schema.max_length {
        if length > max {
            errors.push(format!("{}: string length must be at most {}", path, max));
        }
    }
    if let Some(pattern) = &schema.pattern {
        if !pattern.is_match(value) {
            errors.push(format!("{}: string does not match required pattern", path));
        }
    }
    match schema.format {
        Some(StringFormat::Email) if !is_valid_email(value) => {
            errors.push(format!("{}: invalid email format", path));
        }
        Some(StringFormat::DateTime) if !is_valid_date_time(value) => {
            errors.push(format!(
                "{}: invalid date-time format (expected ISO 8601)",
                path
            ));
        }
        _ => {}
    }
}

fn check_number(value: f64, schema: &FieldSchema, path: &str, errors: &mut Vec<String>) {
    if let Some(min) = schema.minimum {
        if value < min {
            errors.push(format!("{}: value must be at least {}", path, format_number(min)));
        }
    }
    if let Some(max) = schema.maximum {
        if value > max {
            errors.push(format!("{}: value must be at most {}", path, format_number(max)));
        }
    }
}

/// JSON equality where `1` and `1.0` are the same number.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Strings unquoted, everything else as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whole bounds print without a trailing `.0`.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
