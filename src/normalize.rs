//! Contact normalization.
//!
//! Upstream sources spell the same field many ways (`email`, `Email`,
//! `email_address`, ...). Each canonical field owns an ordered alias list and
//! the first present, non-blank value wins. Every key outside those lists is
//! carried over verbatim into `custom_fields`.

use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::formats::{format_timestamp, is_canonical_uuid, is_valid_email, parse_date_time_value};
use crate::models::{
    ContactMetadata, ContactStatus, EnrichmentStatus, NormalizedContact, RawContact,
};

pub const MAX_TAG_LENGTH: usize = 50;

// ============ Alias Table ============

pub const EMAIL_KEYS: &[&str] = &["email", "Email", "email_address", "emailAddress"];
pub const FIRST_NAME_KEYS: &[&str] = &["first_name", "firstName", "first", "First Name"];
pub const LAST_NAME_KEYS: &[&str] = &["last_name", "lastName", "last", "Last Name"];
pub const COMPANY_KEYS: &[&str] = &["company", "Company", "organization", "Organization"];
pub const PHONE_KEYS: &[&str] = &["phone", "Phone", "phone_number", "phoneNumber"];
pub const TITLE_KEYS: &[&str] = &["title", "Title", "job_title", "jobTitle"];
pub const SOURCE_KEYS: &[&str] = &["source", "Source", "lead_source", "leadSource"];
pub const STATUS_KEYS: &[&str] = &["status", "Status", "lead_status", "leadStatus"];
pub const TAGS_KEYS: &[&str] = &["tags", "Tags", "tag"];
pub const CREATED_AT_KEYS: &[&str] = &["created_at", "createdAt", "Created At", "created"];
pub const UPDATED_AT_KEYS: &[&str] = &["updated_at", "updatedAt", "Updated At", "updated"];
pub const ID_KEYS: &[&str] = &["id", "Id", "ID"];

const METADATA_KEYS: &[&str] = &["metadata", "Metadata"];
const CUSTOM_FIELDS_KEYS: &[&str] = &["custom_fields", "customFields"];

const RISK_SCORE_KEYS: &[&str] = &["risk_score", "riskScore"];
const ENRICHMENT_STATUS_KEYS: &[&str] = &["enrichment_status", "enrichmentStatus"];
const LAST_ENRICHED_AT_KEYS: &[&str] = &["last_enriched_at", "lastEnrichedAt"];

/// Every alias list that maps onto a standard field.
const STANDARD_KEY_SETS: &[&[&str]] = &[
    EMAIL_KEYS,
    FIRST_NAME_KEYS,
    LAST_NAME_KEYS,
    COMPANY_KEYS,
    PHONE_KEYS,
    TITLE_KEYS,
    SOURCE_KEYS,
    STATUS_KEYS,
    TAGS_KEYS,
    CREATED_AT_KEYS,
    UPDATED_AT_KEYS,
    ID_KEYS,
    METADATA_KEYS,
    RISK_SCORE_KEYS,
    ENRICHMENT_STATUS_KEYS,
    LAST_ENRICHED_AT_KEYS,
];

/// Whether `key` is one of the recognized spellings of a standard field.
pub fn is_standard_key(key: &str) -> bool {
    STANDARD_KEY_SETS.iter().any(|keys| keys.contains(&key))
}

/// First alias holding a non-null, non-blank value.
pub fn resolve_field<'a>(contact: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| contact.get(*key))
        .find(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

// ============ Contact ============

/// Normalizes a raw contact record into the canonical shape.
///
/// Fails with `InvalidInput` when `contact` is not an object and with
/// `InvalidEmail` when no usable email is present.
pub fn normalize_contact(contact: &Value) -> Result<NormalizedContact, AppError> {
    let contact = contact.as_object().ok_or_else(AppError::not_an_object)?;
    normalize_record(contact)
}

/// Same as [`normalize_contact`] for callers already holding the record map.
pub fn normalize_record(contact: &RawContact) -> Result<NormalizedContact, AppError> {
    let email = normalize_email(resolve_field(contact, EMAIL_KEYS))?;
    let string_field = |keys: &[&str]| {
        resolve_field(contact, keys).and_then(|value| normalize_string(value, None))
    };

    let normalized = NormalizedContact {
        id: resolve_field(contact, ID_KEYS).and_then(normalize_uuid),
        email,
        first_name: string_field(FIRST_NAME_KEYS),
        last_name: string_field(LAST_NAME_KEYS),
        company: string_field(COMPANY_KEYS),
        phone: resolve_field(contact, PHONE_KEYS).and_then(normalize_phone),
        title: string_field(TITLE_KEYS),
        source: string_field(SOURCE_KEYS),
        status: resolve_field(contact, STATUS_KEYS).and_then(normalize_status),
        tags: normalize_tags(resolve_field(contact, TAGS_KEYS)),
        custom_fields: extract_custom_fields(contact),
        created_at: resolve_field(contact, CREATED_AT_KEYS).and_then(normalize_date_time),
        updated_at: resolve_field(contact, UPDATED_AT_KEYS).and_then(normalize_date_time),
        metadata: normalize_metadata(contact),
    };

    tracing::debug!(
        email = %normalized.email,
        custom_fields = normalized.custom_fields.len(),
        tags = normalized.tags.len(),
        "Normalized contact"
    );

    Ok(normalized)
}

// ============ Field Normalizers ============

/// Trims and lowercases an email, rejecting anything that is not
/// `local@domain.tld` shaped.
pub fn normalize_email(value: Option<&Value>) -> Result<String, AppError> {
    let raw = match value {
        Some(Value::String(s)) if !s.is_empty() => s,
        _ => {
            return Err(AppError::InvalidEmail(
                "Email is required and must be a string".to_string(),
            ))
        }
    };

    let normalized = raw.trim().to_lowercase();
    if !is_valid_email(&normalized) {
        tracing::warn!("Rejected contact with invalid email: {}", raw);
        return Err(AppError::InvalidEmail(format!(
            "Invalid email format: {}",
            raw
        )));
    }

    Ok(normalized)
}

/// Trims a scalar into a string. Blank values and arrays/objects are absent.
pub fn normalize_string(value: &Value, max_length: Option<usize>) -> Option<String> {
    let text = scalar_text(value)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    match max_length {
        Some(max) if trimmed.chars().count() > max => {
            let truncated: String = trimmed.chars().take(max).collect();
            Some(truncated.trim_end().to_string())
        }
        _ => Some(trimmed.to_string()),
    }
}

/// Strips formatting and adds the `+` prefix where the country is implied.
///
/// 11 digits starting with `1` gain `+`; 10 digits are assumed North American
/// and gain `+1`. Anything else is returned stripped but otherwise untouched.
pub fn normalize_phone(value: &Value) -> Option<String> {
    let text = scalar_text(value)?;
    let stripped: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.'))
        .collect();
    if stripped.is_empty() {
        return None;
    }
    if stripped.starts_with('+') || !stripped.chars().all(|c| c.is_ascii_digit()) {
        return Some(stripped);
    }

    match stripped.len() {
        11 if stripped.starts_with('1') => Some(format!("+{}", stripped)),
        10 => Some(format!("+1{}", stripped)),
        _ => Some(stripped),
    }
}

pub fn normalize_status(value: &Value) -> Option<ContactStatus> {
    scalar_text(value).and_then(|text| ContactStatus::parse(&text))
}

/// Accepts a list or a comma-separated string. Entries are trimmed, capped at
/// [`MAX_TAG_LENGTH`] characters, and blanks are dropped.
pub fn normalize_tags(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|tag| normalize_string(tag, Some(MAX_TAG_LENGTH)))
            .collect(),
        Some(Value::String(joined)) => joined
            .split(',')
            .filter_map(|tag| {
                normalize_string(&Value::String(tag.to_string()), Some(MAX_TAG_LENGTH))
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Parses any supported timestamp into ISO 8601 UTC; unparseable is absent.
pub fn normalize_date_time(value: &Value) -> Option<String> {
    parse_date_time_value(value).map(|dt| format_timestamp(&dt))
}

/// Lowercases a UUID and keeps it only in canonical 8-4-4-4-12 form.
pub fn normalize_uuid(value: &Value) -> Option<String> {
    let normalized = scalar_text(value)?.trim().to_lowercase();
    if is_canonical_uuid(&normalized) {
        Some(normalized)
    } else {
        tracing::debug!("Dropping malformed contact id: {}", normalized);
        None
    }
}

/// Collects non-null values under non-standard keys, in input order.
///
/// Entries of an incoming `custom_fields` object come first so that
/// normalizing an already normalized record changes nothing.
pub fn extract_custom_fields(contact: &Map<String, Value>) -> Map<String, Value> {
    let mut custom_fields = Map::new();

    for key in CUSTOM_FIELDS_KEYS {
        if let Some(Value::Object(existing)) = contact.get(*key) {
            for (name, value) in existing {
                if !value.is_null() {
                    custom_fields.insert(name.clone(), value.clone());
                }
            }
        }
    }

    for (key, value) in contact {
        if value.is_null() || is_standard_key(key) {
            continue;
        }
        // A nested bag was merged above
        if CUSTOM_FIELDS_KEYS.contains(&key.as_str()) && value.is_object() {
            continue;
        }
        custom_fields.insert(key.clone(), value.clone());
    }

    custom_fields
}

/// Extracts pipeline metadata from top-level keys or a nested `metadata`
/// object. Values that fail their checks are skipped.
pub fn normalize_metadata(contact: &Map<String, Value>) -> ContactMetadata {
    let mut scopes: Vec<&Map<String, Value>> = vec![contact];
    scopes.extend(
        METADATA_KEYS
            .iter()
            .filter_map(|key| contact.get(*key).and_then(Value::as_object)),
    );
    let candidates = |keys: &'static [&'static str]| {
        scopes
            .clone()
            .into_iter()
            .flat_map(move |scope| keys.iter().filter_map(move |key| scope.get(*key)))
    };

    let risk_score = candidates(RISK_SCORE_KEYS).find_map(|value| match value {
        Value::Number(n) if n.as_f64().is_some_and(|score| (0.0..=100.0).contains(&score)) => {
            Some(n.clone())
        }
        _ => None,
    });
    let enrichment_status = candidates(ENRICHMENT_STATUS_KEYS)
        .find_map(|value| scalar_text(value).and_then(|text| EnrichmentStatus::parse(&text)));
    let last_enriched_at = candidates(LAST_ENRICHED_AT_KEYS).find_map(normalize_date_time);

    ContactMetadata {
        risk_score,
        enrichment_status,
        last_enriched_at,
    }
}

/// Strings as-is, numbers and booleans stringified, everything else absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
