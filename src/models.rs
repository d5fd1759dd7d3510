use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::errors::AppError;

/// Contact data as received from any upstream source (CRM export, form
/// submission, spreadsheet row). Key order is preserved.
pub type RawContact = Map<String, Value>;

// ============ Normalized Contact ============

/// Canonical contact shape produced by [`crate::normalize::normalize_contact`].
///
/// `email` is always present and valid. Every other field is either absent
/// or already normalized. Absent fields are omitted when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedContact {
    /// Canonical lowercase UUID, if the source carried a well-formed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Lowercase, syntactically valid email address.
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Phone with formatting stripped, `+`-prefixed when the country is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContactStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Input fields that did not map onto a standard field.
    #[serde(default)]
    pub custom_fields: Map<String, Value>,
    /// ISO 8601 UTC timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// ISO 8601 UTC timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub metadata: ContactMetadata,
}

impl NormalizedContact {
    /// Returns the contact with `metadata.risk_score` set, as the pipeline
    /// does after scoring a freshly normalized record.
    pub fn with_risk_score(mut self, score: u8) -> Self {
        self.metadata.risk_score = Some(Number::from(score));
        self
    }

    /// Serializes the contact into the JSON record handed back to the workflow.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Lead lifecycle status.
///
/// Known spellings collapse onto the five canonical tokens; anything else is
/// kept as a lowercase free-form value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContactStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
    Other(String),
}

impl ContactStatus {
    /// Case-insensitive lookup of a status spelling.
    pub fn parse(raw: &str) -> Option<Self> {
        let token = raw.trim().to_lowercase();
        let status = match token.as_str() {
            "" => return None,
            "new" => ContactStatus::New,
            "contacted" => ContactStatus::Contacted,
            "qualified" => ContactStatus::Qualified,
            "converted" => ContactStatus::Converted,
            "lost" => ContactStatus::Lost,
            _ => ContactStatus::Other(token),
        };
        Some(status)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContactStatus::New => "new",
            ContactStatus::Contacted => "contacted",
            ContactStatus::Qualified => "qualified",
            ContactStatus::Converted => "converted",
            ContactStatus::Lost => "lost",
            ContactStatus::Other(token) => token,
        }
    }
}

impl From<String> for ContactStatus {
    fn from(raw: String) -> Self {
        ContactStatus::parse(&raw).unwrap_or(ContactStatus::Other(raw))
    }
}

impl From<ContactStatus> for String {
    fn from(status: ContactStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Progress of the external enrichment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl EnrichmentStatus {
    /// Case-insensitive exact match; anything else is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pending" => Some(EnrichmentStatus::Pending),
            "in_progress" => Some(EnrichmentStatus::InProgress),
            "completed" => Some(EnrichmentStatus::Completed),
            "failed" => Some(EnrichmentStatus::Failed),
            _ => None,
        }
    }
}

/// Pipeline bookkeeping attached to a contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactMetadata {
    /// Score in [0, 100], kept exactly as supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment_status: Option<EnrichmentStatus>,
    /// ISO 8601 UTC timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_enriched_at: Option<String>,
}

impl ContactMetadata {
    pub fn is_empty(&self) -> bool {
        self.risk_score.is_none()
            && self.enrichment_status.is_none()
            && self.last_enriched_at.is_none()
    }
}

// ============ Validation ============

/// Outcome of a payload validation. Built once per call and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// A failed result carrying a single structural error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::from_errors(vec![message.into()])
    }

    /// Converts into a hard failure for hosts that abort on invalid payloads.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.valid {
            Ok(())
        } else {
            Err(AppError::ValidationFailed(self.errors))
        }
    }
}
