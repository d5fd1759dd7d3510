//! Contact risk scoring
//!
//! A contact's risk score (0 = low risk, 100 = high risk) is the sum of seven
//! independent factors, each bounded by its configured weight:
//! 1. Email domain (disposable vs. consumer vs. corporate)
//! 2. Email format (malformed or placeholder-looking addresses)
//! 3. Phone (missing, short, repeated digits)
//! 4. Company (missing or placeholder names)
//! 5. Lead source
//! 6. Lead status
//! 7. Data completeness
//!
//! A missing email saturates both email factors. That double penalty is kept.
use once_cell::sync::Lazy;
use regex::RegexSet;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::RiskWeights;
use crate::errors::AppError;
use crate::formats::is_valid_email;

/// Disposable mailbox providers, matched as substrings of the domain.
const DISPOSABLE_DOMAINS: &[&str] = &[
    "tempmail.com",
    "10minutemail.com",
    "guerrillamail.com",
    "mailinator.com",
    "throwaway.email",
    "temp-mail.org",
];

/// Major consumer providers, matched exactly.
const CONSUMER_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "outlook.com",
    "hotmail.com",
    "icloud.com",
    "protonmail.com",
    "aol.com",
];

const SUSPICIOUS_COMPANIES: &[&str] = &["test", "fake", "spam", "temp", "unknown", "n/a", "na"];

const HIGH_RISK_SOURCES: &[&str] = &["spam", "unknown", "test", "fake"];
const LOW_RISK_SOURCES: &[&str] = &["website", "referral", "event", "partner", "organic"];

const REQUIRED_FIELDS: &[&str] = &["email"];
const IMPORTANT_FIELDS: &[&str] = &["first_name", "last_name", "company", "phone"];

/// All-digit local parts and placeholder words right before the `@`.
static SUSPICIOUS_EMAIL_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([r"^[0-9]+@", r"(?i)test@", r"(?i)fake@", r"(?i)spam@", r"(?i)temp@"])
        .expect("suspicious email patterns")
});

/// Per-factor contributions of a single scoring run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskBreakdown {
    pub email_domain: f64,
    pub email_format: f64,
    pub phone: f64,
    pub company: f64,
    pub source: f64,
    pub status: f64,
    pub data_completeness: f64,
}

impl RiskBreakdown {
    /// Unclamped sum of all factors.
    pub fn total(&self) -> f64 {
        self.email_domain
            + self.email_format
            + self.phone
            + self.company
            + self.source
            + self.status
            + self.data_completeness
    }

    /// Final score: total clamped to [0, 100] and rounded.
    pub fn score(&self) -> u8 {
        self.total().clamp(0.0, 100.0).round() as u8
    }
}

/// Computes the risk score (0-100) of a contact record.
///
/// `config` defaults to [`RiskWeights::default`]. Fails only when `contact`
/// is not a JSON object.
pub fn compute_risk_score(contact: &Value, config: Option<&RiskWeights>) -> Result<u8, AppError> {
    compute_risk_breakdown(contact, config).map(|breakdown| breakdown.score())
}

/// Computes every factor's contribution without collapsing them into a score.
pub fn compute_risk_breakdown(
    contact: &Value,
    config: Option<&RiskWeights>,
) -> Result<RiskBreakdown, AppError> {
    let contact = contact.as_object().ok_or_else(AppError::not_an_object)?;
    let weights = config.copied().unwrap_or_default();

    let breakdown = RiskBreakdown {
        email_domain: email_domain_risk(contact.get("email"), weights.email_domain_weight),
        email_format: email_format_risk(contact.get("email"), weights.email_format_weight),
        phone: phone_risk(contact.get("phone"), weights.phone_weight),
        company: company_risk(contact.get("company"), weights.company_weight),
        source: source_risk(contact.get("source"), weights.source_weight),
        status: status_risk(contact.get("status"), weights.status_weight),
        data_completeness: data_completeness_risk(contact, weights.data_completeness_weight),
    };

    tracing::debug!(
        score = breakdown.score(),
        email_domain = breakdown.email_domain,
        email_format = breakdown.email_format,
        phone = breakdown.phone,
        company = breakdown.company,
        source = breakdown.source,
        status = breakdown.status,
        data_completeness = breakdown.data_completeness,
        "Computed contact risk"
    );

    Ok(breakdown)
}

/// Risk from the email's domain.
pub fn email_domain_risk(email: Option<&Value>, max_weight: f64) -> f64 {
    let Some(email) = present_str(email) else {
        return bounded(max_weight, max_weight);
    };

    let domain = match email.split('@').nth(1) {
        Some(domain) if !domain.is_empty() => domain,
        _ => return bounded(max_weight, max_weight),
    };
    let lowered = domain.to_lowercase();

    if DISPOSABLE_DOMAINS.iter().any(|d| lowered.contains(d)) {
        return bounded(max_weight, max_weight);
    }
    if CONSUMER_DOMAINS.contains(&lowered.as_str()) {
        return bounded(max_weight * 0.1, max_weight);
    }
    // Plausible corporate domain
    if domain.contains('.') && !domain.contains("..") {
        return bounded(max_weight * 0.3, max_weight);
    }

    bounded(max_weight * 0.5, max_weight)
}

/// Risk from the email's syntax and placeholder-looking local parts.
pub fn email_format_risk(email: Option<&Value>, max_weight: f64) -> f64 {
    let Some(email) = present_str(email) else {
        return bounded(max_weight, max_weight);
    };

    if !is_valid_email(email) {
        return bounded(max_weight, max_weight);
    }
    if SUSPICIOUS_EMAIL_PATTERNS.is_match(email) {
        return bounded(max_weight * 0.8, max_weight);
    }

    0.0
}

/// Risk from a missing, short or repeated-digit phone number.
pub fn phone_risk(phone: Option<&Value>, max_weight: f64) -> f64 {
    let Some(phone) = present_text(phone) else {
        return bounded(max_weight * 0.7, max_weight);
    };

    let stripped: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.'))
        .collect();
    if stripped.chars().count() < 10 {
        return bounded(max_weight * 0.8, max_weight);
    }

    let digits: Vec<char> = stripped.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() > 1 && digits.iter().all(|d| *d == digits[0]) {
        return bounded(max_weight * 0.6, max_weight);
    }

    0.0
}

/// Risk from a missing or placeholder company name.
pub fn company_risk(company: Option<&Value>, max_weight: f64) -> f64 {
    let company = match present_text(company) {
        Some(company) if !company.trim().is_empty() => company,
        _ => return bounded(max_weight * 0.5, max_weight),
    };

    let lowered = company.trim().to_lowercase();
    if SUSPICIOUS_COMPANIES.contains(&lowered.as_str()) {
        return bounded(max_weight * 0.7, max_weight);
    }

    0.0
}

/// Risk from the lead source.
pub fn source_risk(source: Option<&Value>, max_weight: f64) -> f64 {
    let Some(source) = present_text(source) else {
        return bounded(max_weight * 0.4, max_weight);
    };

    let lowered = source.trim().to_lowercase();
    if HIGH_RISK_SOURCES.contains(&lowered.as_str()) {
        return bounded(max_weight * 0.8, max_weight);
    }
    if LOW_RISK_SOURCES.contains(&lowered.as_str()) {
        return 0.0;
    }

    bounded(max_weight * 0.3, max_weight)
}

/// Risk from the lead status. Only `lost` carries risk.
pub fn status_risk(status: Option<&Value>, max_weight: f64) -> f64 {
    match present_text(status) {
        Some(status) if status.trim().eq_ignore_ascii_case("lost") => {
            bounded(max_weight * 0.6, max_weight)
        }
        _ => 0.0,
    }
}

/// Risk from missing required and important fields.
pub fn data_completeness_risk(contact: &Map<String, Value>, max_weight: f64) -> f64 {
    let missing = |fields: &[&str]| {
        fields
            .iter()
            .filter(|field| is_missing(contact.get(**field)))
            .count() as f64
    };

    let required_risk = missing(REQUIRED_FIELDS) / REQUIRED_FIELDS.len() as f64 * max_weight * 0.6;
    let important_risk =
        missing(IMPORTANT_FIELDS) / IMPORTANT_FIELDS.len() as f64 * max_weight * 0.4;

    bounded(required_risk + important_risk, max_weight)
}

/// Keeps a factor's contribution inside [0, max_weight].
fn bounded(value: f64, max_weight: f64) -> f64 {
    value.max(0.0).min(max_weight.max(0.0))
}

/// Null, absent, empty strings, `false` and zero all count as missing.
fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

/// A present, non-empty string. Other JSON kinds do not count as an email.
fn present_str(value: Option<&Value>) -> Option<&str> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// A present scalar rendered as text.
fn present_text(value: Option<&Value>) -> Option<String> {
    if is_missing(value) {
        return None;
    }
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_email_domain_tiers() {
        assert_close(email_domain_risk(None, 20.0), 20.0);
        assert_close(email_domain_risk(Some(&json!(42)), 20.0), 20.0);
        assert_close(email_domain_risk(Some(&json!("no-at-sign")), 20.0), 20.0);
        assert_close(email_domain_risk(Some(&json!("a@")), 20.0), 20.0);
        assert_close(email_domain_risk(Some(&json!("a@MAILINATOR.com")), 20.0), 20.0);
        assert_close(email_domain_risk(Some(&json!("a@eu.tempmail.com")), 20.0), 20.0);
        assert_close(email_domain_risk(Some(&json!("a@Gmail.com")), 20.0), 2.0);
        assert_close(email_domain_risk(Some(&json!("a@acme.io")), 20.0), 6.0);
        assert_close(email_domain_risk(Some(&json!("a@acme..io")), 20.0), 10.0);
        assert_close(email_domain_risk(Some(&json!("a@localhost")), 20.0), 10.0);
    }

    #[test]
    fn test_email_format_tiers() {
        assert_close(email_format_risk(None, 15.0), 15.0);
        assert_close(email_format_risk(Some(&json!("not an email")), 15.0), 15.0);
        assert_close(email_format_risk(Some(&json!("12345@acme.io")), 15.0), 12.0);
        assert_close(email_format_risk(Some(&json!("myTEST@acme.io")), 15.0), 12.0);
        assert_close(email_format_risk(Some(&json!("temp@acme.io")), 15.0), 12.0);
        assert_close(email_format_risk(Some(&json!("jane.doe@acme.io")), 15.0), 0.0);
        assert_close(email_format_risk(Some(&json!("tester1@acme.io")), 15.0), 0.0);
    }

    #[test]
    fn test_phone_tiers() {
        assert_close(phone_risk(None, 15.0), 10.5);
        assert_close(phone_risk(Some(&json!("")), 15.0), 10.5);
        assert_close(phone_risk(Some(&json!("555-1234")), 15.0), 12.0);
        assert_close(phone_risk(Some(&json!("(555) 555-5555")), 15.0), 9.0);
        assert_close(phone_risk(Some(&json!("+1 (415) 555-0123")), 15.0), 0.0);
        assert_close(phone_risk(Some(&json!(4155550123u64)), 15.0), 0.0);
    }

    #[test]
    fn test_company_source_status() {
        assert_close(company_risk(None, 10.0), 5.0);
        assert_close(company_risk(Some(&json!("   ")), 10.0), 5.0);
        assert_close(company_risk(Some(&json!(" N/A ")), 10.0), 7.0);
        assert_close(company_risk(Some(&json!("Acme Corp")), 10.0), 0.0);

        assert_close(source_risk(None, 10.0), 4.0);
        assert_close(source_risk(Some(&json!("SPAM")), 10.0), 8.0);
        assert_close(source_risk(Some(&json!("Website")), 10.0), 0.0);
        assert_close(source_risk(Some(&json!("linkedin")), 10.0), 3.0);

        assert_close(status_risk(None, 10.0), 0.0);
        assert_close(status_risk(Some(&json!("LOST")), 10.0), 6.0);
        assert_close(status_risk(Some(&json!("qualified")), 10.0), 0.0);
        assert_close(status_risk(Some(&json!("contacted")), 10.0), 0.0);
    }

    #[test]
    fn test_data_completeness() {
        let empty = Map::new();
        assert_close(data_completeness_risk(&empty, 20.0), 20.0);

        let partial = json!({"email": "a@b.com", "first_name": "Ann", "phone": ""});
        // 3 of 4 important fields missing: 0.75 * 20 * 0.4
        assert_close(data_completeness_risk(partial.as_object().unwrap(), 20.0), 6.0);
    }

    #[test]
    fn test_negative_weight_contributes_nothing() {
        assert_close(email_domain_risk(None, -5.0), 0.0);
        assert_close(phone_risk(None, -5.0), 0.0);
    }

    #[test]
    fn test_breakdown_score_rounds_and_clamps() {
        let breakdown = RiskBreakdown {
            email_domain: 40.0,
            email_format: 40.0,
            phone: 40.0,
            company: 0.0,
            source: 0.0,
            status: 0.0,
            data_completeness: 0.0,
        };
        assert_eq!(breakdown.total(), 120.0);
        assert_eq!(breakdown.score(), 100);

        let half = RiskBreakdown {
            email_domain: 2.0,
            email_format: 0.0,
            phone: 0.0,
            company: 0.0,
            source: 0.0,
            status: 0.0,
            data_completeness: 0.5,
        };
        assert_eq!(half.score(), 3);
    }
}
