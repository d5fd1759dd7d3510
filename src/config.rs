use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;

pub const DEFAULT_EMAIL_DOMAIN_WEIGHT: f64 = 20.0;
pub const DEFAULT_EMAIL_FORMAT_WEIGHT: f64 = 15.0;
pub const DEFAULT_PHONE_WEIGHT: f64 = 15.0;
pub const DEFAULT_COMPANY_WEIGHT: f64 = 10.0;
pub const DEFAULT_SOURCE_WEIGHT: f64 = 10.0;
pub const DEFAULT_STATUS_WEIGHT: f64 = 10.0;
pub const DEFAULT_DATA_COMPLETENESS_WEIGHT: f64 = 20.0;

/// Maximum contribution of each risk factor.
///
/// Defaults sum to 100. Caller-supplied weights replace the defaults as-is;
/// they are not re-normalized, and the final score is clamped instead.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskWeights {
    #[serde(alias = "email_domain_weight")]
    pub email_domain_weight: f64,
    #[serde(alias = "email_format_weight")]
    pub email_format_weight: f64,
    #[serde(alias = "phone_weight")]
    pub phone_weight: f64,
    #[serde(alias = "company_weight")]
    pub company_weight: f64,
    #[serde(alias = "source_weight")]
    pub source_weight: f64,
    #[serde(alias = "status_weight")]
    pub status_weight: f64,
    #[serde(alias = "data_completeness_weight")]
    pub data_completeness_weight: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            email_domain_weight: DEFAULT_EMAIL_DOMAIN_WEIGHT,
            email_format_weight: DEFAULT_EMAIL_FORMAT_WEIGHT,
            phone_weight: DEFAULT_PHONE_WEIGHT,
            company_weight: DEFAULT_COMPANY_WEIGHT,
            source_weight: DEFAULT_SOURCE_WEIGHT,
            status_weight: DEFAULT_STATUS_WEIGHT,
            data_completeness_weight: DEFAULT_DATA_COMPLETENESS_WEIGHT,
        }
    }
}

impl RiskWeights {
    /// Builds weights from a workflow step's options object.
    ///
    /// Accepts `emailDomainWeight` style keys as well as their snake_case
    /// spellings. Missing keys keep their defaults; unknown keys are ignored.
    pub fn from_options(options: &Value) -> Result<Self, AppError> {
        if !options.is_object() {
            return Err(AppError::Config(
                "Risk options must be an object".to_string(),
            ));
        }
        let weights: RiskWeights = serde_json::from_value(options.clone())
            .map_err(|e| AppError::Config(format!("Invalid risk options: {}", e)))?;
        weights.check()?;
        Ok(weights)
    }

    /// Rejects negative or non-finite weights.
    pub fn check(&self) -> Result<(), AppError> {
        for (name, weight) in self.named() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AppError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }

    /// Sum of all factor weights (may exceed 100).
    pub fn total(&self) -> f64 {
        self.named().iter().map(|(_, w)| w).sum()
    }

    fn named(&self) -> [(&'static str, f64); 7] {
        [
            ("emailDomainWeight", self.email_domain_weight),
            ("emailFormatWeight", self.email_format_weight),
            ("phoneWeight", self.phone_weight),
            ("companyWeight", self.company_weight),
            ("sourceWeight", self.source_weight),
            ("statusWeight", self.status_weight),
            ("dataCompletenessWeight", self.data_completeness_weight),
        ]
    }
}

/// Process-level settings for hosts embedding the utilities.
#[derive(Debug, Clone)]
pub struct Config {
    pub risk_weights: RiskWeights,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = RiskWeights::default();
        let risk_weights = RiskWeights {
            email_domain_weight: weight_from_env(
                "RISK_WEIGHT_EMAIL_DOMAIN",
                defaults.email_domain_weight,
            )?,
            email_format_weight: weight_from_env(
                "RISK_WEIGHT_EMAIL_FORMAT",
                defaults.email_format_weight,
            )?,
            phone_weight: weight_from_env("RISK_WEIGHT_PHONE", defaults.phone_weight)?,
            company_weight: weight_from_env("RISK_WEIGHT_COMPANY", defaults.company_weight)?,
            source_weight: weight_from_env("RISK_WEIGHT_SOURCE", defaults.source_weight)?,
            status_weight: weight_from_env("RISK_WEIGHT_STATUS", defaults.status_weight)?,
            data_completeness_weight: weight_from_env(
                "RISK_WEIGHT_DATA_COMPLETENESS",
                defaults.data_completeness_weight,
            )?,
        };

        let config = Self {
            risk_weights,
            log_filter: std::env::var("LOG_FILTER")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| crate::obs::DEFAULT_LOG_FILTER.to_string()),
        };

        tracing::debug!(
            "Risk weights loaded (total {}): {:?}",
            config.risk_weights.total(),
            config.risk_weights
        );
        if config.risk_weights.total() > 100.0 {
            tracing::warn!(
                "Risk weights sum to {}; scores will be clamped to 100",
                config.risk_weights.total()
            );
        }

        Ok(config)
    }
}

fn weight_from_env(key: &str, default: f64) -> anyhow::Result<f64> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => parse_weight(key, &raw),
        _ => Ok(default),
    }
}

fn parse_weight(key: &str, raw: &str) -> anyhow::Result<f64> {
    let weight: f64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a number, got '{}'", key, raw))?;
    if !weight.is_finite() || weight < 0.0 {
        anyhow::bail!("{} must be a non-negative number, got {}", key, weight);
    }
    Ok(weight)
}
