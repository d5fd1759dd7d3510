use std::fmt;

/// Error types raised by the contact utilities.
///
/// Only malformed top-level input and unusable emails are fatal. Per-field
/// anomalies are absorbed into scores or normalized away, and payload
/// validation reports problems through `ValidationResult` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// The input record was not a JSON object.
    InvalidInput(String),
    /// No usable email was found, or the resolved email is malformed.
    InvalidEmail(String),
    /// A validation result was converted into a hard failure.
    ValidationFailed(Vec<String>),
    /// Unusable configuration values.
    Config(String),
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            AppError::ValidationFailed(errors) => {
                write!(f, "Validation failed: {}", errors.join(", "))
            }
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Shorthand for the "not an object" failure shared by scorer and normalizer.
    pub(crate) fn not_an_object() -> Self {
        AppError::InvalidInput("Contact data must be an object".to_string())
    }
}
