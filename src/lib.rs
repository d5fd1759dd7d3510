//! Contact Pipeline Utilities Library
//!
//! Stateless transformation steps for workflow pipelines that handle contact
//! and event records: risk scoring, contact normalization and payload
//! validation. Every operation is a pure function over `serde_json` values.
//!
//! # Modules
//!
//! - `core`: Namespace for the three pipeline steps.
//! - `config`: Risk weights and environment configuration.
//! - `errors`: Error handling types.
//! - `formats`: Email, UUID and timestamp format checks.
//! - `models`: Normalized contact and validation result models.
//! - `normalize`: Contact normalization.
//! - `obs`: Observability and logging.
//! - `risk`: Contact risk scoring.
//! - `schema`: Schema definitions and the built-in registry.
//! - `validation`: Payload validation.

pub mod core;

pub mod config;
pub mod errors;
pub mod formats;
pub mod models;
pub mod normalize;
pub mod obs;
pub mod risk;
pub mod schema;
pub mod validation;

pub use config::{Config, RiskWeights};
pub use errors::AppError;
pub use models::{NormalizedContact, RawContact, ValidationResult};
pub use normalize::normalize_contact;
pub use risk::compute_risk_score;
pub use schema::{Schema, SchemaRegistry};
pub use validation::validate_payload;
