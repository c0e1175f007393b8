//! Unified error hierarchy for readyrs
//!
//! Fatal errors abort a single computation and carry enough detail to tell
//! the athlete what to do next. Non-fatal data-quality problems are not errors;
//! they travel with the results as [`crate::quality::DataQualityWarning`].

use thiserror::Error;

use crate::models::MetricKind;

/// Top-level error type for all readiness computations
#[derive(Debug, Error)]
pub enum ReadinessError {
    /// Not enough measurement days to compute a baseline or run an analysis
    #[error("Insufficient data for {subject}: {valid_days} of {required_days} days available")]
    InsufficientData {
        subject: String,
        valid_days: usize,
        required_days: usize,
        days_remaining: usize,
    },

    /// Enough days were recorded, but too many were rejected by quality filtering
    #[error(
        "Insufficient quality for {metric} baseline: {valid_days} valid, {rejected_days} rejected (need {required_days})"
    )]
    InsufficientQuality {
        metric: MetricKind,
        valid_days: usize,
        rejected_days: usize,
        required_days: usize,
    },

    /// Malformed or out-of-range input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input file could not be parsed
    #[error("Import error in {source_name}: {reason}")]
    Import { source_name: String, reason: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Input validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value outside its declared scale
    #[error("{field} = {value} is outside the valid range {min}-{max}")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A required field was not supplied
    #[error("Missing required field: {field}")]
    Missing { field: String },

    /// A field that is not part of the catalog
    #[error("Unknown field: {field}")]
    Unknown { field: String },

    /// Integer scale answered with a fractional value
    #[error("{field} must be a whole number, got {value}")]
    NotInteger { field: String, value: f64 },

    /// NaN or infinite input
    #[error("{field} must be a finite number")]
    NonFinite { field: String },

    /// Structural problem with the input
    #[error("Invalid input: {reason}")]
    Invalid { reason: String },
}

/// Result type alias for readiness operations
pub type Result<T> = std::result::Result<T, ReadinessError>;

impl ReadinessError {
    /// Shorthand for the common "not enough days" case
    pub fn insufficient_data(subject: impl Into<String>, valid_days: usize, required_days: usize) -> Self {
        ReadinessError::InsufficientData {
            subject: subject.into(),
            valid_days,
            required_days,
            days_remaining: required_days.saturating_sub(valid_days),
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ReadinessError::InsufficientData { .. } => ErrorSeverity::Info,
            ReadinessError::InsufficientQuality { .. } => ErrorSeverity::Warning,
            ReadinessError::Validation(_) => ErrorSeverity::Warning,
            ReadinessError::Import { .. } => ErrorSeverity::Error,
            ReadinessError::Configuration(_) => ErrorSeverity::Error,
            ReadinessError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message that prompts corrective action
    pub fn user_message(&self) -> String {
        match self {
            ReadinessError::InsufficientData {
                subject,
                days_remaining,
                ..
            } => {
                let plural = if *days_remaining == 1 { "day" } else { "days" };
                format!(
                    "{} more {} of measurement needed before {} can be calculated.",
                    days_remaining, plural, subject
                )
            }
            ReadinessError::InsufficientQuality {
                metric,
                rejected_days,
                ..
            } => format!(
                "{} of your recent {} readings were unusable. Measure at the same time each morning, lying still, for at least one minute.",
                rejected_days, metric
            ),
            ReadinessError::Validation(err) => format!("Please check your input: {}", err),
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message (e.g. still collecting data)
    Info,
}
