//! Non-fatal data quality warnings
//!
//! Warnings never abort a computation. They are attached to baselines,
//! assessments and composite results so a UI can mark low-confidence scores.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{MetricKind, Measurement};

/// A data quality problem detected while scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// Too many beats rejected as artifacts during the recording
    HighArtifactRate { percent: f64, max_percent: f64 },

    /// Recording too short for a stable RMSSD
    ShortMeasurement { seconds: u32, min_seconds: u32 },

    /// Questionnaire answered with the same value for every question
    IdenticalResponses { value: f64 },

    /// Value outside the physiologically plausible range
    ImplausibleValue { metric: MetricKind, value: f64 },

    /// Baseline too variable to be a reliable reference
    UnstableBaseline { metric: MetricKind, cv_percent: f64 },

    /// Baseline readings with (near) zero spread
    IdenticalValues { metric: MetricKind },

    /// Samples dropped by baseline quality filtering
    RejectedSamples { metric: MetricKind, count: usize },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::HighArtifactRate { percent, max_percent } => write!(
                f,
                "{:.1}% of beats were artifacts (limit {:.0}%)",
                percent, max_percent
            ),
            DataQualityWarning::ShortMeasurement { seconds, min_seconds } => write!(
                f,
                "measurement lasted {}s, at least {}s recommended",
                seconds, min_seconds
            ),
            DataQualityWarning::IdenticalResponses { value } => {
                write!(f, "every wellness question was answered {}", value)
            }
            DataQualityWarning::ImplausibleValue { metric, value } => {
                let (min, max) = metric.plausible_range();
                write!(
                    f,
                    "{} of {}{} is outside the plausible range {}-{}{}",
                    metric,
                    value,
                    metric.unit(),
                    min,
                    max,
                    metric.unit()
                )
            }
            DataQualityWarning::UnstableBaseline { metric, cv_percent } => write!(
                f,
                "{} baseline varies by {:.1}% day to day",
                metric, cv_percent
            ),
            DataQualityWarning::IdenticalValues { metric } => {
                write!(f, "{} baseline readings show no day-to-day variation", metric)
            }
            DataQualityWarning::RejectedSamples { metric, count } => {
                write!(f, "{} {} readings were excluded from the baseline", count, metric)
            }
        }
    }
}

/// Check a single reading against measurement-quality limits
pub fn check_measurement(
    metric: MetricKind,
    measurement: &Measurement,
    max_artifact_percent: f64,
    min_duration_seconds: u32,
) -> Vec<DataQualityWarning> {
    let mut warnings = Vec::new();

    if !metric.is_plausible(measurement.value) {
        warnings.push(DataQualityWarning::ImplausibleValue {
            metric,
            value: measurement.value,
        });
    }

    if let Some(percent) = measurement.artifact_percent {
        if percent > max_artifact_percent {
            warnings.push(DataQualityWarning::HighArtifactRate {
                percent,
                max_percent: max_artifact_percent,
            });
        }
    }

    if let Some(seconds) = measurement.duration_seconds {
        if seconds < min_duration_seconds {
            warnings.push(DataQualityWarning::ShortMeasurement {
                seconds,
                min_seconds: min_duration_seconds,
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_measurement_has_no_warnings() {
        let m = Measurement {
            value: 55.0,
            artifact_percent: Some(1.0),
            duration_seconds: Some(120),
        };
        assert!(check_measurement(MetricKind::Hrv, &m, 5.0, 60).is_empty());
    }

    #[test]
    fn test_measurement_warnings() {
        let m = Measurement {
            value: 250.0,
            artifact_percent: Some(12.0),
            duration_seconds: Some(30),
        };
        let warnings = check_measurement(MetricKind::Hrv, &m, 5.0, 60);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].to_string().contains("plausible"));
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let w = DataQualityWarning::IdenticalValues {
            metric: MetricKind::RestingHr,
        };
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.contains("\"kind\":\"identical_values\""));
        assert!(json.contains("\"metric\":\"resting_hr\""));
    }
}
