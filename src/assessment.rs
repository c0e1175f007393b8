//! Daily HRV and resting heart rate assessment
//!
//! Compares one morning reading against the athlete's baseline and the last
//! week of readings. The point assessment uses the baseline bands; the
//! rolling window adds a regression trend and a chronic-deviation rule that
//! can only escalate the point result.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::baseline::Baseline;
use crate::error::{ReadinessError, Result, ValidationError};
use crate::models::{Measurement, MetricKind};
use crate::quality::{check_measurement, DataQualityWarning};

/// Daily assessment settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    /// Rolling history length in days
    pub max_history_days: usize,

    /// Baselines computed from fewer readings are refused
    pub min_baseline_samples: usize,

    /// HRV this many standard deviations above the mean is treated as abnormal
    pub abnormal_elevation_sd: f64,

    /// Consecutive days beyond the yellow band that make a deviation chronic
    pub chronic_streak_days: usize,

    /// Measurement quality limits for today's reading
    pub max_artifact_percent: f64,
    pub min_duration_seconds: u32,

    /// Trend slope boundaries in percent of baseline per day
    pub trend_improving_pct: f64,
    pub trend_mild_decline_pct: f64,
    pub trend_significant_decline_pct: f64,

    /// Fewer points than this yields a stable trend
    pub min_trend_points: usize,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        AssessmentConfig {
            max_history_days: 7,
            min_baseline_samples: 14,
            abnormal_elevation_sd: 2.0,
            chronic_streak_days: 3,
            max_artifact_percent: 5.0,
            min_duration_seconds: 60,
            trend_improving_pct: 1.0,
            trend_mild_decline_pct: -1.0,
            trend_significant_decline_pct: -3.0,
            min_trend_points: 3,
        }
    }
}

/// Deviation of a reading from its baseline
///
/// For HRV the unhealthy direction is down (suppression), for resting HR it
/// is up (elevation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationStatus {
    Normal,
    Slight,
    Significant,
    Severe,
    /// Beyond the yellow band for several consecutive days
    Chronic,
    /// HRV far above baseline: possible overtraining paradox or measurement error
    AbnormallyElevated,
}

impl DeviationStatus {
    pub fn describe(&self, metric: MetricKind) -> &'static str {
        match (self, metric) {
            (DeviationStatus::Normal, _) => "normal",
            (DeviationStatus::Slight, MetricKind::Hrv) => "slightly suppressed",
            (DeviationStatus::Significant, MetricKind::Hrv) => "suppressed",
            (DeviationStatus::Severe, MetricKind::Hrv) => "severely suppressed",
            (DeviationStatus::Chronic, MetricKind::Hrv) => "chronically suppressed",
            (DeviationStatus::Slight, MetricKind::RestingHr) => "slightly elevated",
            (DeviationStatus::Significant, MetricKind::RestingHr) => "elevated",
            (DeviationStatus::Severe, MetricKind::RestingHr) => "severely elevated",
            (DeviationStatus::Chronic, MetricKind::RestingHr) => "chronically elevated",
            (DeviationStatus::AbnormallyElevated, _) => "abnormally elevated",
        }
    }

    /// Action implied by this status alone
    pub fn action(&self) -> RecommendedAction {
        match self {
            DeviationStatus::Normal => RecommendedAction::Proceed,
            DeviationStatus::Slight => RecommendedAction::ReduceIntensity,
            DeviationStatus::Significant | DeviationStatus::AbnormallyElevated => RecommendedAction::EasyOnly,
            DeviationStatus::Severe | DeviationStatus::Chronic => RecommendedAction::RestRequired,
        }
    }
}

/// Direction of the rolling-window regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    DecliningMild,
    DecliningSignificant,
}

/// Day-over-day movement of the raw value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    Rising,
    Falling,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    Proceed,
    ReduceIntensity,
    EasyOnly,
    RestRequired,
}

impl fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendedAction::Proceed => write!(f, "proceed as planned"),
            RecommendedAction::ReduceIntensity => write!(f, "reduce intensity"),
            RecommendedAction::EasyOnly => write!(f, "easy training only"),
            RecommendedAction::RestRequired => write!(f, "rest required"),
        }
    }
}

/// Result of assessing one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAssessment {
    pub metric: MetricKind,
    pub value: f64,
    pub baseline_id: Uuid,
    pub baseline_mean: f64,

    /// Value as a percentage of the baseline mean
    pub percent_of_baseline: f64,

    /// Value minus baseline mean, in the metric's unit
    pub deviation: f64,

    pub z_score: f64,
    pub status: DeviationStatus,

    pub trend: TrendDirection,

    /// Regression slope in percent of baseline per day, sign-corrected so
    /// positive always means improving
    pub trend_slope_pct: f64,

    /// Consecutive days moving in `movement` direction, ending today
    pub consecutive_days: usize,
    pub movement: Movement,

    /// Longest run of consecutive days beyond the yellow band within the
    /// chronic window ending today
    pub days_beyond_yellow: usize,

    pub action: RecommendedAction,

    pub warnings: Vec<DataQualityWarning>,
}

impl DailyAssessment {
    pub fn status_label(&self) -> &'static str {
        self.status.describe(self.metric)
    }
}

/// Assesses daily readings against a baseline
#[derive(Debug, Clone, Default)]
pub struct DailyMetricAssessor {
    config: AssessmentConfig,
}

impl DailyMetricAssessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AssessmentConfig) -> Self {
        DailyMetricAssessor { config }
    }

    /// Assess today's reading against a run of consecutive preceding days
    ///
    /// `history` holds the preceding days' raw values, oldest first, one per
    /// calendar day with no gaps. Only the most recent `max_history_days` are
    /// used.
    pub fn assess(&self, today: impl Into<Measurement>, baseline: &Baseline, history: &[f64]) -> Result<DailyAssessment> {
        let days: Vec<Option<f64>> = history.iter().copied().map(Some).collect();
        self.assess_days(today, baseline, &days)
    }

    /// Assess today's reading against calendar-day history
    ///
    /// `history` has one slot per preceding calendar day, oldest first, and
    /// the last slot is yesterday. `None` marks a day without a reading; a
    /// missing or implausible day breaks every consecutive-day count.
    pub fn assess_days(
        &self,
        today: impl Into<Measurement>,
        baseline: &Baseline,
        history: &[Option<f64>],
    ) -> Result<DailyAssessment> {
        let cfg = &self.config;
        let today = today.into();
        let metric = baseline.metric;

        if baseline.sample_count < cfg.min_baseline_samples {
            return Err(ReadinessError::insufficient_data(
                format!("{} assessment", metric),
                baseline.sample_count,
                cfg.min_baseline_samples,
            ));
        }
        validate_value(metric, today.value)?;
        if history.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ValidationError::NonFinite {
                field: format!("{} history", metric),
            }
            .into());
        }

        let warnings = check_measurement(metric, &today, cfg.max_artifact_percent, cfg.min_duration_seconds);

        let skip = history.len().saturating_sub(cfg.max_history_days);
        let mut window: Vec<Option<f64>> = history[skip..]
            .iter()
            .map(|v| v.filter(|v| metric.is_plausible(*v)))
            .collect();
        window.push(Some(today.value));

        // chronic window: the streak length plus two days of slack, today included
        let span = &window[window.len().saturating_sub(cfg.chronic_streak_days + 2)..];
        let days_beyond_yellow = longest_run(span, |v| baseline.is_beyond_yellow(v));

        let status = if days_beyond_yellow >= cfg.chronic_streak_days {
            DeviationStatus::Chronic
        } else {
            self.point_status(baseline, today.value)
        };

        let (trend, trend_slope_pct) = self.trend(baseline, &window);
        let (movement, consecutive_days) = consecutive_movement(&window);

        let assessment = DailyAssessment {
            metric,
            value: today.value,
            baseline_id: baseline.id,
            baseline_mean: baseline.mean,
            percent_of_baseline: baseline.percent_of_mean(today.value),
            deviation: today.value - baseline.mean,
            z_score: baseline.z_score(today.value),
            status,
            trend,
            trend_slope_pct,
            consecutive_days,
            movement,
            days_beyond_yellow,
            action: status.action(),
            warnings,
        };

        debug!(
            %metric,
            value = assessment.value,
            percent = assessment.percent_of_baseline,
            status = assessment.status_label(),
            "daily reading assessed"
        );

        Ok(assessment)
    }

    fn point_status(&self, baseline: &Baseline, value: f64) -> DeviationStatus {
        if baseline.metric == MetricKind::Hrv
            && value > baseline.mean + self.config.abnormal_elevation_sd * baseline.std_dev
        {
            return DeviationStatus::AbnormallyElevated;
        }

        let bands = &baseline.bands;
        if baseline.is_beyond(value, bands.red) {
            DeviationStatus::Severe
        } else if baseline.is_beyond(value, bands.yellow) {
            DeviationStatus::Significant
        } else if baseline.is_beyond(value, bands.normal) {
            DeviationStatus::Slight
        } else {
            DeviationStatus::Normal
        }
    }

    fn trend(&self, baseline: &Baseline, window: &[Option<f64>]) -> (TrendDirection, f64) {
        let cfg = &self.config;
        let points: Vec<(f64, f64)> = window
            .iter()
            .enumerate()
            .filter_map(|(day, v)| v.map(|v| (day as f64, v)))
            .collect();
        if points.len() < cfg.min_trend_points {
            return (TrendDirection::Stable, 0.0);
        }
        let Some(slope) = regression_slope(&points) else {
            return (TrendDirection::Stable, 0.0);
        };

        let mut slope_pct = slope / baseline.mean * 100.0;
        if baseline.metric == MetricKind::RestingHr {
            slope_pct = -slope_pct;
        }

        let direction = if slope_pct >= cfg.trend_improving_pct {
            TrendDirection::Improving
        } else if slope_pct > cfg.trend_mild_decline_pct {
            TrendDirection::Stable
        } else if slope_pct > cfg.trend_significant_decline_pct {
            TrendDirection::DecliningMild
        } else {
            TrendDirection::DecliningSignificant
        };
        (direction, slope_pct)
    }
}

fn validate_value(metric: MetricKind, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            field: metric.to_string(),
        }
        .into());
    }
    if value <= 0.0 {
        return Err(ValidationError::Invalid {
            reason: format!("{} must be positive, got {}", metric, value),
        }
        .into());
    }
    Ok(())
}

/// Least-squares slope of `values` against their index
pub fn linear_slope(values: &[f64]) -> Option<f64> {
    let points: Vec<(f64, f64)> = values.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect();
    regression_slope(&points)
}

/// Least-squares slope through `(x, y)` points
pub fn regression_slope(points: &[(f64, f64)]) -> Option<f64> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let x_mean = points.iter().map(|(x, _)| x).sum::<f64>() / n as f64;
    let y_mean = points.iter().map(|(_, y)| y).sum::<f64>() / n as f64;

    let (num, den) = points.iter().fold((0.0, 0.0), |(num, den), (x, y)| {
        let dx = x - x_mean;
        (num + dx * (y - y_mean), den + dx * dx)
    });
    if den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}

/// Longest run of consecutive days whose reading satisfies `pred`
///
/// A day without a reading ends the run.
fn longest_run(days: &[Option<f64>], pred: impl Fn(f64) -> bool) -> usize {
    days.iter()
        .fold((0, 0), |(longest, current), day| match day {
            Some(v) if pred(*v) => (longest.max(current + 1), current + 1),
            _ => (longest, 0),
        })
        .0
}

/// Direction of the latest day-over-day move and how many days it has held
fn consecutive_movement(window: &[Option<f64>]) -> (Movement, usize) {
    const EPSILON: f64 = 1e-9;
    let direction = |a: f64, b: f64| {
        let diff = b - a;
        if diff > EPSILON {
            Movement::Rising
        } else if diff < -EPSILON {
            Movement::Falling
        } else {
            Movement::Flat
        }
    };

    // newest first, stopping at the first gap
    let moves: Vec<Movement> = window
        .windows(2)
        .rev()
        .map_while(|pair| match (pair[0], pair[1]) {
            (Some(a), Some(b)) => Some(direction(a, b)),
            _ => None,
        })
        .collect();
    let Some(last) = moves.first().copied() else {
        return (Movement::Flat, 0);
    };
    let count = moves.iter().take_while(|m| **m == last).count();
    (last, count)
}
