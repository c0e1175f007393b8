use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, ValidationError};
use crate::wellness::WellnessResponse;

/// Physiological metrics tracked against a personal baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Heart rate variability, RMSSD in milliseconds
    Hrv,
    /// Resting heart rate upon waking, beats per minute
    RestingHr,
}

impl MetricKind {
    /// Physiologically plausible range for a single reading
    pub fn plausible_range(&self) -> (f64, f64) {
        match self {
            MetricKind::Hrv => (10.0, 200.0),
            MetricKind::RestingHr => (35.0, 100.0),
        }
    }

    pub fn is_plausible(&self, value: f64) -> bool {
        let (min, max) = self.plausible_range();
        value.is_finite() && value >= min && value <= max
    }

    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::Hrv => "ms",
            MetricKind::RestingHr => "bpm",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Hrv => write!(f, "HRV"),
            MetricKind::RestingHr => write!(f, "resting HR"),
        }
    }
}

/// Device or athlete supplied quality flag for a morning reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleQuality {
    #[default]
    Good,
    Fair,
    Poor,
}

/// A single raw reading with optional measurement metadata
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,

    /// Share of beats rejected as artifacts during the recording
    #[serde(default)]
    pub artifact_percent: Option<f64>,

    /// Length of the recording in seconds
    #[serde(default)]
    pub duration_seconds: Option<u32>,
}

impl Measurement {
    pub fn new(value: f64) -> Self {
        Measurement {
            value,
            artifact_percent: None,
            duration_seconds: None,
        }
    }
}

impl From<f64> for Measurement {
    fn from(value: f64) -> Self {
        Measurement::new(value)
    }
}

/// One calendar day of raw inputs for one athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySample {
    pub athlete_id: String,

    pub date: NaiveDate,

    /// HRV RMSSD in milliseconds
    #[serde(default)]
    pub hrv_rmssd: Option<f64>,

    /// Resting heart rate in beats per minute
    #[serde(default)]
    pub resting_hr: Option<f64>,

    #[serde(default)]
    pub sleep_hours: Option<f64>,

    #[serde(default)]
    pub wellness: Option<WellnessResponse>,

    #[serde(default)]
    pub quality: SampleQuality,

    /// Artifact percentage of the HRV recording
    #[serde(default)]
    pub hrv_artifact_percent: Option<f64>,

    /// Duration of the HRV recording in seconds
    #[serde(default)]
    pub hrv_duration_seconds: Option<u32>,
}

impl DailySample {
    pub fn new(athlete_id: impl Into<String>, date: NaiveDate) -> Self {
        DailySample {
            athlete_id: athlete_id.into(),
            date,
            hrv_rmssd: None,
            resting_hr: None,
            sleep_hours: None,
            wellness: None,
            quality: SampleQuality::Good,
            hrv_artifact_percent: None,
            hrv_duration_seconds: None,
        }
    }

    /// Raw value of a metric for this day, if recorded
    pub fn metric(&self, metric: MetricKind) -> Option<f64> {
        match metric {
            MetricKind::Hrv => self.hrv_rmssd,
            MetricKind::RestingHr => self.resting_hr,
        }
    }

    /// Reading of a metric including measurement metadata
    pub fn measurement(&self, metric: MetricKind) -> Option<Measurement> {
        self.metric(metric).map(|value| match metric {
            MetricKind::Hrv => Measurement {
                value,
                artifact_percent: self.hrv_artifact_percent,
                duration_seconds: self.hrv_duration_seconds,
            },
            MetricKind::RestingHr => Measurement::new(value),
        })
    }
}

/// Append-only record of daily samples, at most one per athlete per day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleLog {
    samples: BTreeMap<String, BTreeMap<NaiveDate, DailySample>>,
}

impl SampleLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample. A second sample for the same athlete and day is rejected.
    pub fn append(&mut self, sample: DailySample) -> Result<()> {
        let days = self.samples.entry(sample.athlete_id.clone()).or_default();
        if days.contains_key(&sample.date) {
            return Err(ValidationError::Invalid {
                reason: format!(
                    "sample for athlete {} on {} already recorded",
                    sample.athlete_id, sample.date
                ),
            }
            .into());
        }
        days.insert(sample.date, sample);
        Ok(())
    }

    /// Samples for an athlete in date order
    pub fn samples_for(&self, athlete_id: &str) -> Vec<&DailySample> {
        self.samples
            .get(athlete_id)
            .map(|days| days.values().collect())
            .unwrap_or_default()
    }

    /// Samples for an athlete strictly before `date`, newest `limit` entries in date order
    pub fn window_before(&self, athlete_id: &str, date: NaiveDate, limit: usize) -> Vec<&DailySample> {
        let Some(days) = self.samples.get(athlete_id) else {
            return Vec::new();
        };
        let mut recent: Vec<&DailySample> = days.range(..date).rev().take(limit).map(|(_, s)| s).collect();
        recent.reverse();
        recent
    }

    pub fn get(&self, athlete_id: &str, date: NaiveDate) -> Option<&DailySample> {
        self.samples.get(athlete_id).and_then(|days| days.get(&date))
    }

    pub fn athletes(&self) -> impl Iterator<Item = &String> {
        self.samples.keys()
    }

    pub fn len(&self) -> usize {
        self.samples.values().map(|days| days.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Workout types distinguished by the modification rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    Easy,
    Recovery,
    LongRun,
    Tempo,
    Threshold,
    Vo2Max,
    Race,
}

impl WorkoutType {
    /// Sessions with a deliberate intensity or volume stimulus
    pub fn is_quality(&self) -> bool {
        !self.is_easy()
    }

    pub fn is_easy(&self) -> bool {
        matches!(self, WorkoutType::Easy | WorkoutType::Recovery)
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkoutType::Easy => "easy run",
            WorkoutType::Recovery => "recovery run",
            WorkoutType::LongRun => "long run",
            WorkoutType::Tempo => "tempo",
            WorkoutType::Threshold => "threshold",
            WorkoutType::Vo2Max => "VO2max intervals",
            WorkoutType::Race => "race",
        };
        write!(f, "{}", name)
    }
}

/// How much a session matters to the training block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutImportance {
    Low,
    #[default]
    Normal,
    Key,
    Race,
}

/// Interval structure of a quality session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalStructure {
    pub repetitions: u32,

    /// Work duration per repetition in minutes
    pub work_minutes: Decimal,

    /// Recovery between repetitions in seconds
    pub recovery_seconds: u32,
}

/// A session scheduled for the day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedWorkout {
    pub id: String,

    pub date: NaiveDate,

    pub workout_type: WorkoutType,

    pub duration_minutes: u32,

    /// Target pace in minutes per kilometre
    #[serde(default)]
    pub target_pace: Option<Decimal>,

    #[serde(default)]
    pub target_hr: Option<u16>,

    #[serde(default)]
    pub intervals: Option<IntervalStructure>,

    #[serde(default)]
    pub importance: WorkoutImportance,

    /// Training block the session belongs to
    #[serde(default)]
    pub phase: Option<TrainingPhase>,

    /// Sessions on the day (2 for a double-threshold day)
    #[serde(default = "default_sessions")]
    pub sessions: u8,

    #[serde(default)]
    pub description: String,
}

fn default_sessions() -> u8 {
    1
}

impl PlannedWorkout {
    pub fn new(id: impl Into<String>, date: NaiveDate, workout_type: WorkoutType, duration_minutes: u32) -> Self {
        PlannedWorkout {
            id: id.into(),
            date,
            workout_type,
            duration_minutes,
            target_pace: None,
            target_hr: None,
            intervals: None,
            importance: WorkoutImportance::Normal,
            phase: None,
            sessions: 1,
            description: String::new(),
        }
    }

    pub fn is_double(&self) -> bool {
        self.sessions > 1
    }
}

/// Training methodology declared for the athlete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Methodology {
    #[default]
    Generic,
    /// Two controlled lactate-threshold sessions on the same day
    NorwegianDoubleThreshold,
    /// Roughly 80/20 easy/hard distribution with few, very hard sessions
    Polarized,
}

impl fmt::Display for Methodology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Methodology::Generic => write!(f, "generic"),
            Methodology::NorwegianDoubleThreshold => write!(f, "Norwegian double threshold"),
            Methodology::Polarized => write!(f, "polarized"),
        }
    }
}

/// Severity of a discrete danger marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagLevel {
    Yellow,
    Red,
}

impl fmt::Display for FlagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagLevel::Yellow => write!(f, "yellow"),
            FlagLevel::Red => write!(f, "red"),
        }
    }
}

/// Periodization phase of the current training block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingPhase {
    #[default]
    Base,
    Build,
    Peak,
    Taper,
    Recovery,
}

impl fmt::Display for TrainingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingPhase::Base => write!(f, "base"),
            TrainingPhase::Build => write!(f, "build"),
            TrainingPhase::Peak => write!(f, "peak"),
            TrainingPhase::Taper => write!(f, "taper"),
            TrainingPhase::Recovery => write!(f, "recovery"),
        }
    }
}
