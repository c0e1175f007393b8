//! Trend and warning analysis over multi-week readiness history
//!
//! Detects patterns a single day's assessment cannot see: sustained HRV
//! suppression, the overtraining paradox, chronic resting HR elevation,
//! performance decline despite good readiness, excessive modification and
//! recurring pain.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::composite::CompositeReadiness;
use crate::error::{ReadinessError, Result, ValidationError};
use crate::modification::{ModificationLevel, WorkoutModification};
use crate::wellness::{QuestionId, WellnessScore};

/// One day of derived readiness history
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub hrv_percent_of_baseline: Option<f64>,
    pub rhr_deviation_bpm: Option<f64>,
    pub composite_score: Option<f64>,
    /// Decision for the day's session, None on days without a session
    pub modification_level: Option<ModificationLevel>,
    /// Injury/pain answer, 10 = no pain
    pub pain_score: Option<f64>,
    /// Benchmark session performance, higher is better
    pub benchmark_performance: Option<f64>,
}

impl HistoryEntry {
    pub fn new(date: NaiveDate) -> Self {
        HistoryEntry {
            date,
            ..Default::default()
        }
    }

    /// Build an entry from one day's computed results
    pub fn from_results(
        date: NaiveDate,
        readiness: &CompositeReadiness,
        modification: Option<&WorkoutModification>,
        wellness: Option<&WellnessScore>,
    ) -> Self {
        HistoryEntry {
            date,
            hrv_percent_of_baseline: Some(readiness.hrv_percent_of_baseline),
            rhr_deviation_bpm: Some(readiness.rhr_deviation_bpm),
            composite_score: Some(readiness.score),
            modification_level: modification.map(|m| m.level),
            pain_score: wellness.and_then(|w| w.item_scores.get(&QuestionId::InjuryPain).copied()),
            benchmark_performance: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub min_history_days: usize,
    pub max_history_days: usize,

    pub suppression_percent: f64,
    pub suppression_days: usize,
    pub suppression_critical_days: usize,

    pub paradox_hrv_percent: f64,
    pub paradox_sessions: usize,

    pub rhr_elevation_bpm: f64,
    pub rhr_elevation_days: usize,
    pub rhr_window_days: usize,

    /// Percent drop between benchmark sessions counted as a decline
    pub decline_percent: f64,
    pub decline_sessions: usize,
    pub decline_min_composite: f64,

    pub modification_window_days: i64,
    pub modification_min_days: usize,
    pub modification_rate_medium: f64,
    pub modification_rate_high: f64,

    pub pain_flag_below: f64,
    pub pain_report_count: usize,
    pub pain_stop_below: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            min_history_days: 14,
            max_history_days: 30,
            suppression_percent: 85.0,
            suppression_days: 7,
            suppression_critical_days: 14,
            paradox_hrv_percent: 130.0,
            paradox_sessions: 3,
            rhr_elevation_bpm: 5.0,
            rhr_elevation_days: 5,
            rhr_window_days: 7,
            decline_percent: 3.0,
            decline_sessions: 3,
            decline_min_composite: 7.5,
            modification_window_days: 28,
            modification_min_days: 21,
            modification_rate_medium: 0.40,
            modification_rate_high: 0.50,
            pain_flag_below: 7.0,
            pain_report_count: 3,
            pain_stop_below: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendWarningKind {
    SustainedSuppression,
    OvertrainingParadox,
    ChronicRhrElevation,
    PerformanceDeclineDespiteReadiness,
    ExcessiveModification,
    RecurringPain,
}

impl TrendWarningKind {
    pub fn title(&self) -> &'static str {
        match self {
            TrendWarningKind::SustainedSuppression => "Sustained HRV suppression",
            TrendWarningKind::OvertrainingParadox => "Possible overtraining paradox",
            TrendWarningKind::ChronicRhrElevation => "Chronic resting HR elevation",
            TrendWarningKind::PerformanceDeclineDespiteReadiness => "Performance declining despite good readiness",
            TrendWarningKind::ExcessiveModification => "Excessive workout modification",
            TrendWarningKind::RecurringPain => "Recurring pain reports",
        }
    }

    pub fn recommended_action(&self) -> &'static str {
        match self {
            TrendWarningKind::SustainedSuppression => {
                "Schedule a recovery week and review sleep, nutrition and life stress"
            }
            TrendWarningKind::OvertrainingParadox => {
                "Reduce training load immediately and consult a coach or physician"
            }
            TrendWarningKind::ChronicRhrElevation => "Check for illness and reduce intensity until resting HR normalises",
            TrendWarningKind::PerformanceDeclineDespiteReadiness => {
                "Review the training design: stimulus, specificity and session order"
            }
            TrendWarningKind::ExcessiveModification => "Adjust the plan's load to match current capacity",
            TrendWarningKind::RecurringPain => "Stop running through pain and get the injury assessed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendWarning {
    pub kind: TrendWarningKind,
    pub severity: Severity,
    pub title: String,
    pub recommended_action: String,
    /// Supporting numbers, keyed by name
    pub statistics: BTreeMap<String, f64>,
}

impl TrendWarning {
    fn new(kind: TrendWarningKind, severity: Severity, statistics: &[(&str, f64)]) -> Self {
        TrendWarning {
            kind,
            severity,
            title: kind.title().to_string(),
            recommended_action: kind.recommended_action().to_string(),
            statistics: statistics.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendWarningReport {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub days_analyzed: usize,
    pub warnings: Vec<TrendWarning>,
    pub highest_severity: Option<Severity>,
}

impl TrendWarningReport {
    pub fn requires_urgent_attention(&self) -> bool {
        self.highest_severity.map_or(false, |s| s >= Severity::High)
    }

    pub fn has(&self, kind: TrendWarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TrendConfig) -> Self {
        TrendAnalyzer { config }
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Analyze history, oldest first or in any order
    pub fn analyze(&self, history: &[HistoryEntry]) -> Result<TrendWarningReport> {
        let cfg = &self.config;
        let mut entries: Vec<&HistoryEntry> = history.iter().collect();
        entries.sort_by_key(|e| e.date);
        validate_history(&entries)?;

        if entries.len() < cfg.min_history_days {
            return Err(ReadinessError::insufficient_data(
                "trend analysis",
                entries.len(),
                cfg.min_history_days,
            ));
        }
        if entries.len() > cfg.max_history_days {
            entries.drain(..entries.len() - cfg.max_history_days);
        }

        let detectors = [
            self.sustained_suppression(&entries),
            self.overtraining_paradox(&entries),
            self.chronic_rhr_elevation(&entries),
            self.performance_decline(&entries),
            self.excessive_modification(&entries),
            self.recurring_pain(&entries),
        ];
        let warnings: Vec<TrendWarning> = detectors.into_iter().flatten().collect();

        for w in &warnings {
            warn!(kind = ?w.kind, severity = %w.severity, "trend warning raised");
        }
        let highest_severity = warnings.iter().map(|w| w.severity).max();

        let (Some(first), Some(last)) = (entries.first(), entries.last()) else {
            return Err(ReadinessError::insufficient_data("trend analysis", 0, cfg.min_history_days.max(1)));
        };
        let (window_start, window_end) = (first.date, last.date);
        debug!(days = entries.len(), warnings = warnings.len(), "trend analysis complete");

        Ok(TrendWarningReport {
            window_start,
            window_end,
            days_analyzed: entries.len(),
            warnings,
            highest_severity,
        })
    }

    fn sustained_suppression(&self, entries: &[&HistoryEntry]) -> Option<TrendWarning> {
        let cfg = &self.config;
        let suppressed = trailing_days(entries, |e| e.hrv_percent_of_baseline, |v| v < cfg.suppression_percent);
        let days = suppressed.len();
        if days < cfg.suppression_days {
            return None;
        }

        let severity = if days >= cfg.suppression_critical_days {
            Severity::Critical
        } else {
            Severity::High
        };
        Some(TrendWarning::new(
            TrendWarningKind::SustainedSuppression,
            severity,
            &[
                ("consecutive_days", days as f64),
                ("mean_hrv_percent", suppressed.iter().mean()),
            ],
        ))
    }

    fn overtraining_paradox(&self, entries: &[&HistoryEntry]) -> Option<TrendWarning> {
        let cfg = &self.config;
        let latest_hrv = entries.iter().rev().find_map(|e| e.hrv_percent_of_baseline)?;
        if latest_hrv <= cfg.paradox_hrv_percent {
            return None;
        }

        let benchmarks = series(entries, |e| e.benchmark_performance);
        if benchmarks.len() < cfg.paradox_sessions || cfg.paradox_sessions < 2 {
            return None;
        }
        let recent = &benchmarks[benchmarks.len() - cfg.paradox_sessions..];
        let declining = recent.windows(2).all(|pair| pair[1] < pair[0]);

        declining.then(|| {
            TrendWarning::new(
                TrendWarningKind::OvertrainingParadox,
                Severity::High,
                &[
                    ("hrv_percent", latest_hrv),
                    ("declining_sessions", cfg.paradox_sessions as f64),
                ],
            )
        })
    }

    fn chronic_rhr_elevation(&self, entries: &[&HistoryEntry]) -> Option<TrendWarning> {
        let cfg = &self.config;
        let last = entries.last()?.date;
        let cutoff = last - Duration::days(cfg.rhr_window_days as i64);
        let recent: Vec<f64> = entries
            .iter()
            .filter(|e| e.date > cutoff)
            .filter_map(|e| e.rhr_deviation_bpm)
            .collect();
        if recent.is_empty() {
            return None;
        }
        let elevated = recent.iter().filter(|d| **d > cfg.rhr_elevation_bpm).count();

        (elevated >= cfg.rhr_elevation_days).then(|| {
            TrendWarning::new(
                TrendWarningKind::ChronicRhrElevation,
                Severity::High,
                &[
                    ("elevated_days", elevated as f64),
                    ("window_days", cfg.rhr_window_days as f64),
                    ("measured_days", recent.len() as f64),
                    ("mean_deviation_bpm", recent.iter().mean()),
                ],
            )
        })
    }

    fn performance_decline(&self, entries: &[&HistoryEntry]) -> Option<TrendWarning> {
        let cfg = &self.config;
        let benchmarks = series(entries, |e| e.benchmark_performance);
        let changes: Vec<f64> = benchmarks
            .windows(2)
            .map(|pair| (pair[1] - pair[0]) / pair[0] * 100.0)
            .collect();
        let declines = trailing_count(&changes, |c| c < -cfg.decline_percent);
        if declines < cfg.decline_sessions {
            return None;
        }

        let composites = series(entries, |e| e.composite_score);
        if composites.is_empty() {
            return None;
        }
        let mean_composite = composites.iter().mean();
        if mean_composite <= cfg.decline_min_composite {
            return None;
        }

        let total_change = changes[changes.len() - declines..]
            .iter()
            .fold(1.0, |acc, c| acc * (1.0 + c / 100.0));
        Some(TrendWarning::new(
            TrendWarningKind::PerformanceDeclineDespiteReadiness,
            Severity::Medium,
            &[
                ("consecutive_declines", declines as f64),
                ("total_decline_percent", (1.0 - total_change) * 100.0),
                ("mean_composite", mean_composite),
            ],
        ))
    }

    fn excessive_modification(&self, entries: &[&HistoryEntry]) -> Option<TrendWarning> {
        let cfg = &self.config;
        let last = entries.last()?.date;
        let cutoff = last - Duration::days(cfg.modification_window_days);
        let window: Vec<&&HistoryEntry> = entries.iter().filter(|e| e.date > cutoff).collect();
        if window.len() < cfg.modification_min_days {
            return None;
        }

        let sessions: Vec<ModificationLevel> = window.iter().filter_map(|e| e.modification_level).collect();
        if sessions.is_empty() {
            return None;
        }
        let modified = sessions.iter().filter(|l| l.is_modified()).count();
        let rate = modified as f64 / sessions.len() as f64;

        let severity = if rate > cfg.modification_rate_high {
            Severity::High
        } else if rate > cfg.modification_rate_medium {
            Severity::Medium
        } else {
            return None;
        };
        Some(TrendWarning::new(
            TrendWarningKind::ExcessiveModification,
            severity,
            &[
                ("modified_sessions", modified as f64),
                ("total_sessions", sessions.len() as f64),
                ("modification_rate", rate),
            ],
        ))
    }

    fn recurring_pain(&self, entries: &[&HistoryEntry]) -> Option<TrendWarning> {
        let cfg = &self.config;
        let reports: Vec<f64> = series(entries, |e| e.pain_score)
            .into_iter()
            .filter(|p| *p < cfg.pain_flag_below)
            .collect();
        if reports.len() < cfg.pain_report_count {
            return None;
        }

        let worst = reports.iter().copied().fold(f64::INFINITY, f64::min);
        let severity = if worst < cfg.pain_stop_below {
            Severity::Critical
        } else {
            Severity::High
        };
        Some(TrendWarning::new(
            TrendWarningKind::RecurringPain,
            severity,
            &[("reports", reports.len() as f64), ("worst_score", worst)],
        ))
    }
}

/// Values of the run of consecutive calendar days, ending at the latest
/// entry, whose field satisfies `pred`
///
/// A missing day or a day without the field ends the run.
fn trailing_days(
    entries: &[&HistoryEntry],
    field: impl Fn(&HistoryEntry) -> Option<f64>,
    pred: impl Fn(f64) -> bool,
) -> Vec<f64> {
    let mut run = Vec::new();
    let mut expected: Option<NaiveDate> = None;
    for entry in entries.iter().rev() {
        if expected.map_or(false, |date| entry.date != date) {
            break;
        }
        match field(entry) {
            Some(v) if pred(v) => run.push(v),
            _ => break,
        }
        expected = entry.date.pred_opt();
    }
    run.reverse();
    run
}

/// Number of trailing elements satisfying `pred`
fn trailing_count(values: &[f64], pred: impl Fn(f64) -> bool) -> usize {
    values.iter().rev().take_while(|v| pred(**v)).count()
}

fn series(entries: &[&HistoryEntry], field: impl Fn(&HistoryEntry) -> Option<f64>) -> Vec<f64> {
    entries.iter().filter_map(|e| field(*e)).collect()
}

fn validate_history(entries: &[&HistoryEntry]) -> Result<()> {
    for pair in entries.windows(2) {
        if pair[0].date == pair[1].date {
            return Err(ValidationError::Invalid {
                reason: format!("duplicate history entry for {}", pair[0].date),
            }
            .into());
        }
    }

    for entry in entries {
        let fields = [
            ("hrv_percent_of_baseline", entry.hrv_percent_of_baseline),
            ("rhr_deviation_bpm", entry.rhr_deviation_bpm),
            ("composite_score", entry.composite_score),
            ("pain_score", entry.pain_score),
            ("benchmark_performance", entry.benchmark_performance),
        ];
        for (field, value) in fields {
            if value.map_or(false, |v| !v.is_finite()) {
                return Err(ValidationError::NonFinite {
                    field: field.to_string(),
                }
                .into());
            }
        }
        if entry.benchmark_performance.map_or(false, |v| v <= 0.0) {
            return Err(ValidationError::Invalid {
                reason: format!("benchmark performance on {} must be positive", entry.date),
            }
            .into());
        }
    }
    Ok(())
}
