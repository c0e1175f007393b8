//! End-to-end readiness computation for one athlete and day
//!
//! Wires the components together in data-flow order: samples → baselines →
//! daily assessment → composite → modification, with trend analysis over
//! the resulting history.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::assessment::{DailyAssessment, DailyMetricAssessor};
use crate::baseline::{Baseline, BaselineEstimator, BaselineRegistry};
use crate::composite::{CompositeReadiness, ReadinessAggregator, ReadinessInputs};
use crate::config::ReadinessConfig;
use crate::error::{ReadinessError, Result, ValidationError};
use crate::modification::{ModificationEngine, WorkoutModification};
use crate::models::{DailySample, Methodology, MetricKind, PlannedWorkout, SampleLog};
use crate::trends::{HistoryEntry, TrendAnalyzer, TrendWarningReport};
use crate::wellness::{WellnessScore, WellnessScorer};

/// Everything computed for one athlete on one morning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReadiness {
    pub athlete_id: String,
    pub date: NaiveDate,
    pub hrv: DailyAssessment,
    pub resting_hr: DailyAssessment,
    pub wellness: WellnessScore,
    pub composite: CompositeReadiness,
}

/// A day the history replay could not assess
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDay {
    pub date: NaiveDate,
    pub reason: String,
}

/// Readiness history rebuilt over a date range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryReplay {
    pub entries: Vec<HistoryEntry>,
    pub skipped: Vec<SkippedDay>,
}

#[derive(Debug, Clone)]
pub struct ReadinessPipeline {
    estimator: BaselineEstimator,
    assessor: DailyMetricAssessor,
    scorer: WellnessScorer,
    aggregator: ReadinessAggregator,
    modifier: ModificationEngine,
    analyzer: TrendAnalyzer,
    recompute_interval_days: i64,
    history_days: usize,
}

impl Default for ReadinessPipeline {
    fn default() -> Self {
        Self::new(&ReadinessConfig::default())
    }
}

impl ReadinessPipeline {
    pub fn new(config: &ReadinessConfig) -> Self {
        ReadinessPipeline {
            estimator: BaselineEstimator::with_config(config.baseline.clone()),
            assessor: DailyMetricAssessor::with_config(config.assessment.clone()),
            scorer: WellnessScorer::with_config(config.wellness.clone()),
            aggregator: ReadinessAggregator::with_config(config.composite.clone()),
            modifier: ModificationEngine::with_config(config.modification.clone()),
            analyzer: TrendAnalyzer::with_config(config.trends.clone()),
            recompute_interval_days: config.baseline.recompute_interval_days,
            history_days: config.assessment.max_history_days,
        }
    }

    pub fn estimator(&self) -> &BaselineEstimator {
        &self.estimator
    }

    /// Compute both metric baselines from the samples up to and including `date`
    pub fn compute_baselines(
        &self,
        log: &SampleLog,
        athlete_id: &str,
        date: NaiveDate,
        computed_at: DateTime<Utc>,
    ) -> Result<Vec<Baseline>> {
        let samples = samples_through(log, athlete_id, date, self.estimator.config().window_days);
        [MetricKind::Hrv, MetricKind::RestingHr]
            .into_iter()
            .map(|metric| self.estimator.estimate_at(athlete_id, metric, &samples, computed_at))
            .collect()
    }

    /// Record fresh baselines for metrics whose snapshot is missing or stale
    ///
    /// Returns the newly recorded snapshots.
    pub fn refresh_baselines(
        &self,
        registry: &mut BaselineRegistry,
        log: &SampleLog,
        athlete_id: &str,
        computed_at: DateTime<Utc>,
    ) -> Result<Vec<Baseline>> {
        let today = computed_at.date_naive();
        let samples = samples_through(log, athlete_id, today, self.estimator.config().window_days);
        let mut recorded = Vec::new();

        for metric in [MetricKind::Hrv, MetricKind::RestingHr] {
            if !registry.needs_recompute(athlete_id, metric, today, self.recompute_interval_days) {
                continue;
            }
            let baseline = self.estimator.estimate_at(athlete_id, metric, &samples, computed_at)?;
            recorded.push(registry.record(baseline).clone());
        }
        Ok(recorded)
    }

    /// Assess one day against the baselines current on that day
    #[instrument(skip_all, fields(athlete = athlete_id, %date))]
    pub fn assess_day(
        &self,
        log: &SampleLog,
        registry: &BaselineRegistry,
        athlete_id: &str,
        date: NaiveDate,
        workload_ratio: f64,
    ) -> Result<DailyReadiness> {
        let sample = log.get(athlete_id, date).ok_or_else(|| ValidationError::Missing {
            field: format!("sample for {} on {}", athlete_id, date),
        })?;
        let hrv = self.assess_metric(log, registry, sample, MetricKind::Hrv)?;
        let resting_hr = self.assess_metric(log, registry, sample, MetricKind::RestingHr)?;

        let response = sample.wellness.as_ref().ok_or_else(|| ValidationError::Missing {
            field: "wellness".to_string(),
        })?;
        let wellness = self.scorer.score(response)?;
        let sleep_hours = sample.sleep_hours.ok_or_else(|| ValidationError::Missing {
            field: "sleep_hours".to_string(),
        })?;

        let composite = self.aggregator.aggregate(&ReadinessInputs {
            hrv: &hrv,
            resting_hr: &resting_hr,
            wellness: &wellness,
            workload_ratio,
            sleep_hours,
        })?;
        info!(score = composite.score, tier = %composite.tier, "daily readiness assessed");

        Ok(DailyReadiness {
            athlete_id: athlete_id.to_string(),
            date,
            hrv,
            resting_hr,
            wellness,
            composite,
        })
    }

    fn assess_metric(
        &self,
        log: &SampleLog,
        registry: &BaselineRegistry,
        sample: &DailySample,
        metric: MetricKind,
    ) -> Result<DailyAssessment> {
        let baseline = match registry.as_of(&sample.athlete_id, metric, sample.date) {
            Some(baseline) => baseline,
            None => {
                let window = self.estimator.config().window_days;
                let available = log
                    .window_before(&sample.athlete_id, sample.date, window)
                    .iter()
                    .filter(|s| s.metric(metric).is_some())
                    .count();
                return Err(ReadinessError::insufficient_data(
                    format!("{} baseline", metric),
                    available,
                    self.estimator.config().min_valid_days,
                ));
            }
        };

        let today = sample.measurement(metric).ok_or_else(|| ValidationError::Missing {
            field: metric.to_string(),
        })?;
        // one slot per calendar day, None where no reading was taken
        let history: Vec<Option<f64>> = (1..=self.history_days as i64)
            .rev()
            .map(|back| {
                log.get(&sample.athlete_id, sample.date - Duration::days(back))
                    .and_then(|s| s.metric(metric))
            })
            .collect();
        self.assessor.assess_days(today, baseline, &history)
    }

    /// Decide every workout planned for the assessed day
    pub fn plan_day(
        &self,
        readiness: &DailyReadiness,
        workouts: &[PlannedWorkout],
        methodology: Methodology,
    ) -> Result<Vec<WorkoutModification>> {
        workouts
            .iter()
            .filter(|w| w.date == readiness.date)
            .map(|w| self.modifier.decide(&readiness.composite, w, methodology))
            .collect()
    }

    /// History entry for the day, using the first session's decision
    pub fn history_entry(&self, readiness: &DailyReadiness, modifications: &[WorkoutModification]) -> HistoryEntry {
        HistoryEntry::from_results(
            readiness.date,
            &readiness.composite,
            modifications.first(),
            Some(&readiness.wellness),
        )
    }

    /// Rebuild history for every day in `from..=to`
    ///
    /// Each day is assessed against baselines computed from the days before
    /// it, and its planned workouts are decided so the entry carries the
    /// modification level. Days that cannot be assessed are reported in
    /// `skipped`.
    #[allow(clippy::too_many_arguments)]
    pub fn replay_history(
        &self,
        log: &SampleLog,
        athlete_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        workouts: &[PlannedWorkout],
        methodology: Methodology,
        workload_ratio: f64,
    ) -> HistoryReplay {
        let mut registry = BaselineRegistry::new();
        let mut replay = HistoryReplay::default();

        let mut date = from;
        while date <= to {
            let computed_at = (date - Duration::days(1)).and_time(NaiveTime::MIN).and_utc();
            let day = self
                .refresh_baselines(&mut registry, log, athlete_id, computed_at)
                .and_then(|_| self.assess_day(log, &registry, athlete_id, date, workload_ratio))
                .and_then(|readiness| {
                    let decisions = self.plan_day(&readiness, workouts, methodology)?;
                    Ok(self.history_entry(&readiness, &decisions))
                });

            match day {
                Ok(entry) => replay.entries.push(entry),
                Err(err) => {
                    debug!(%date, error = %err, "day skipped in history replay");
                    replay.skipped.push(SkippedDay {
                        date,
                        reason: err.user_message(),
                    });
                }
            }
            date += Duration::days(1);
        }

        info!(days = replay.entries.len(), skipped = replay.skipped.len(), "history replayed");
        replay
    }

    pub fn analyze_trends(&self, history: &[HistoryEntry]) -> Result<TrendWarningReport> {
        self.analyzer.analyze(history)
    }
}

fn samples_through(log: &SampleLog, athlete_id: &str, date: NaiveDate, limit: usize) -> Vec<DailySample> {
    let mut samples: Vec<DailySample> = log
        .window_before(athlete_id, date, limit)
        .into_iter()
        .cloned()
        .collect();
    if let Some(today) = log.get(athlete_id, date) {
        samples.push(today.clone());
        if samples.len() > limit {
            samples.remove(0);
        }
    }
    samples
}
