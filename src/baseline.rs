//! Personal HRV and resting heart rate baselines
//!
//! A baseline summarises 14-21 days of morning readings into a mean, a
//! standard deviation and three alert bands. Baselines are immutable
//! snapshots: recomputation produces a new version that supersedes the old
//! one in a [`BaselineRegistry`], it never edits an existing snapshot.
//!
//! # Threshold bands
//!
//! HRV bands sit below the mean (lower HRV = poorer recovery):
//! - normal: mean − 0.5σ
//! - yellow: mean − 1.0σ
//! - red: mean − 1.5σ
//!
//! Resting HR bands sit above the mean and never closer than a fixed number
//! of beats, because a single bpm of drift is within measurement noise:
//! - normal: mean + max(0.5σ, 2 bpm)
//! - yellow: mean + max(1.0σ, 3 bpm)
//! - red: mean + max(1.5σ, 5 bpm)

use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ReadinessError, Result};
use crate::models::{DailySample, MetricKind, SampleQuality};
use crate::quality::DataQualityWarning;

/// Baseline estimation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Most recent days considered for a baseline
    pub window_days: usize,

    /// Minimum valid readings required
    pub min_valid_days: usize,

    /// Largest share of readings that quality filtering may remove
    pub max_rejected_fraction: f64,

    /// HRV readings with more artifacts than this are discarded
    pub max_artifact_percent: f64,

    /// Coefficient of variation above which an HRV baseline is flagged unstable
    pub hrv_cv_warning_percent: f64,

    /// Coefficient of variation above which an RHR baseline is flagged unstable
    pub rhr_cv_warning_percent: f64,

    /// Standard deviation multiples for the normal, yellow and red bands
    pub normal_band_sd: f64,
    pub yellow_band_sd: f64,
    pub red_band_sd: f64,

    /// Minimum RHR band distances from the mean in bpm
    pub rhr_normal_floor_bpm: f64,
    pub rhr_yellow_floor_bpm: f64,
    pub rhr_red_floor_bpm: f64,

    /// Standard deviation floors so bands never collapse onto the mean
    pub hrv_min_std_dev: f64,
    pub rhr_min_std_dev: f64,

    /// Age in days after which a baseline should be recomputed
    pub recompute_interval_days: i64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        BaselineConfig {
            window_days: 21,
            min_valid_days: 14,
            max_rejected_fraction: 0.5,
            max_artifact_percent: 20.0,
            hrv_cv_warning_percent: 20.0,
            rhr_cv_warning_percent: 10.0,
            normal_band_sd: 0.5,
            yellow_band_sd: 1.0,
            red_band_sd: 1.5,
            rhr_normal_floor_bpm: 2.0,
            rhr_yellow_floor_bpm: 3.0,
            rhr_red_floor_bpm: 5.0,
            hrv_min_std_dev: 1.0,
            rhr_min_std_dev: 0.5,
            recompute_interval_days: 42,
        }
    }
}

/// Alert thresholds derived from a baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBands {
    pub normal: f64,
    pub yellow: f64,
    pub red: f64,
}

impl ThresholdBands {
    /// Yellow lies strictly between normal and red
    pub fn is_ordered(&self) -> bool {
        (self.normal > self.yellow && self.yellow > self.red)
            || (self.normal < self.yellow && self.yellow < self.red)
    }
}

/// Immutable baseline snapshot for one athlete and one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub id: Uuid,
    pub athlete_id: String,
    pub metric: MetricKind,

    /// Position in the athlete's baseline history, assigned by the registry
    pub version: u32,

    pub computed_at: DateTime<Utc>,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,

    /// Readings that passed quality filtering
    pub sample_count: usize,
    pub rejected_count: usize,

    pub mean: f64,

    /// Standard deviation used for the bands (after flooring)
    pub std_dev: f64,

    /// Coefficient of variation in percent, from the unfloored deviation
    pub cv_percent: f64,

    pub bands: ThresholdBands,

    pub warnings: Vec<DataQualityWarning>,
}

impl Baseline {
    /// Value as a percentage of the baseline mean
    pub fn percent_of_mean(&self, value: f64) -> f64 {
        value / self.mean * 100.0
    }

    pub fn z_score(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }

    /// Whether `value` lies on the unhealthy side of `threshold` for this metric
    pub fn is_beyond(&self, value: f64, threshold: f64) -> bool {
        match self.metric {
            MetricKind::Hrv => value < threshold,
            MetricKind::RestingHr => value > threshold,
        }
    }

    pub fn is_beyond_yellow(&self, value: f64) -> bool {
        self.is_beyond(value, self.bands.yellow)
    }

    /// Days since the baseline was computed
    pub fn age_days(&self, today: NaiveDate) -> i64 {
        (today - self.computed_at.date_naive()).num_days()
    }
}

/// Computes baselines from daily samples
#[derive(Debug, Clone, Default)]
pub struct BaselineEstimator {
    config: BaselineConfig,
}

impl BaselineEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BaselineConfig) -> Self {
        BaselineEstimator { config }
    }

    pub fn config(&self) -> &BaselineConfig {
        &self.config
    }

    /// Compute a baseline stamped with the current time
    pub fn estimate(&self, athlete_id: &str, metric: MetricKind, samples: &[DailySample]) -> Result<Baseline> {
        self.estimate_at(athlete_id, metric, samples, Utc::now())
    }

    /// Compute a baseline from the athlete's most recent samples
    pub fn estimate_at(
        &self,
        athlete_id: &str,
        metric: MetricKind,
        samples: &[DailySample],
        computed_at: DateTime<Utc>,
    ) -> Result<Baseline> {
        let cfg = &self.config;

        let mut candidates: Vec<&DailySample> = samples
            .iter()
            .filter(|s| s.athlete_id == athlete_id && s.metric(metric).is_some())
            .collect();
        candidates.sort_by_key(|s| s.date);
        let skip = candidates.len().saturating_sub(cfg.window_days);
        let window = &candidates[skip..];

        if window.len() < cfg.min_valid_days {
            debug!(
                athlete_id,
                %metric,
                days = window.len(),
                "not enough readings for a baseline"
            );
            return Err(ReadinessError::insufficient_data(
                format!("{} baseline", metric),
                window.len(),
                cfg.min_valid_days,
            ));
        }

        let valid: Vec<&DailySample> = window.iter().copied().filter(|s| self.is_usable(s, metric)).collect();
        let rejected = window.len() - valid.len();
        let rejected_fraction = rejected as f64 / window.len() as f64;

        if valid.len() < cfg.min_valid_days || rejected_fraction > cfg.max_rejected_fraction {
            warn!(
                athlete_id,
                %metric,
                valid = valid.len(),
                rejected,
                "baseline rejected by quality filtering"
            );
            return Err(ReadinessError::InsufficientQuality {
                metric,
                valid_days: valid.len(),
                rejected_days: rejected,
                required_days: cfg.min_valid_days,
            });
        }

        let values: Vec<f64> = valid.iter().filter_map(|s| s.metric(metric)).collect();
        let mean = values.iter().mean();
        let raw_std_dev = values.iter().std_dev();
        let floor = match metric {
            MetricKind::Hrv => cfg.hrv_min_std_dev,
            MetricKind::RestingHr => cfg.rhr_min_std_dev,
        };
        let std_dev = raw_std_dev.max(floor);
        let cv_percent = raw_std_dev / mean * 100.0;

        let mut warnings = Vec::new();
        if rejected > 0 {
            warnings.push(DataQualityWarning::RejectedSamples { metric, count: rejected });
        }
        if raw_std_dev < floor {
            warnings.push(DataQualityWarning::IdenticalValues { metric });
        }
        let cv_limit = match metric {
            MetricKind::Hrv => cfg.hrv_cv_warning_percent,
            MetricKind::RestingHr => cfg.rhr_cv_warning_percent,
        };
        if cv_percent > cv_limit {
            warnings.push(DataQualityWarning::UnstableBaseline { metric, cv_percent });
        }

        let bands = self.bands(metric, mean, std_dev);

        let baseline = Baseline {
            id: Uuid::new_v4(),
            athlete_id: athlete_id.to_string(),
            metric,
            version: 1,
            computed_at,
            window_start: valid[0].date,
            window_end: valid[valid.len() - 1].date,
            sample_count: values.len(),
            rejected_count: rejected,
            mean,
            std_dev,
            cv_percent,
            bands,
            warnings,
        };

        info!(
            athlete_id,
            %metric,
            mean = baseline.mean,
            std_dev = baseline.std_dev,
            samples = baseline.sample_count,
            "baseline computed"
        );

        Ok(baseline)
    }

    fn is_usable(&self, sample: &DailySample, metric: MetricKind) -> bool {
        if sample.quality == SampleQuality::Poor {
            return false;
        }
        let Some(value) = sample.metric(metric) else {
            return false;
        };
        if !metric.is_plausible(value) {
            return false;
        }
        if metric == MetricKind::Hrv {
            if let Some(artifacts) = sample.hrv_artifact_percent {
                if artifacts > self.config.max_artifact_percent {
                    return false;
                }
            }
        }
        true
    }

    fn bands(&self, metric: MetricKind, mean: f64, std_dev: f64) -> ThresholdBands {
        let cfg = &self.config;
        match metric {
            MetricKind::Hrv => ThresholdBands {
                normal: mean - cfg.normal_band_sd * std_dev,
                yellow: mean - cfg.yellow_band_sd * std_dev,
                red: mean - cfg.red_band_sd * std_dev,
            },
            MetricKind::RestingHr => ThresholdBands {
                normal: mean + (cfg.normal_band_sd * std_dev).max(cfg.rhr_normal_floor_bpm),
                yellow: mean + (cfg.yellow_band_sd * std_dev).max(cfg.rhr_yellow_floor_bpm),
                red: mean + (cfg.red_band_sd * std_dev).max(cfg.rhr_red_floor_bpm),
            },
        }
    }

    /// Recompute baselines for every athlete present in `samples`
    ///
    /// Athletes are processed in parallel; one athlete failing does not stop
    /// the others.
    pub fn recompute_all(
        &self,
        samples: &[DailySample],
        metric: MetricKind,
        computed_at: DateTime<Utc>,
    ) -> BatchRecomputation {
        let mut by_athlete: BTreeMap<&str, Vec<DailySample>> = BTreeMap::new();
        for sample in samples {
            by_athlete
                .entry(sample.athlete_id.as_str())
                .or_default()
                .push(sample.clone());
        }

        let results: Vec<(String, Result<Baseline>)> = by_athlete
            .into_par_iter()
            .map(|(athlete_id, athlete_samples)| {
                let result = self.estimate_at(athlete_id, metric, &athlete_samples, computed_at);
                (athlete_id.to_string(), result)
            })
            .collect();

        let mut batch = BatchRecomputation::default();
        for (athlete_id, result) in results {
            match result {
                Ok(baseline) => batch.baselines.push(baseline),
                Err(err) => batch.failures.push((athlete_id, err)),
            }
        }

        info!(
            %metric,
            computed = batch.baselines.len(),
            failed = batch.failures.len(),
            "batch baseline recomputation finished"
        );

        batch
    }
}

/// Outcome of a batch recomputation
#[derive(Debug, Default)]
pub struct BatchRecomputation {
    pub baselines: Vec<Baseline>,
    pub failures: Vec<(String, ReadinessError)>,
}

impl BatchRecomputation {
    pub fn is_fully_successful(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Versioned, append-only store of baseline snapshots
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaselineRegistry {
    snapshots: BTreeMap<String, BTreeMap<MetricKind, Vec<Baseline>>>,
}

impl BaselineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new snapshot, superseding the current one for the same athlete and metric
    pub fn record(&mut self, mut baseline: Baseline) -> &Baseline {
        let history = self
            .snapshots
            .entry(baseline.athlete_id.clone())
            .or_default()
            .entry(baseline.metric)
            .or_default();
        baseline.version = history.last().map(|b| b.version + 1).unwrap_or(1);
        debug!(
            athlete_id = %baseline.athlete_id,
            metric = %baseline.metric,
            version = baseline.version,
            "baseline recorded"
        );
        history.push(baseline);
        &history[history.len() - 1]
    }

    /// Latest snapshot
    pub fn current(&self, athlete_id: &str, metric: MetricKind) -> Option<&Baseline> {
        self.history(athlete_id, metric).last()
    }

    /// All snapshots, oldest first
    pub fn history(&self, athlete_id: &str, metric: MetricKind) -> &[Baseline] {
        self.snapshots
            .get(athlete_id)
            .and_then(|metrics| metrics.get(&metric))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Snapshot that was current on `date`
    pub fn as_of(&self, athlete_id: &str, metric: MetricKind, date: NaiveDate) -> Option<&Baseline> {
        self.history(athlete_id, metric)
            .iter()
            .rev()
            .find(|b| b.computed_at.date_naive() <= date)
    }

    /// Whether the baseline is missing or older than `interval_days`
    pub fn needs_recompute(&self, athlete_id: &str, metric: MetricKind, today: NaiveDate, interval_days: i64) -> bool {
        match self.current(athlete_id, metric) {
            Some(baseline) => baseline.age_days(today) >= interval_days,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn hrv_samples(values: &[f64]) -> Vec<DailySample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut s = DailySample::new("athlete", start() + Duration::days(i as i64));
                s.hrv_rmssd = Some(*v);
                s
            })
            .collect()
    }

    fn rhr_samples(values: &[f64]) -> Vec<DailySample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut s = DailySample::new("athlete", start() + Duration::days(i as i64));
                s.resting_hr = Some(*v);
                s
            })
            .collect()
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 6, 0, 0).unwrap()
    }

    #[test]
    fn test_hrv_baseline_statistics() {
        let values = [46.0, 58.0, 52.0, 52.0, 46.0, 58.0, 52.0, 52.0, 46.0, 58.0, 52.0, 52.0, 46.0, 58.0];
        let baseline = BaselineEstimator::new()
            .estimate_at("athlete", MetricKind::Hrv, &hrv_samples(&values), at())
            .unwrap();

        assert!((baseline.mean - 52.0).abs() < 1e-9);
        assert_eq!(baseline.sample_count, 14);
        assert!(baseline.bands.normal < baseline.mean);
        assert!(baseline.bands.is_ordered());
        assert!((baseline.bands.red - (baseline.mean - 1.5 * baseline.std_dev)).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient_data_reports_days_remaining() {
        let values = vec![50.0; 7];
        let err = BaselineEstimator::new()
            .estimate_at("athlete", MetricKind::Hrv, &hrv_samples(&values), at())
            .unwrap_err();

        match err {
            ReadinessError::InsufficientData { days_remaining, .. } => assert_eq!(days_remaining, 7),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_insufficient_quality_after_filtering() {
        let mut values = vec![50.0; 14];
        values[3] = 5.0; // implausible
        values[9] = 250.0; // implausible
        let err = BaselineEstimator::new()
            .estimate_at("athlete", MetricKind::Hrv, &hrv_samples(&values), at())
            .unwrap_err();

        assert!(matches!(
            err,
            ReadinessError::InsufficientQuality {
                valid_days: 12,
                rejected_days: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_poor_samples_filtered_with_warning() {
        let values: Vec<f64> = (0..20).map(|i| 50.0 + (i % 5) as f64).collect();
        let mut samples = hrv_samples(&values);
        samples[0].quality = SampleQuality::Poor;
        samples[1].hrv_artifact_percent = Some(35.0);

        let baseline = BaselineEstimator::new()
            .estimate_at("athlete", MetricKind::Hrv, &samples, at())
            .unwrap();

        assert_eq!(baseline.sample_count, 18);
        assert_eq!(baseline.rejected_count, 2);
        assert!(baseline
            .warnings
            .contains(&DataQualityWarning::RejectedSamples {
                metric: MetricKind::Hrv,
                count: 2
            }));
    }

    #[test]
    fn test_window_uses_most_recent_days() {
        let mut values = vec![90.0; 10];
        values.extend(vec![50.0; 21]);
        let baseline = BaselineEstimator::new()
            .estimate_at("athlete", MetricKind::Hrv, &hrv_samples(&values), at())
            .unwrap();

        assert_eq!(baseline.sample_count, 21);
        assert!((baseline.mean - 50.0).abs() < 1e-9);
        assert!(baseline
            .warnings
            .contains(&DataQualityWarning::IdenticalValues { metric: MetricKind::Hrv }));
        assert!(baseline.bands.is_ordered());
    }

    #[test]
    fn test_unstable_baseline_warns_but_succeeds() {
        let values: Vec<f64> = (0..14).map(|i| if i % 2 == 0 { 30.0 } else { 70.0 }).collect();
        let baseline = BaselineEstimator::new()
            .estimate_at("athlete", MetricKind::Hrv, &hrv_samples(&values), at())
            .unwrap();

        assert!(baseline
            .warnings
            .iter()
            .any(|w| matches!(w, DataQualityWarning::UnstableBaseline { .. })));
    }

    #[test]
    fn test_rhr_bands_respect_bpm_floors() {
        let values: Vec<f64> = (0..14).map(|i| 50.0 + (i % 2) as f64).collect();
        let baseline = BaselineEstimator::new()
            .estimate_at("athlete", MetricKind::RestingHr, &rhr_samples(&values), at())
            .unwrap();

        assert!((baseline.bands.yellow - (baseline.mean + 3.0)).abs() < 1e-9);
        assert!((baseline.bands.red - (baseline.mean + 5.0)).abs() < 1e-9);
        assert!(baseline.bands.is_ordered());
        assert!(baseline.is_beyond_yellow(baseline.mean + 3.5));
    }

    #[test]
    fn test_registry_supersedes_without_mutation() {
        let estimator = BaselineEstimator::new();
        let samples = hrv_samples(&vec![50.0; 14]);
        let mut registry = BaselineRegistry::new();

        let first = estimator.estimate_at("athlete", MetricKind::Hrv, &samples, at()).unwrap();
        let first_id = first.id;
        registry.record(first);

        let later = at() + Duration::days(40);
        let second = estimator
            .estimate_at("athlete", MetricKind::Hrv, &hrv_samples(&vec![60.0; 14]), later)
            .unwrap();
        registry.record(second);

        assert_eq!(registry.history("athlete", MetricKind::Hrv).len(), 2);
        let current = registry.current("athlete", MetricKind::Hrv).unwrap();
        assert_eq!(current.version, 2);
        assert!((current.mean - 60.0).abs() < 1e-9);

        let old = registry
            .as_of("athlete", MetricKind::Hrv, at().date_naive() + Duration::days(1))
            .unwrap();
        assert_eq!(old.id, first_id);
        assert!((old.mean - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_needs_recompute() {
        let mut registry = BaselineRegistry::new();
        let today = at().date_naive();
        assert!(registry.needs_recompute("athlete", MetricKind::Hrv, today, 42));

        let baseline = BaselineEstimator::new()
            .estimate_at("athlete", MetricKind::Hrv, &hrv_samples(&vec![50.0; 14]), at())
            .unwrap();
        registry.record(baseline);

        assert!(!registry.needs_recompute("athlete", MetricKind::Hrv, today + Duration::days(10), 42));
        assert!(registry.needs_recompute("athlete", MetricKind::Hrv, today + Duration::days(42), 42));
    }

    #[test]
    fn test_recompute_all_collects_failures() {
        let mut samples = hrv_samples(&vec![50.0; 14]);
        let mut short: Vec<DailySample> = hrv_samples(&vec![55.0; 5]);
        for s in &mut short {
            s.athlete_id = "newcomer".to_string();
        }
        samples.extend(short);

        let batch = BaselineEstimator::new().recompute_all(&samples, MetricKind::Hrv, at());
        assert_eq!(batch.baselines.len(), 1);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].0, "newcomer");
        assert!(!batch.is_fully_successful());
    }

    proptest! {
        #[test]
        fn test_bands_always_ordered(
            values in prop::collection::vec(15.0f64..180.0, 14..30),
            rhr in prop::collection::vec(38.0f64..95.0, 14..30),
        ) {
            let estimator = BaselineEstimator::new();
            let hrv = estimator.estimate_at("athlete", MetricKind::Hrv, &hrv_samples(&values), at());
            prop_assert!(hrv.is_ok());
            let hrv = hrv.unwrap();
            prop_assert!(hrv.bands.normal > hrv.bands.yellow && hrv.bands.yellow > hrv.bands.red);

            let rhr = estimator.estimate_at("athlete", MetricKind::RestingHr, &rhr_samples(&rhr), at());
            prop_assert!(rhr.is_ok());
            let rhr = rhr.unwrap();
            prop_assert!(rhr.bands.normal < rhr.bands.yellow && rhr.bands.yellow < rhr.bands.red);
        }
    }
}
