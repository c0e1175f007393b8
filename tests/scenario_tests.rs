//! Readiness scenarios checked against the public component API

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;

use readyrs::baseline::Baseline;
use readyrs::composite::{FlagSource, ReadinessInputs};
use readyrs::wellness::{WellnessConfig, WellnessTier};
use readyrs::{
    BaselineEstimator, DailyMetricAssessor, DailySample, DeviationStatus, MetricKind, QuestionId,
    ReadinessAggregator, ReadinessTier, RecommendedAction, WellnessResponse, WellnessScorer,
};

fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap() + Duration::days(n)
}

fn samples(values: &[f64], metric: MetricKind) -> Vec<DailySample> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let mut s = DailySample::new("ben", day(i as i64));
            match metric {
                MetricKind::Hrv => s.hrv_rmssd = Some(*v),
                MetricKind::RestingHr => s.resting_hr = Some(*v),
            }
            s
        })
        .collect()
}

fn baseline(values: &[f64], metric: MetricKind) -> Baseline {
    let computed_at = Utc.with_ymd_and_hms(2024, 5, 20, 6, 0, 0).unwrap();
    BaselineEstimator::new()
        .estimate_at("ben", metric, &samples(values, metric), computed_at)
        .unwrap()
}

/// 14 readings alternating around 52 ms, standard deviation about 6 ms
fn hrv_baseline() -> Baseline {
    let values: Vec<f64> = (0..14).map(|i| if i % 2 == 0 { 46.0 } else { 58.0 }).collect();
    baseline(&values, MetricKind::Hrv)
}

/// 14 readings alternating around 48 bpm
fn rhr_baseline() -> Baseline {
    let values: Vec<f64> = (0..14).map(|i| if i % 2 == 0 { 47.0 } else { 49.0 }).collect();
    baseline(&values, MetricKind::RestingHr)
}

fn good_wellness() -> WellnessResponse {
    QuestionId::ALL
        .iter()
        .fold(WellnessResponse::new(), |r, q| {
            let value = match q {
                QuestionId::SleepHours => 8.0,
                QuestionId::MuscleSoreness | QuestionId::Stress => 2.0,
                _ => 8.0,
            };
            r.with(*q, value)
        })
}

#[test]
fn test_severely_suppressed_hrv_requires_rest() {
    let baseline = hrv_baseline();
    assert!((baseline.mean - 52.0).abs() < 1e-9);
    assert!(baseline.bands.red > 40.0);

    let assessment = DailyMetricAssessor::new().assess(40.0, &baseline, &[]).unwrap();

    assert!((assessment.percent_of_baseline - 76.92).abs() < 0.01);
    assert_eq!(assessment.status, DeviationStatus::Severe);
    assert_eq!(assessment.status_label(), "severely suppressed");
    assert_eq!(assessment.action, RecommendedAction::RestRequired);
}

#[test]
fn test_baseline_mean_reads_normal() {
    for baseline in [hrv_baseline(), rhr_baseline()] {
        let history = vec![baseline.mean; 7];
        let assessment = DailyMetricAssessor::new()
            .assess(baseline.mean, &baseline, &history)
            .unwrap();
        assert_eq!(assessment.status, DeviationStatus::Normal);
        assert_eq!(assessment.action, RecommendedAction::Proceed);
    }
}

#[test]
fn test_rhr_elevation_becomes_chronic() {
    let baseline = rhr_baseline();
    assert!((baseline.bands.yellow - 51.0).abs() < 1e-9);

    // three days more than 3 bpm over baseline, today only +2
    let history = [48.0, 48.0, 51.5, 51.5, 51.5];
    let assessment = DailyMetricAssessor::new().assess(50.0, &baseline, &history).unwrap();

    assert!((assessment.deviation - 2.0).abs() < 1e-9);
    assert_eq!(assessment.status, DeviationStatus::Chronic);
    assert_eq!(assessment.status_label(), "chronically elevated");
    assert_eq!(assessment.days_beyond_yellow, 3);
}

#[test]
fn test_chronic_elevation_caps_composite_tier() {
    let assessor = DailyMetricAssessor::new();
    let hrv_baseline = hrv_baseline();
    let hrv = assessor.assess(hrv_baseline.mean, &hrv_baseline, &[]).unwrap();
    let resting_hr = assessor
        .assess(50.0, &rhr_baseline(), &[48.0, 48.0, 51.5, 51.5, 51.5])
        .unwrap();
    let wellness = WellnessScorer::new().score(&good_wellness()).unwrap();

    let readiness = ReadinessAggregator::new()
        .aggregate(&ReadinessInputs {
            hrv: &hrv,
            resting_hr: &resting_hr,
            wellness: &wellness,
            workload_ratio: 0.9,
            sleep_hours: 8.0,
        })
        .unwrap();

    // every factor scores well, the chronic deviation alone decides
    assert!(readiness.score >= 8.5);
    assert_eq!(readiness.red_flags.len(), 1);
    assert!(matches!(
        readiness.red_flags[0].source,
        FlagSource::ChronicDeviation(MetricKind::RestingHr)
    ));
    assert_eq!(readiness.tier, ReadinessTier::Poor);
    assert_eq!(readiness.decided_by, "one_red_flag");
}

#[test]
fn test_wellness_breakpoint_inclusive() {
    let scorer = WellnessScorer::new();

    // weighted sum 72.25 over a total weight of 8.5
    let response = good_wellness().with(QuestionId::Motivation, 9.0);
    let score = scorer.score(&response).unwrap();
    assert_eq!(score.composite, 8.5);
    assert_eq!(score.tier, WellnessTier::Excellent);
    assert!(!score.has_red_flag());

    let config = WellnessConfig::default();
    assert_eq!(WellnessTier::from_score(8.49, &config), WellnessTier::Good);
}

proptest! {
    #[test]
    fn prop_bands_are_ordered(
        values in prop::collection::vec(32.0f64..120.0, 14..21),
    ) {
        let computed_at = Utc.with_ymd_and_hms(2024, 6, 1, 6, 0, 0).unwrap();
        let estimator = BaselineEstimator::new();
        let hrv = estimator.estimate_at("ben", MetricKind::Hrv, &samples(&values, MetricKind::Hrv), computed_at).unwrap();
        prop_assert!(hrv.bands.is_ordered());
        prop_assert!(hrv.bands.normal > hrv.bands.yellow && hrv.bands.yellow > hrv.bands.red);

        let rhr_values: Vec<f64> = values.iter().map(|v| v * 0.5 + 20.0).collect();
        let rhr = estimator.estimate_at("ben", MetricKind::RestingHr, &samples(&rhr_values, MetricKind::RestingHr), computed_at).unwrap();
        prop_assert!(rhr.bands.normal < rhr.bands.yellow && rhr.bands.yellow < rhr.bands.red);
    }
}
