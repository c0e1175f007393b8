//! Trend analysis over readiness history files

use chrono::{Duration, NaiveDate};
use std::fs;
use tempfile::tempdir;

use readyrs::import;
use readyrs::trends::TrendWarningKind;
use readyrs::{HistoryEntry, ModificationLevel, ReadinessError, ReadinessPipeline, Severity};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
}

fn steady(days: usize) -> Vec<HistoryEntry> {
    (0..days)
        .map(|i| HistoryEntry {
            hrv_percent_of_baseline: Some(101.0),
            rhr_deviation_bpm: Some(0.5),
            composite_score: Some(8.1),
            modification_level: Some(ModificationLevel::Proceed),
            pain_score: Some(10.0),
            ..HistoryEntry::new(start() + Duration::days(i as i64))
        })
        .collect()
}

#[test]
fn test_overreaching_block() {
    let mut history = steady(21);
    for entry in &mut history[13..] {
        entry.hrv_percent_of_baseline = Some(80.0);
        entry.composite_score = Some(5.8);
        entry.modification_level = Some(ModificationLevel::Moderate);
    }
    for entry in &mut history[15..] {
        entry.rhr_deviation_bpm = Some(6.0);
    }
    history[16].pain_score = Some(6.0);
    history[18].pain_score = Some(5.0);
    history[20].pain_score = Some(6.0);

    let report = ReadinessPipeline::default().analyze_trends(&history).unwrap();

    assert_eq!(report.days_analyzed, 21);
    assert_eq!(report.window_end, start() + Duration::days(20));
    assert!(report.has(TrendWarningKind::SustainedSuppression));
    assert!(report.has(TrendWarningKind::ChronicRhrElevation));
    assert!(report.has(TrendWarningKind::RecurringPain));
    assert!(!report.has(TrendWarningKind::OvertrainingParadox));
    assert_eq!(report.highest_severity, Some(Severity::Critical));
    assert!(report.requires_urgent_attention());

    let suppression = report
        .warnings
        .iter()
        .find(|w| w.kind == TrendWarningKind::SustainedSuppression)
        .unwrap();
    assert_eq!(suppression.severity, Severity::High);
    assert_eq!(suppression.statistics["consecutive_days"], 8.0);
}

#[test]
fn test_decline_despite_good_readiness() {
    let mut history = steady(21);
    for (i, perf) in [100.0, 96.0, 92.0, 88.0].into_iter().enumerate() {
        history[8 + i * 4].benchmark_performance = Some(perf);
    }

    let report = ReadinessPipeline::default().analyze_trends(&history).unwrap();
    let warning = &report.warnings[0];
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(warning.kind, TrendWarningKind::PerformanceDeclineDespiteReadiness);
    assert_eq!(warning.severity, Severity::Medium);
    assert!(!report.requires_urgent_attention());
}

#[test]
fn test_history_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.json");
    fs::write(&path, serde_json::to_string_pretty(&steady(14)).unwrap()).unwrap();

    let history = import::load_history(&path).unwrap();
    let report = ReadinessPipeline::default().analyze_trends(&history).unwrap();
    assert!(report.warnings.is_empty());
    assert_eq!(report.highest_severity, None);
}

#[test]
fn test_too_little_history() {
    let err = ReadinessPipeline::default().analyze_trends(&steady(9)).unwrap_err();
    match err {
        ReadinessError::InsufficientData { days_remaining, .. } => assert_eq!(days_remaining, 5),
        other => panic!("unexpected error: {other}"),
    }
}
