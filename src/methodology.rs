//! Methodology-specific override rules
//!
//! Each training methodology implements [`MethodologyRules`]. A rule set
//! inspects the composite readiness and the planned workout and may propose
//! a stricter [`ModificationLevel`]. The modification engine discards any
//! proposal that is not stricter than its own generic decision, so adding a
//! methodology can never relax a decision.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::composite::CompositeReadiness;
use crate::modification::ModificationLevel;
use crate::models::{Methodology, PlannedWorkout, WorkoutType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodologyConfig {
    /// Norwegian double-threshold: RHR deviation above this vetoes quality work
    pub norwegian_rhr_veto_bpm: f64,

    /// Norwegian double-threshold: HRV percent of baseline below this vetoes
    pub norwegian_hrv_veto_percent: f64,

    /// Norwegian double-threshold: composite needed for threshold work as
    /// planned, single or double
    pub norwegian_double_min_composite: f64,

    /// Polarized: composite needed for high-intensity sessions
    pub polarized_high_intensity_min_composite: f64,
}

impl Default for MethodologyConfig {
    fn default() -> Self {
        MethodologyConfig {
            norwegian_rhr_veto_bpm: 3.0,
            norwegian_hrv_veto_percent: 90.0,
            norwegian_double_min_composite: 7.5,
            polarized_high_intensity_min_composite: 7.0,
        }
    }
}

/// A stricter decision proposed by a methodology
#[derive(Debug, Clone, PartialEq)]
pub struct MethodologyOverride {
    pub rule: &'static str,
    pub level: ModificationLevel,
    pub reason: String,
}

pub trait MethodologyRules: Debug + Send + Sync {
    fn methodology(&self) -> Methodology;

    /// Propose a decision for the workout, or None to defer to the generic map
    fn evaluate(&self, readiness: &CompositeReadiness, workout: &PlannedWorkout) -> Option<MethodologyOverride>;
}

/// Look up the rule set for a methodology
pub fn rules_for(methodology: Methodology, config: &MethodologyConfig) -> Box<dyn MethodologyRules> {
    match methodology {
        Methodology::Generic => Box::new(GenericRules),
        Methodology::NorwegianDoubleThreshold => Box::new(NorwegianDoubleThresholdRules::new(config.clone())),
        Methodology::Polarized => Box::new(PolarizedRules::new(config.clone())),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericRules;

impl MethodologyRules for GenericRules {
    fn methodology(&self) -> Methodology {
        Methodology::Generic
    }

    fn evaluate(&self, _readiness: &CompositeReadiness, _workout: &PlannedWorkout) -> Option<MethodologyOverride> {
        None
    }
}

/// Double-threshold protocol: two controlled threshold sessions in one day
/// only when every recovery marker is clean
#[derive(Debug, Clone, Default)]
pub struct NorwegianDoubleThresholdRules {
    config: MethodologyConfig,
}

impl NorwegianDoubleThresholdRules {
    pub fn new(config: MethodologyConfig) -> Self {
        NorwegianDoubleThresholdRules { config }
    }

    fn is_threshold_work(workout: &PlannedWorkout) -> bool {
        matches!(
            workout.workout_type,
            WorkoutType::Tempo | WorkoutType::Threshold | WorkoutType::Vo2Max
        ) || workout.intervals.is_some()
    }
}

impl MethodologyRules for NorwegianDoubleThresholdRules {
    fn methodology(&self) -> Methodology {
        Methodology::NorwegianDoubleThreshold
    }

    fn evaluate(&self, readiness: &CompositeReadiness, workout: &PlannedWorkout) -> Option<MethodologyOverride> {
        if !Self::is_threshold_work(workout) {
            return None;
        }
        let cfg = &self.config;

        if readiness.rhr_deviation_bpm > cfg.norwegian_rhr_veto_bpm {
            return Some(MethodologyOverride {
                rule: "norwegian_rhr_veto",
                level: ModificationLevel::Major,
                reason: format!(
                    "Resting HR is {:+.1} bpm over baseline, above the {:.0} bpm limit for threshold work",
                    readiness.rhr_deviation_bpm, cfg.norwegian_rhr_veto_bpm
                ),
            });
        }

        if readiness.hrv_percent_of_baseline < cfg.norwegian_hrv_veto_percent {
            return Some(MethodologyOverride {
                rule: "norwegian_hrv_veto",
                level: ModificationLevel::Major,
                reason: format!(
                    "HRV is {:.0}% of baseline, below the {:.0}% needed for threshold work",
                    readiness.hrv_percent_of_baseline, cfg.norwegian_hrv_veto_percent
                ),
            });
        }

        if readiness.score >= cfg.norwegian_double_min_composite {
            return None;
        }
        // Moderate also turns a double day into one shorter session
        let (rule, day) = if workout.is_double() {
            ("norwegian_double_requires_high_readiness", "A double threshold day")
        } else {
            ("norwegian_threshold_requires_high_readiness", "Threshold work")
        };
        Some(MethodologyOverride {
            rule,
            level: ModificationLevel::Moderate,
            reason: format!(
                "{} needs readiness of {:.1}, today is {:.1}",
                day, cfg.norwegian_double_min_composite, readiness.score
            ),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PolarizedRules {
    config: MethodologyConfig,
}

impl PolarizedRules {
    pub fn new(config: MethodologyConfig) -> Self {
        PolarizedRules { config }
    }
}

impl MethodologyRules for PolarizedRules {
    fn methodology(&self) -> Methodology {
        Methodology::Polarized
    }

    fn evaluate(&self, readiness: &CompositeReadiness, workout: &PlannedWorkout) -> Option<MethodologyOverride> {
        let high_intensity = matches!(workout.workout_type, WorkoutType::Vo2Max | WorkoutType::Race);
        let required = self.config.polarized_high_intensity_min_composite;

        (high_intensity && readiness.score < required).then(|| MethodologyOverride {
            rule: "polarized_high_intensity_gate",
            level: ModificationLevel::Major,
            reason: format!(
                "High-intensity days in a polarized plan need readiness of {:.1}, today is {:.1}",
                required, readiness.score
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::test_support::readiness;
    use crate::composite::ReadinessTier;
    use crate::modification::ModificationEngine;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn threshold(sessions: u8) -> PlannedWorkout {
        let mut w = PlannedWorkout::new(
            "thr",
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            WorkoutType::Threshold,
            70,
        );
        w.sessions = sessions;
        w
    }

    #[test]
    fn test_generic_never_overrides() {
        let r = readiness(70.0, 10.0, 3.0, 2.0, 3.0);
        assert!(GenericRules.evaluate(&r, &threshold(2)).is_none());
    }

    #[test]
    fn test_norwegian_rhr_veto_despite_good_composite() {
        // RHR +3.5 bpm scores 5 (yellow) but the composite stays excellent
        let r = readiness(100.0, 3.5, 9.0, 0.9, 9.0);
        assert_eq!(r.tier, ReadinessTier::Excellent);

        let decision = ModificationEngine::new()
            .decide(&r, &threshold(1), Methodology::NorwegianDoubleThreshold)
            .unwrap();
        assert_eq!(decision.level, ModificationLevel::Major);
        assert_eq!(decision.override_rule.as_deref(), Some("norwegian_rhr_veto"));
        assert_eq!(decision.modified.unwrap().workout_type, WorkoutType::Easy);
    }

    #[test]
    fn test_norwegian_hrv_veto() {
        let r = readiness(88.0, 0.0, 9.0, 0.9, 9.0);
        let proposal = NorwegianDoubleThresholdRules::default().evaluate(&r, &threshold(1));
        assert_eq!(proposal.map(|p| p.rule), Some("norwegian_hrv_veto"));
    }

    #[test]
    fn test_norwegian_double_downgraded_to_single() {
        // composite 7.09, no vetoes
        let r = readiness(92.0, 3.0, 6.0, 0.7, 6.0);
        assert!(r.score < 7.5);

        let decision = ModificationEngine::new()
            .decide(&r, &threshold(2), Methodology::NorwegianDoubleThreshold)
            .unwrap();
        assert_eq!(decision.level, ModificationLevel::Moderate);
        assert_eq!(decision.modified.unwrap().sessions, 1);
    }

    #[test]
    fn test_norwegian_single_session_needs_high_readiness() {
        // clean HRV and RHR, composite 7.45
        let r = readiness(92.0, 2.0, 4.0, 1.2, 7.0);
        assert!((r.score - 7.45).abs() < 1e-9);
        assert_eq!(r.tier, ReadinessTier::Moderate);

        let engine = ModificationEngine::new();
        let generic = engine.decide(&r, &threshold(1), Methodology::Generic).unwrap();
        let norwegian = engine
            .decide(&r, &threshold(1), Methodology::NorwegianDoubleThreshold)
            .unwrap();

        assert_eq!(generic.level, ModificationLevel::Minor);
        assert_eq!(norwegian.level, ModificationLevel::Moderate);
        assert_eq!(
            norwegian.override_rule.as_deref(),
            Some("norwegian_threshold_requires_high_readiness")
        );
        let modified = norwegian.modified.unwrap();
        assert_eq!(modified.sessions, 1);
        assert_eq!(modified.duration_minutes, 56);
    }

    #[test]
    fn test_norwegian_gate_passes_high_readiness() {
        let r = readiness(100.0, 0.0, 8.0, 0.9, 8.0);
        assert!(r.score >= 7.5);
        assert!(NorwegianDoubleThresholdRules::default().evaluate(&r, &threshold(1)).is_none());
        assert!(NorwegianDoubleThresholdRules::default().evaluate(&r, &threshold(2)).is_none());
    }

    #[test]
    fn test_norwegian_ignores_easy_runs() {
        let r = readiness(80.0, 6.0, 9.0, 0.9, 9.0);
        let easy = PlannedWorkout::new("e", NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(), WorkoutType::Easy, 40);
        assert!(NorwegianDoubleThresholdRules::default().evaluate(&r, &easy).is_none());
    }

    #[test]
    fn test_weaker_proposal_is_discarded() {
        // Critical generic decision stays a cancellation
        let r = readiness(70.0, 10.0, 9.0, 0.9, 9.0);
        let decision = ModificationEngine::new()
            .decide(&r, &threshold(2), Methodology::NorwegianDoubleThreshold)
            .unwrap();
        assert_eq!(decision.level, ModificationLevel::Cancel);
        assert!(decision.override_rule.is_none());
    }

    #[test]
    fn test_polarized_gate() {
        // composite 6.55
        let r = readiness(86.0, 3.0, 6.0, 0.7, 6.0);
        assert!(r.score < 7.0);
        let vo2 = PlannedWorkout::new("v", NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(), WorkoutType::Vo2Max, 50);
        let decision = ModificationEngine::new().decide(&r, &vo2, Methodology::Polarized).unwrap();
        assert_eq!(decision.level, ModificationLevel::Major);
    }

    fn workout_type() -> impl Strategy<Value = WorkoutType> {
        prop_oneof![
            Just(WorkoutType::Easy),
            Just(WorkoutType::Recovery),
            Just(WorkoutType::LongRun),
            Just(WorkoutType::Tempo),
            Just(WorkoutType::Threshold),
            Just(WorkoutType::Vo2Max),
            Just(WorkoutType::Race),
        ]
    }

    proptest! {
        #[test]
        fn test_methodology_never_weaker_than_generic(
            hrv_pct in 60.0f64..140.0,
            rhr_dev in -3.0f64..10.0,
            well in 1.0f64..10.0,
            acwr in 0.4f64..1.8,
            sleep in 3.0f64..10.0,
            kind in workout_type(),
            sessions in 1u8..=2,
        ) {
            let r = readiness(hrv_pct, rhr_dev, well, acwr, sleep);
            let mut workout = threshold(sessions);
            workout.workout_type = kind;
            let engine = ModificationEngine::new();

            let generic = engine.decide(&r, &workout, Methodology::Generic).unwrap();
            for methodology in [Methodology::NorwegianDoubleThreshold, Methodology::Polarized] {
                let specific = engine.decide(&r, &workout, methodology).unwrap();
                prop_assert!(specific.level >= generic.level);
            }
        }
    }
}
