//! Composite readiness aggregation
//!
//! Five recovery signals are scored independently onto 0-10, combined with
//! fixed weights, and classified into a readiness tier.
//!
//! # Precedence
//!
//! Discrete danger signals outrank the weighted average, so one badly
//! compromised factor cannot be averaged away by good ones. The rules are
//! evaluated top to bottom; the first match decides the tier:
//!
//! 1. two or more red flags → Critical
//! 2. exactly one red flag → Poor
//! 3. three or more yellow flags → Suboptimal
//! 4. otherwise the composite score: ≥8.5 Excellent, ≥7.5 Good, ≥6.5
//!    Moderate, ≥5.5 Suboptimal, else Poor

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::assessment::{DailyAssessment, DeviationStatus};
use crate::error::{Result, ValidationError};
use crate::models::{FlagLevel, MetricKind};
use crate::quality::DataQualityWarning;
use crate::wellness::{QuestionId, WellnessScore};

/// Step table mapping a raw value onto a 0-10 sub-score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    /// (boundary, score) pairs, checked in order
    pub steps: Vec<(f64, f64)>,
    /// Score when no step matches
    pub otherwise: f64,
}

impl ScoreTable {
    /// First step whose boundary the value reaches or exceeds
    pub fn score_at_least(&self, value: f64) -> f64 {
        self.steps
            .iter()
            .find(|(boundary, _)| value >= *boundary)
            .map(|(_, score)| *score)
            .unwrap_or(self.otherwise)
    }

    /// First step whose boundary the value does not exceed
    pub fn score_at_most(&self, value: f64) -> f64 {
        self.steps
            .iter()
            .find(|(boundary, _)| value <= *boundary)
            .map(|(_, score)| *score)
            .unwrap_or(self.otherwise)
    }
}

/// Weight of each factor in the composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub hrv: f64,
    pub resting_hr: f64,
    pub wellness: f64,
    pub workload_ratio: f64,
    pub sleep: f64,
}

impl FactorWeights {
    pub fn weight(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Hrv => self.hrv,
            Factor::RestingHr => self.resting_hr,
            Factor::Wellness => self.wellness,
            Factor::WorkloadRatio => self.workload_ratio,
            Factor::Sleep => self.sleep,
        }
    }

    pub fn total(&self) -> f64 {
        self.hrv + self.resting_hr + self.wellness + self.workload_ratio + self.sleep
    }
}

impl Default for FactorWeights {
    fn default() -> Self {
        FactorWeights {
            hrv: 3.0,
            resting_hr: 2.0,
            wellness: 2.5,
            workload_ratio: 2.0,
            sleep: 1.5,
        }
    }
}

/// Acute:chronic workload ratio bands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadRatioBands {
    pub optimal_low: f64,
    pub optimal_high: f64,
    pub elevated_high: f64,
    pub high_risk_high: f64,
    pub low_floor: f64,
    pub optimal_score: f64,
    pub elevated_score: f64,
    pub high_risk_score: f64,
    pub danger_score: f64,
    pub low_score: f64,
    pub detraining_score: f64,
}

impl Default for WorkloadRatioBands {
    fn default() -> Self {
        WorkloadRatioBands {
            optimal_low: 0.8,
            optimal_high: 1.0,
            elevated_high: 1.3,
            high_risk_high: 1.5,
            low_floor: 0.6,
            optimal_score: 10.0,
            elevated_score: 8.0,
            high_risk_score: 4.0,
            danger_score: 0.0,
            low_score: 7.0,
            detraining_score: 5.0,
        }
    }
}

impl WorkloadRatioBands {
    pub fn score(&self, ratio: f64) -> f64 {
        if ratio > self.high_risk_high {
            self.danger_score
        } else if ratio > self.elevated_high {
            self.high_risk_score
        } else if ratio > self.optimal_high {
            self.elevated_score
        } else if ratio >= self.optimal_low {
            self.optimal_score
        } else if ratio >= self.low_floor {
            self.low_score
        } else {
            self.detraining_score
        }
    }
}

/// Composite readiness settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    pub weights: FactorWeights,

    /// HRV percent of baseline → score
    pub hrv_table: ScoreTable,

    /// Sub-score for HRV far above baseline
    pub elevated_hrv_score: f64,

    /// RHR deviation in bpm → score
    pub rhr_table: ScoreTable,

    /// Sleep hours → score
    pub sleep_table: ScoreTable,

    pub workload_ratio: WorkloadRatioBands,

    /// Sub-scores at or below this are red flags
    pub red_flag_max: f64,

    /// Sub-scores at or below this (and above red) are yellow flags
    pub yellow_flag_max: f64,

    /// Lower bounds of the Excellent, Good, Moderate and Suboptimal tiers
    pub excellent_min: f64,
    pub good_min: f64,
    pub moderate_min: f64,
    pub suboptimal_min: f64,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        CompositeConfig {
            weights: FactorWeights::default(),
            hrv_table: ScoreTable {
                steps: vec![(95.0, 10.0), (90.0, 8.0), (85.0, 6.0), (80.0, 4.0), (75.0, 2.0)],
                otherwise: 0.0,
            },
            elevated_hrv_score: 5.0,
            rhr_table: ScoreTable {
                steps: vec![(2.0, 10.0), (3.0, 8.0), (5.0, 5.0), (8.0, 2.0)],
                otherwise: 0.0,
            },
            sleep_table: ScoreTable {
                steps: vec![(8.0, 10.0), (7.0, 8.0), (6.0, 6.0), (5.0, 4.0), (4.0, 2.0)],
                otherwise: 0.0,
            },
            workload_ratio: WorkloadRatioBands::default(),
            red_flag_max: 2.0,
            yellow_flag_max: 5.0,
            excellent_min: 8.5,
            good_min: 7.5,
            moderate_min: 6.5,
            suboptimal_min: 5.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Hrv,
    RestingHr,
    Wellness,
    WorkloadRatio,
    Sleep,
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::Hrv => write!(f, "HRV"),
            Factor::RestingHr => write!(f, "resting HR"),
            Factor::Wellness => write!(f, "wellness"),
            Factor::WorkloadRatio => write!(f, "workload ratio"),
            Factor::Sleep => write!(f, "sleep"),
        }
    }
}

/// Readiness tiers, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessTier {
    Excellent,
    Good,
    Moderate,
    Suboptimal,
    Poor,
    Critical,
}

impl ReadinessTier {
    pub fn label(&self) -> &'static str {
        match self {
            ReadinessTier::Excellent => "excellent",
            ReadinessTier::Good => "good",
            ReadinessTier::Moderate => "moderate",
            ReadinessTier::Suboptimal => "suboptimal",
            ReadinessTier::Poor => "poor",
            ReadinessTier::Critical => "critical",
        }
    }
}

impl fmt::Display for ReadinessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Origin of a readiness flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSource {
    Factor(Factor),
    Wellness(QuestionId),
    ChronicDeviation(MetricKind),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessFlag {
    pub source: FlagSource,
    pub level: FlagLevel,
    pub message: String,
}

/// One factor's contribution to the composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: Factor,
    /// Raw input the score was derived from
    pub input: f64,
    pub score: f64,
    pub weight: f64,
    pub flag: Option<FlagLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagCounts {
    pub red: usize,
    pub yellow: usize,
}

/// A flag-based rule that overrides the composite score
#[derive(Debug, Clone, Copy)]
pub struct PrecedenceRule {
    pub name: &'static str,
    pub applies: fn(&FlagCounts) -> bool,
    pub tier: ReadinessTier,
}

fn two_or_more_red(counts: &FlagCounts) -> bool {
    counts.red >= 2
}

fn exactly_one_red(counts: &FlagCounts) -> bool {
    counts.red == 1
}

fn three_or_more_yellow(counts: &FlagCounts) -> bool {
    counts.yellow >= 3
}

/// Flag overrides in evaluation order
pub const FLAG_PRECEDENCE: [PrecedenceRule; 3] = [
    PrecedenceRule {
        name: "two_or_more_red_flags",
        applies: two_or_more_red,
        tier: ReadinessTier::Critical,
    },
    PrecedenceRule {
        name: "one_red_flag",
        applies: exactly_one_red,
        tier: ReadinessTier::Poor,
    },
    PrecedenceRule {
        name: "three_or_more_yellow_flags",
        applies: three_or_more_yellow,
        tier: ReadinessTier::Suboptimal,
    },
];

/// Name recorded when no flag rule fired
pub const COMPOSITE_SCORE_RULE: &str = "composite_score";

/// Inputs for one day's composite
#[derive(Debug, Clone, Copy)]
pub struct ReadinessInputs<'a> {
    pub hrv: &'a DailyAssessment,
    pub resting_hr: &'a DailyAssessment,
    pub wellness: &'a WellnessScore,
    /// Acute:chronic workload ratio, supplied by the training-load system
    pub workload_ratio: f64,
    pub sleep_hours: f64,
}

/// Combined readiness for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeReadiness {
    /// Weighted composite, 0-10, rounded to two decimals
    pub score: f64,
    pub tier: ReadinessTier,
    /// Precedence rule that selected the tier
    pub decided_by: String,
    pub factors: Vec<FactorScore>,
    pub red_flags: Vec<ReadinessFlag>,
    pub yellow_flags: Vec<ReadinessFlag>,
    pub hrv_percent_of_baseline: f64,
    pub rhr_deviation_bpm: f64,
    pub hrv_status: DeviationStatus,
    pub rhr_status: DeviationStatus,
    pub warnings: Vec<DataQualityWarning>,
}

impl CompositeReadiness {
    pub fn factor(&self, factor: Factor) -> Option<&FactorScore> {
        self.factors.iter().find(|f| f.factor == factor)
    }

    /// Lowest-scoring factor; ties go to the factor listed first
    pub fn weakest_factor(&self) -> Option<&FactorScore> {
        self.factors.iter().fold(None, |weakest: Option<&FactorScore>, f| match weakest {
            Some(w) if w.score <= f.score => Some(w),
            _ => Some(f),
        })
    }

    pub fn flag_counts(&self) -> FlagCounts {
        FlagCounts {
            red: self.red_flags.len(),
            yellow: self.yellow_flags.len(),
        }
    }

    /// Whether the result should be shown with reduced confidence
    pub fn is_low_confidence(&self) -> bool {
        !self.warnings.is_empty()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default)]
pub struct ReadinessAggregator {
    config: CompositeConfig,
}

impl ReadinessAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CompositeConfig) -> Self {
        ReadinessAggregator { config }
    }

    pub fn config(&self) -> &CompositeConfig {
        &self.config
    }

    pub fn aggregate(&self, inputs: &ReadinessInputs<'_>) -> Result<CompositeReadiness> {
        let cfg = &self.config;
        validate_inputs(inputs)?;

        let hrv_percent = inputs.hrv.percent_of_baseline;
        let rhr_deviation = inputs.resting_hr.deviation;

        let hrv_score = if inputs.hrv.status == DeviationStatus::AbnormallyElevated {
            cfg.elevated_hrv_score
        } else {
            cfg.hrv_table.score_at_least(hrv_percent)
        };

        let raw_scores = [
            (Factor::Hrv, hrv_percent, hrv_score),
            (Factor::RestingHr, rhr_deviation, cfg.rhr_table.score_at_most(rhr_deviation)),
            (Factor::Wellness, inputs.wellness.composite, inputs.wellness.composite),
            (
                Factor::WorkloadRatio,
                inputs.workload_ratio,
                cfg.workload_ratio.score(inputs.workload_ratio),
            ),
            (Factor::Sleep, inputs.sleep_hours, cfg.sleep_table.score_at_least(inputs.sleep_hours)),
        ];

        let mut factors = Vec::with_capacity(raw_scores.len());
        let mut red_flags = Vec::new();
        let mut yellow_flags = Vec::new();
        let mut weighted = 0.0;
        let mut total_weight = 0.0;

        for (factor, input, score) in raw_scores {
            let weight = cfg.weights.weight(factor);
            let flag = self.flag_for(score);
            if let Some(level) = flag {
                let flag = ReadinessFlag {
                    source: FlagSource::Factor(factor),
                    level,
                    message: format!("{} sub-score {:.1}/10", factor, score),
                };
                match level {
                    FlagLevel::Red => red_flags.push(flag),
                    FlagLevel::Yellow => yellow_flags.push(flag),
                }
            }
            weighted += weight * score;
            total_weight += weight;
            factors.push(FactorScore {
                factor,
                input,
                score,
                weight,
                flag,
            });
        }

        for critical in &inputs.wellness.critical_flags {
            let flag = ReadinessFlag {
                source: FlagSource::Wellness(critical.question),
                level: critical.level,
                message: critical.message.clone(),
            };
            match critical.level {
                FlagLevel::Red => red_flags.push(flag),
                FlagLevel::Yellow => yellow_flags.push(flag),
            }
        }

        for assessment in [inputs.hrv, inputs.resting_hr] {
            if assessment.status == DeviationStatus::Chronic {
                red_flags.push(ReadinessFlag {
                    source: FlagSource::ChronicDeviation(assessment.metric),
                    level: FlagLevel::Red,
                    message: format!(
                        "{} {} for {} consecutive days",
                        assessment.metric,
                        assessment.status_label(),
                        assessment.days_beyond_yellow
                    ),
                });
            }
        }

        let score = if total_weight > 0.0 {
            round2(weighted / total_weight)
        } else {
            0.0
        };
        let counts = FlagCounts {
            red: red_flags.len(),
            yellow: yellow_flags.len(),
        };
        let (tier, decided_by) = self.classify(score, counts);

        let mut warnings = inputs.hrv.warnings.clone();
        warnings.extend(inputs.resting_hr.warnings.iter().cloned());
        warnings.extend(inputs.wellness.warnings.iter().cloned());

        debug!(
            score,
            %tier,
            decided_by,
            red = counts.red,
            yellow = counts.yellow,
            "composite readiness computed"
        );

        Ok(CompositeReadiness {
            score,
            tier,
            decided_by: decided_by.to_string(),
            factors,
            red_flags,
            yellow_flags,
            hrv_percent_of_baseline: hrv_percent,
            rhr_deviation_bpm: rhr_deviation,
            hrv_status: inputs.hrv.status,
            rhr_status: inputs.resting_hr.status,
            warnings,
        })
    }

    /// Select the tier: flag rules first, composite breakpoints last
    pub fn classify(&self, score: f64, counts: FlagCounts) -> (ReadinessTier, &'static str) {
        if let Some(rule) = FLAG_PRECEDENCE.iter().find(|rule| (rule.applies)(&counts)) {
            return (rule.tier, rule.name);
        }

        let cfg = &self.config;
        let tier = if score >= cfg.excellent_min {
            ReadinessTier::Excellent
        } else if score >= cfg.good_min {
            ReadinessTier::Good
        } else if score >= cfg.moderate_min {
            ReadinessTier::Moderate
        } else if score >= cfg.suboptimal_min {
            ReadinessTier::Suboptimal
        } else {
            ReadinessTier::Poor
        };
        (tier, COMPOSITE_SCORE_RULE)
    }

    fn flag_for(&self, score: f64) -> Option<FlagLevel> {
        if score <= self.config.red_flag_max {
            Some(FlagLevel::Red)
        } else if score <= self.config.yellow_flag_max {
            Some(FlagLevel::Yellow)
        } else {
            None
        }
    }
}

fn validate_inputs(inputs: &ReadinessInputs<'_>) -> Result<()> {
    if inputs.hrv.metric != MetricKind::Hrv {
        return Err(ValidationError::Invalid {
            reason: format!("expected an HRV assessment, got {}", inputs.hrv.metric),
        }
        .into());
    }
    if inputs.resting_hr.metric != MetricKind::RestingHr {
        return Err(ValidationError::Invalid {
            reason: format!("expected a resting HR assessment, got {}", inputs.resting_hr.metric),
        }
        .into());
    }
    if !inputs.workload_ratio.is_finite() {
        return Err(ValidationError::NonFinite {
            field: "workload_ratio".to_string(),
        }
        .into());
    }
    if inputs.workload_ratio < 0.0 {
        return Err(ValidationError::OutOfRange {
            field: "workload_ratio".to_string(),
            value: inputs.workload_ratio,
            min: 0.0,
            max: f64::INFINITY,
        }
        .into());
    }
    if !inputs.sleep_hours.is_finite() {
        return Err(ValidationError::NonFinite {
            field: "sleep_hours".to_string(),
        }
        .into());
    }
    if !(0.0..=24.0).contains(&inputs.sleep_hours) {
        return Err(ValidationError::OutOfRange {
            field: "sleep_hours".to_string(),
            value: inputs.sleep_hours,
            min: 0.0,
            max: 24.0,
        }
        .into());
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::wellness::CriticalFlag;
    use proptest::prelude::*;

    #[test]
    fn test_all_good_inputs() {
        let result = readiness(100.0, 0.0, 10.0, 0.9, 8.5);
        assert_eq!(result.score, 10.0);
        assert_eq!(result.tier, ReadinessTier::Excellent);
        assert_eq!(result.decided_by, COMPOSITE_SCORE_RULE);
        assert!(result.red_flags.is_empty());
    }

    #[test]
    fn test_weighted_composite() {
        // HRV 8, RHR 8, wellness 7, ACWR 8, sleep 6
        let result = readiness(92.0, 3.0, 7.0, 1.2, 6.5);
        let expected = (3.0 * 8.0 + 2.0 * 8.0 + 2.5 * 7.0 + 2.0 * 8.0 + 1.5 * 6.0) / 11.0;
        assert!((result.score - expected).abs() < 0.006);
        assert_eq!(result.tier, ReadinessTier::Good);
    }

    #[test]
    fn test_single_red_flag_caps_tier() {
        // Everything excellent except a dangerous workload spike
        let result = readiness(100.0, 0.0, 10.0, 1.8, 9.0);
        assert!(result.score > 8.0);
        assert_eq!(result.red_flags.len(), 1);
        assert_eq!(result.tier, ReadinessTier::Poor);
        assert_eq!(result.decided_by, "one_red_flag");
    }

    #[test]
    fn test_two_red_flags_force_critical() {
        let result = readiness(70.0, 10.0, 9.0, 0.9, 9.0);
        assert_eq!(result.tier, ReadinessTier::Critical);
        assert_eq!(result.decided_by, "two_or_more_red_flags");
    }

    #[test]
    fn test_three_yellow_flags() {
        // HRV 4, RHR 5, wellness 5, ACWR 10, sleep 10
        let result = readiness(82.0, 4.0, 5.0, 0.9, 9.0);
        assert_eq!(result.yellow_flags.len(), 3);
        assert_eq!(result.tier, ReadinessTier::Suboptimal);
    }

    #[test]
    fn test_moderate_tier_from_score() {
        // HRV 8, RHR 8, wellness 6, ACWR 7, sleep 6 -> 7.09
        let result = readiness(91.0, 2.5, 6.0, 0.7, 6.0);
        assert!(result.score >= 6.5 && result.score < 7.5);
        assert_eq!(result.tier, ReadinessTier::Moderate);
    }

    #[test]
    fn test_abnormally_elevated_hrv_is_not_good_news() {
        let h = assessment(MetricKind::Hrv, 135.0, 0.0, DeviationStatus::AbnormallyElevated);
        let r = rhr(0.0);
        let w = wellness(9.0);
        let result = ReadinessAggregator::new()
            .aggregate(&ReadinessInputs {
                hrv: &h,
                resting_hr: &r,
                wellness: &w,
                workload_ratio: 0.9,
                sleep_hours: 8.0,
            })
            .unwrap();
        assert_eq!(result.factor(Factor::Hrv).unwrap().score, 5.0);
        assert_eq!(result.yellow_flags.len(), 1);
    }

    #[test]
    fn test_wellness_and_chronic_flags_aggregate() {
        let h = hrv(100.0);
        let r = assessment(MetricKind::RestingHr, 100.0, 2.0, DeviationStatus::Chronic);
        let mut w = wellness(8.0);
        w.critical_flags.push(CriticalFlag {
            question: QuestionId::InjuryPain,
            level: FlagLevel::Red,
            score: 4.0,
            message: "pain".to_string(),
        });
        let result = ReadinessAggregator::new()
            .aggregate(&ReadinessInputs {
                hrv: &h,
                resting_hr: &r,
                wellness: &w,
                workload_ratio: 0.9,
                sleep_hours: 8.0,
            })
            .unwrap();
        assert_eq!(result.red_flags.len(), 2);
        assert_eq!(result.tier, ReadinessTier::Critical);
    }

    #[test]
    fn test_rejects_swapped_assessments() {
        let h = hrv(100.0);
        let w = wellness(8.0);
        let result = ReadinessAggregator::new().aggregate(&ReadinessInputs {
            hrv: &h,
            resting_hr: &h,
            wellness: &w,
            workload_ratio: 0.9,
            sleep_hours: 8.0,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_workload_ratio() {
        let h = hrv(100.0);
        let r = rhr(0.0);
        let w = wellness(8.0);
        let result = ReadinessAggregator::new().aggregate(&ReadinessInputs {
            hrv: &h,
            resting_hr: &r,
            wellness: &w,
            workload_ratio: f64::NAN,
            sleep_hours: 8.0,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_weakest_factor() {
        let result = readiness(100.0, 0.0, 9.0, 0.9, 6.5);
        assert_eq!(result.weakest_factor().unwrap().factor, Factor::Sleep);
    }

    #[test]
    fn test_workload_ratio_bands() {
        let bands = WorkloadRatioBands::default();
        assert_eq!(bands.score(0.8), 10.0);
        assert_eq!(bands.score(1.0), 10.0);
        assert_eq!(bands.score(1.3), 8.0);
        assert_eq!(bands.score(1.5), 4.0);
        assert_eq!(bands.score(1.51), 0.0);
        assert_eq!(bands.score(0.7), 7.0);
        assert_eq!(bands.score(0.4), 5.0);
    }

    proptest! {
        #[test]
        fn test_red_flag_precedence(score in 0.0f64..=10.0, red in 0usize..5, yellow in 0usize..5) {
            let aggregator = ReadinessAggregator::new();
            let (tier, _) = aggregator.classify(score, FlagCounts { red, yellow });
            if red >= 2 {
                prop_assert_eq!(tier, ReadinessTier::Critical);
            } else if red == 1 {
                prop_assert!(tier >= ReadinessTier::Poor);
            } else if yellow >= 3 {
                prop_assert!(tier >= ReadinessTier::Suboptimal);
            }
        }

        #[test]
        fn test_composite_is_pure(
            hrv_pct in 50.0f64..150.0,
            rhr_dev in -5.0f64..12.0,
            well in 1.0f64..10.0,
            acwr in 0.3f64..2.0,
            sleep in 3.0f64..10.0,
        ) {
            let first = readiness(hrv_pct, rhr_dev, well, acwr, sleep);
            let second = readiness(hrv_pct, rhr_dev, well, acwr, sleep);
            prop_assert_eq!(first.score.to_bits(), second.score.to_bits());
            prop_assert_eq!(first, second);
        }
    }
}
