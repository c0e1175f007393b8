//! Workout modification engine
//!
//! Turns a composite readiness result and the day's planned workout into a
//! concrete decision: proceed, minor, moderate or major modification, or
//! cancellation. Methodology rules are consulted first and may only make
//! the decision stricter.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::composite::{CompositeReadiness, Factor, ReadinessTier};
use crate::error::{Result, ValidationError};
use crate::methodology::{rules_for, MethodologyConfig, MethodologyOverride};
use crate::models::{Methodology, PlannedWorkout, WorkoutImportance, WorkoutType};

/// Modification severity, least to most disruptive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationLevel {
    Proceed,
    Minor,
    Moderate,
    Major,
    Cancel,
}

impl ModificationLevel {
    pub fn from_tier(tier: ReadinessTier) -> Self {
        match tier {
            ReadinessTier::Excellent | ReadinessTier::Good => ModificationLevel::Proceed,
            ReadinessTier::Moderate => ModificationLevel::Minor,
            ReadinessTier::Suboptimal => ModificationLevel::Moderate,
            ReadinessTier::Poor => ModificationLevel::Major,
            ReadinessTier::Critical => ModificationLevel::Cancel,
        }
    }

    pub fn is_modified(&self) -> bool {
        *self != ModificationLevel::Proceed
    }
}

impl fmt::Display for ModificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModificationLevel::Proceed => write!(f, "proceed"),
            ModificationLevel::Minor => write!(f, "minor"),
            ModificationLevel::Moderate => write!(f, "moderate"),
            ModificationLevel::Major => write!(f, "major"),
            ModificationLevel::Cancel => write!(f, "cancel"),
        }
    }
}

/// One concrete change made to the planned workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Adjustment {
    Cancelled,
    ConvertedToEasy { from: WorkoutType },
    DurationReduced { from_minutes: u32, to_minutes: u32 },
    PaceSlowed { seconds_per_km: u32 },
    RepetitionsReduced { from: u32, to: u32 },
    RecoveryExtended { from_seconds: u32, to_seconds: u32 },
    IntervalsRemoved,
    SingleSession,
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::Cancelled => write!(f, "workout cancelled"),
            Adjustment::ConvertedToEasy { from } => write!(f, "{} converted to easy aerobic running", from),
            Adjustment::DurationReduced { from_minutes, to_minutes } => {
                write!(f, "duration reduced from {} to {} min", from_minutes, to_minutes)
            }
            Adjustment::PaceSlowed { seconds_per_km } => write!(f, "target pace slowed by {} s/km", seconds_per_km),
            Adjustment::RepetitionsReduced { from, to } => write!(f, "repetitions reduced from {} to {}", from, to),
            Adjustment::RecoveryExtended { from_seconds, to_seconds } => {
                write!(f, "recovery extended from {} s to {} s", from_seconds, to_seconds)
            }
            Adjustment::IntervalsRemoved => write!(f, "interval structure removed"),
            Adjustment::SingleSession => write!(f, "double session reduced to a single session"),
        }
    }
}

/// When and under what condition the original session can be attempted again
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleRecommendation {
    pub min_wait_hours: u32,
    pub earliest_date: NaiveDate,
    pub reassess_within_hours: Option<u32>,
    pub resume_when_composite_at_least: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutModification {
    pub workout_id: String,
    pub date: NaiveDate,
    pub level: ModificationLevel,
    pub tier: ReadinessTier,
    pub composite_score: f64,
    pub methodology: Methodology,
    pub original: PlannedWorkout,
    /// None when the session is cancelled
    pub modified: Option<PlannedWorkout>,
    pub adjustments: Vec<Adjustment>,
    pub reasoning: String,
    pub reschedule: Option<RescheduleRecommendation>,
    /// Non-binding advice, never a change to the workout
    pub suggestion: Option<String>,
    /// Methodology rule that tightened the generic decision
    pub override_rule: Option<String>,
    /// Low-confidence readiness inputs
    pub low_confidence: bool,
}

impl WorkoutModification {
    pub fn is_cancelled(&self) -> bool {
        self.level == ModificationLevel::Cancel
    }

    /// True when the athlete runs the session exactly as planned
    pub fn is_unchanged(&self) -> bool {
        self.adjustments.is_empty()
    }
}

/// Per workout type reductions applied at the moderate level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionRule {
    /// Fraction of the duration removed
    pub duration_cut: f64,
    pub pace_slowdown_seconds: u32,
    /// Fraction of repetitions removed
    pub repetition_cut: f64,
    /// Fractional increase of recovery between repetitions
    pub recovery_extension: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModificationConfig {
    pub cancel_min_wait_hours: u32,
    pub cancel_reassess_hours: u32,
    pub cancel_resume_composite: f64,

    /// Cap on the easy session replacing a quality session
    pub major_easy_max_minutes: u32,
    pub major_pace_slowdown_seconds: u32,
    /// Share of duration kept when an easy session is shortened further
    pub major_easy_duration_factor: f64,
    pub major_reschedule_wait_hours: u32,
    pub major_resume_composite: f64,

    pub threshold_rule: ReductionRule,
    pub vo2max_rule: ReductionRule,
    pub long_run_rule: ReductionRule,
    pub easy_rule: ReductionRule,

    pub minor_pace_slowdown_seconds: u32,
    pub minor_volume_cut: f64,

    pub methodology: MethodologyConfig,
}

impl Default for ModificationConfig {
    fn default() -> Self {
        ModificationConfig {
            cancel_min_wait_hours: 24,
            cancel_reassess_hours: 48,
            cancel_resume_composite: 6.5,
            major_easy_max_minutes: 30,
            major_pace_slowdown_seconds: 60,
            major_easy_duration_factor: 0.6,
            major_reschedule_wait_hours: 48,
            major_resume_composite: 7.5,
            threshold_rule: ReductionRule {
                duration_cut: 0.20,
                pace_slowdown_seconds: 10,
                repetition_cut: 0.25,
                recovery_extension: 0.30,
            },
            vo2max_rule: ReductionRule {
                duration_cut: 0.25,
                pace_slowdown_seconds: 5,
                repetition_cut: 0.33,
                recovery_extension: 0.30,
            },
            long_run_rule: ReductionRule {
                duration_cut: 0.25,
                pace_slowdown_seconds: 15,
                repetition_cut: 0.0,
                recovery_extension: 0.0,
            },
            easy_rule: ReductionRule {
                duration_cut: 0.20,
                pace_slowdown_seconds: 0,
                repetition_cut: 0.0,
                recovery_extension: 0.0,
            },
            minor_pace_slowdown_seconds: 5,
            minor_volume_cut: 0.10,
            methodology: MethodologyConfig::default(),
        }
    }
}

impl ModificationConfig {
    pub fn rule_for(&self, workout_type: WorkoutType) -> &ReductionRule {
        match workout_type {
            WorkoutType::Tempo | WorkoutType::Threshold | WorkoutType::Race => &self.threshold_rule,
            WorkoutType::Vo2Max => &self.vo2max_rule,
            WorkoutType::LongRun => &self.long_run_rule,
            WorkoutType::Easy | WorkoutType::Recovery => &self.easy_rule,
        }
    }
}

fn scale_count(value: u32, factor: f64) -> u32 {
    ((value as f64 * factor).round() as u32).max(1)
}

fn slow_pace(pace: Decimal, seconds_per_km: u32) -> Decimal {
    (pace + Decimal::from(seconds_per_km) / dec!(60)).round_dp(2)
}

/// Builds the modified workout and records every change made to it
struct WorkoutEditor {
    workout: PlannedWorkout,
    adjustments: Vec<Adjustment>,
}

impl WorkoutEditor {
    fn new(original: &PlannedWorkout) -> Self {
        WorkoutEditor {
            workout: original.clone(),
            adjustments: Vec::new(),
        }
    }

    fn set_duration(&mut self, minutes: u32) {
        let minutes = minutes.max(1);
        if minutes < self.workout.duration_minutes {
            self.adjustments.push(Adjustment::DurationReduced {
                from_minutes: self.workout.duration_minutes,
                to_minutes: minutes,
            });
            self.workout.duration_minutes = minutes;
        }
    }

    fn cut_duration(&mut self, fraction: f64) {
        if fraction > 0.0 {
            self.set_duration(scale_count(self.workout.duration_minutes, 1.0 - fraction));
        }
    }

    /// Returns false when there is no target pace to slow
    fn slow_pace(&mut self, seconds_per_km: u32) -> bool {
        match self.workout.target_pace {
            Some(pace) if seconds_per_km > 0 => {
                self.workout.target_pace = Some(slow_pace(pace, seconds_per_km));
                self.adjustments.push(Adjustment::PaceSlowed { seconds_per_km });
                true
            }
            _ => false,
        }
    }

    fn cut_repetitions(&mut self, fraction: f64) {
        if fraction <= 0.0 {
            return;
        }
        if let Some(intervals) = self.workout.intervals.as_mut() {
            let reduced = scale_count(intervals.repetitions, 1.0 - fraction);
            if reduced < intervals.repetitions {
                self.adjustments.push(Adjustment::RepetitionsReduced {
                    from: intervals.repetitions,
                    to: reduced,
                });
                intervals.repetitions = reduced;
            }
        }
    }

    fn extend_recovery(&mut self, fraction: f64) {
        if fraction <= 0.0 {
            return;
        }
        if let Some(intervals) = self.workout.intervals.as_mut() {
            let extended = (intervals.recovery_seconds as f64 * (1.0 + fraction)).round() as u32;
            if extended > intervals.recovery_seconds {
                self.adjustments.push(Adjustment::RecoveryExtended {
                    from_seconds: intervals.recovery_seconds,
                    to_seconds: extended,
                });
                intervals.recovery_seconds = extended;
            }
        }
    }

    fn single_session(&mut self) {
        if self.workout.is_double() {
            self.workout.sessions = 1;
            self.adjustments.push(Adjustment::SingleSession);
        }
    }

    fn convert_to_easy(&mut self) {
        let from = self.workout.workout_type;
        self.workout.workout_type = WorkoutType::Easy;
        self.workout.target_hr = None;
        self.adjustments.push(Adjustment::ConvertedToEasy { from });
        if self.workout.intervals.take().is_some() {
            self.adjustments.push(Adjustment::IntervalsRemoved);
        }
    }

    fn finish(self) -> (PlannedWorkout, Vec<Adjustment>) {
        (self.workout, self.adjustments)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModificationEngine {
    config: ModificationConfig,
}

impl ModificationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ModificationConfig) -> Self {
        ModificationEngine { config }
    }

    pub fn config(&self) -> &ModificationConfig {
        &self.config
    }

    /// Decide how the planned workout should change given today's readiness
    pub fn decide(
        &self,
        readiness: &CompositeReadiness,
        workout: &PlannedWorkout,
        methodology: Methodology,
    ) -> Result<WorkoutModification> {
        validate_workout(workout)?;

        let generic = ModificationLevel::from_tier(readiness.tier);
        let rules = rules_for(methodology, &self.config.methodology);
        let accepted = rules
            .evaluate(readiness, workout)
            .filter(|candidate| candidate.level > generic);

        let level = accepted.as_ref().map_or(generic, |o| o.level);
        if let Some(o) = &accepted {
            info!(
                workout = %workout.id,
                %methodology,
                rule = o.rule,
                from = %generic,
                to = %level,
                "methodology override tightened decision"
            );
        }

        let (modified, adjustments) = self.apply(level, readiness, workout);
        let reschedule = self.reschedule_for(level, workout);
        let suggestion = (level == ModificationLevel::Proceed && readiness.tier == ReadinessTier::Excellent)
            .then(|| "Readiness is excellent. If the session feels easy you can push slightly harder.".to_string());
        let reasoning = reasoning(readiness, workout, level, accepted.as_ref());

        debug!(
            workout = %workout.id,
            %level,
            adjustments = adjustments.len(),
            "workout modification decided"
        );

        Ok(WorkoutModification {
            workout_id: workout.id.clone(),
            date: workout.date,
            level,
            tier: readiness.tier,
            composite_score: readiness.score,
            methodology,
            original: workout.clone(),
            modified,
            adjustments,
            reasoning,
            reschedule,
            suggestion,
            override_rule: accepted.map(|o| o.rule.to_string()),
            low_confidence: readiness.is_low_confidence(),
        })
    }

    fn apply(
        &self,
        level: ModificationLevel,
        readiness: &CompositeReadiness,
        workout: &PlannedWorkout,
    ) -> (Option<PlannedWorkout>, Vec<Adjustment>) {
        let cfg = &self.config;
        let mut editor = WorkoutEditor::new(workout);

        match level {
            ModificationLevel::Cancel => return (None, vec![Adjustment::Cancelled]),
            ModificationLevel::Major => {
                if workout.workout_type.is_quality() {
                    editor.convert_to_easy();
                    editor.set_duration(workout.duration_minutes.min(cfg.major_easy_max_minutes));
                    editor.slow_pace(cfg.major_pace_slowdown_seconds);
                } else {
                    editor.set_duration(scale_count(workout.duration_minutes, cfg.major_easy_duration_factor));
                }
                editor.single_session();
            }
            ModificationLevel::Moderate => {
                let rule = cfg.rule_for(workout.workout_type);
                editor.cut_duration(rule.duration_cut);
                editor.slow_pace(rule.pace_slowdown_seconds);
                editor.cut_repetitions(rule.repetition_cut);
                editor.extend_recovery(rule.recovery_extension);
                editor.single_session();
            }
            ModificationLevel::Minor => {
                if !workout.workout_type.is_easy() {
                    let hrv_weakest = readiness
                        .weakest_factor()
                        .map_or(false, |f| f.factor == Factor::Hrv);
                    if !(hrv_weakest && editor.slow_pace(cfg.minor_pace_slowdown_seconds)) {
                        editor.cut_duration(cfg.minor_volume_cut);
                        editor.cut_repetitions(cfg.minor_volume_cut);
                    }
                }
            }
            ModificationLevel::Proceed => {}
        }

        let (modified, adjustments) = editor.finish();
        (Some(modified), adjustments)
    }

    fn reschedule_for(&self, level: ModificationLevel, workout: &PlannedWorkout) -> Option<RescheduleRecommendation> {
        let cfg = &self.config;
        let (wait, reassess, resume) = match level {
            ModificationLevel::Cancel => (
                cfg.cancel_min_wait_hours,
                Some(cfg.cancel_reassess_hours),
                cfg.cancel_resume_composite,
            ),
            ModificationLevel::Major if workout.workout_type.is_quality() => {
                (cfg.major_reschedule_wait_hours, None, cfg.major_resume_composite)
            }
            _ => return None,
        };

        let wait_days = i64::from(wait.div_ceil(24));
        Some(RescheduleRecommendation {
            min_wait_hours: wait,
            earliest_date: workout.date + Duration::days(wait_days),
            reassess_within_hours: reassess,
            resume_when_composite_at_least: resume,
        })
    }
}

fn reasoning(
    readiness: &CompositeReadiness,
    workout: &PlannedWorkout,
    level: ModificationLevel,
    applied: Option<&MethodologyOverride>,
) -> String {
    let mut parts = vec![format!(
        "Readiness {:.1}/10 ({}), decided by {}.",
        readiness.score, readiness.tier, readiness.decided_by
    )];
    if let Some(phase) = workout.phase {
        parts.push(format!("Session is part of a {} block.", phase));
    }

    if !readiness.red_flags.is_empty() {
        let messages: Vec<&str> = readiness.red_flags.iter().map(|f| f.message.as_str()).collect();
        parts.push(format!("Red flags: {}.", messages.join("; ")));
    }
    if !readiness.yellow_flags.is_empty() {
        let messages: Vec<&str> = readiness.yellow_flags.iter().map(|f| f.message.as_str()).collect();
        parts.push(format!("Yellow flags: {}.", messages.join("; ")));
    }
    if let Some(o) = applied {
        parts.push(format!("{} ({}).", o.reason, o.rule));
    }

    parts.push(match level {
        ModificationLevel::Cancel => "Rest today and reassess before the next hard session.".to_string(),
        ModificationLevel::Major => format!("The planned {} is replaced with a short easy session.", workout.workout_type),
        ModificationLevel::Moderate => format!("The planned {} is reduced in volume and intensity.", workout.workout_type),
        ModificationLevel::Minor if workout.workout_type.is_easy() => {
            "Easy sessions are run as planned at this readiness level.".to_string()
        }
        ModificationLevel::Minor => format!("The planned {} is eased slightly.", workout.workout_type),
        ModificationLevel::Proceed => "Proceed as planned.".to_string(),
    });

    if level >= ModificationLevel::Major
        && matches!(workout.importance, WorkoutImportance::Key | WorkoutImportance::Race)
    {
        parts.push("This is a key session: move it to a later day instead of dropping it.".to_string());
    }

    if readiness.is_low_confidence() {
        parts.push("Some readiness inputs had data-quality issues; treat this decision with caution.".to_string());
    }

    parts.join(" ")
}

fn validate_workout(workout: &PlannedWorkout) -> Result<()> {
    if workout.duration_minutes == 0 {
        return Err(ValidationError::OutOfRange {
            field: "duration_minutes".to_string(),
            value: 0.0,
            min: 1.0,
            max: f64::from(u32::MAX),
        }
        .into());
    }
    if workout.sessions == 0 {
        return Err(ValidationError::Invalid {
            reason: format!("workout {} has zero sessions", workout.id),
        }
        .into());
    }
    if let Some(pace) = workout.target_pace {
        if pace <= Decimal::ZERO {
            return Err(ValidationError::Invalid {
                reason: format!("workout {} has a non-positive target pace", workout.id),
            }
            .into());
        }
    }
    if let Some(intervals) = &workout.intervals {
        if intervals.repetitions == 0 {
            return Err(ValidationError::Invalid {
                reason: format!("workout {} has an interval set with zero repetitions", workout.id),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::test_support::readiness;
    use crate::models::{IntervalStructure, TrainingPhase};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
    }

    fn tempo() -> PlannedWorkout {
        let mut w = PlannedWorkout::new("tempo-1", date(), WorkoutType::Tempo, 60);
        w.target_pace = Some(dec!(4.50));
        w
    }

    fn intervals() -> PlannedWorkout {
        let mut w = PlannedWorkout::new("vo2-1", date(), WorkoutType::Vo2Max, 60);
        w.target_pace = Some(dec!(3.80));
        w.intervals = Some(IntervalStructure {
            repetitions: 6,
            work_minutes: dec!(3),
            recovery_seconds: 120,
        });
        w
    }

    #[test]
    fn test_tier_to_level() {
        assert_eq!(ModificationLevel::from_tier(ReadinessTier::Excellent), ModificationLevel::Proceed);
        assert_eq!(ModificationLevel::from_tier(ReadinessTier::Moderate), ModificationLevel::Minor);
        assert_eq!(ModificationLevel::from_tier(ReadinessTier::Suboptimal), ModificationLevel::Moderate);
        assert_eq!(ModificationLevel::from_tier(ReadinessTier::Poor), ModificationLevel::Major);
        assert_eq!(ModificationLevel::from_tier(ReadinessTier::Critical), ModificationLevel::Cancel);
    }

    #[test]
    fn test_cancel_on_critical() {
        let r = readiness(70.0, 10.0, 9.0, 0.9, 9.0);
        let decision = ModificationEngine::new().decide(&r, &tempo(), Methodology::Generic).unwrap();

        assert!(decision.is_cancelled());
        assert!(decision.modified.is_none());
        let reschedule = decision.reschedule.unwrap();
        assert_eq!(reschedule.min_wait_hours, 24);
        assert_eq!(reschedule.reassess_within_hours, Some(48));
        assert_eq!(reschedule.earliest_date, NaiveDate::from_ymd_opt(2024, 3, 13).unwrap());
    }

    #[test]
    fn test_major_converts_quality_to_easy() {
        let r = readiness(100.0, 0.0, 10.0, 1.8, 9.0);
        assert_eq!(r.tier, ReadinessTier::Poor);

        let decision = ModificationEngine::new().decide(&r, &intervals(), Methodology::Generic).unwrap();
        let modified = decision.modified.as_ref().unwrap();
        assert_eq!(decision.level, ModificationLevel::Major);
        assert_eq!(modified.workout_type, WorkoutType::Easy);
        assert_eq!(modified.duration_minutes, 30);
        assert_eq!(modified.target_pace, Some(dec!(4.80)));
        assert!(modified.intervals.is_none());
        assert!(decision.adjustments.contains(&Adjustment::IntervalsRemoved));
        assert_eq!(decision.reschedule.unwrap().min_wait_hours, 48);
    }

    #[test]
    fn test_major_shortens_easy_run() {
        let r = readiness(100.0, 0.0, 10.0, 1.8, 9.0);
        let easy = PlannedWorkout::new("easy-1", date(), WorkoutType::Easy, 50);
        let decision = ModificationEngine::new().decide(&r, &easy, Methodology::Generic).unwrap();

        assert_eq!(decision.modified.unwrap().duration_minutes, 30);
        assert!(decision.reschedule.is_none());
    }

    #[test]
    fn test_moderate_interval_reductions() {
        // three yellow flags
        let r = readiness(82.0, 4.0, 5.0, 0.9, 9.0);
        assert_eq!(r.tier, ReadinessTier::Suboptimal);

        let decision = ModificationEngine::new().decide(&r, &intervals(), Methodology::Generic).unwrap();
        let modified = decision.modified.unwrap();
        assert_eq!(decision.level, ModificationLevel::Moderate);
        assert_eq!(modified.duration_minutes, 45);
        assert_eq!(modified.target_pace, Some(dec!(3.88)));
        let set = modified.intervals.unwrap();
        assert_eq!(set.repetitions, 4);
        assert_eq!(set.recovery_seconds, 156);
    }

    #[test]
    fn test_moderate_tier_minor_changes_tempo_only() {
        let r = readiness(91.0, 2.5, 6.0, 0.7, 6.0);
        assert_eq!(r.tier, ReadinessTier::Moderate);
        let engine = ModificationEngine::new();

        let tempo_decision = engine.decide(&r, &tempo(), Methodology::Generic).unwrap();
        assert_eq!(tempo_decision.level, ModificationLevel::Minor);
        assert!(!tempo_decision.is_unchanged());

        let easy = PlannedWorkout::new("easy-1", date(), WorkoutType::Easy, 45);
        let easy_decision = engine.decide(&r, &easy, Methodology::Generic).unwrap();
        assert!(easy_decision.is_unchanged());
        assert_eq!(easy_decision.modified.unwrap(), easy);
    }

    #[test]
    fn test_minor_slows_pace_when_hrv_weakest() {
        // HRV 6, RHR 8, wellness 7, ACWR 8, sleep 8
        let r = readiness(86.0, 3.0, 7.0, 1.2, 7.0);
        assert_eq!(r.tier, ReadinessTier::Moderate);
        assert_eq!(r.weakest_factor().unwrap().factor, Factor::Hrv);

        let decision = ModificationEngine::new().decide(&r, &tempo(), Methodology::Generic).unwrap();
        assert_eq!(decision.adjustments, vec![Adjustment::PaceSlowed { seconds_per_km: 5 }]);
    }

    #[test]
    fn test_proceed_excellent_suggests_more() {
        let r = readiness(100.0, 0.0, 10.0, 0.9, 9.0);
        let decision = ModificationEngine::new().decide(&r, &tempo(), Methodology::Generic).unwrap();
        assert_eq!(decision.level, ModificationLevel::Proceed);
        assert!(decision.is_unchanged());
        assert!(decision.suggestion.is_some());
    }

    #[test]
    fn test_reasoning_mentions_phase() {
        let r = readiness(100.0, 0.0, 10.0, 1.8, 9.0);
        let mut workout = intervals();
        workout.phase = Some(TrainingPhase::Taper);
        workout.importance = WorkoutImportance::Key;

        let decision = ModificationEngine::new().decide(&r, &workout, Methodology::Generic).unwrap();
        assert!(decision.reasoning.contains("taper block"));
        assert!(decision.reasoning.contains("key session"));
        assert!(decision.reasoning.contains("one_red_flag"));
    }

    #[test]
    fn test_rejects_zero_duration() {
        let r = readiness(100.0, 0.0, 10.0, 0.9, 9.0);
        let workout = PlannedWorkout::new("bad", date(), WorkoutType::Easy, 0);
        assert!(ModificationEngine::new().decide(&r, &workout, Methodology::Generic).is_err());
    }
}
