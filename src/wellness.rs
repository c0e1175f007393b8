//! Morning wellness questionnaire scoring
//!
//! Seven fixed questions, each with a weight and a category. Answers are
//! 1-10 integers except sleep hours, which are converted to the same scale
//! with a step function. Inverted questions (soreness, stress) are asked so
//! that 10 is the worst answer and are flipped before weighting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::error::{Result, ValidationError};
use crate::models::FlagLevel;
use crate::quality::DataQualityWarning;

/// Questionnaire answers keyed by question identifier
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WellnessResponse {
    pub answers: BTreeMap<String, f64>,
}

impl WellnessResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, question: QuestionId, value: f64) -> Self {
        self.answers.insert(question.key().to_string(), value);
        self
    }

    pub fn get(&self, question: QuestionId) -> Option<f64> {
        self.answers.get(question.key()).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionId {
    SleepQuality,
    SleepHours,
    MuscleSoreness,
    Energy,
    /// 10 = pain free
    InjuryPain,
    Stress,
    Motivation,
}

impl QuestionId {
    pub const ALL: [QuestionId; 7] = [
        QuestionId::SleepQuality,
        QuestionId::SleepHours,
        QuestionId::MuscleSoreness,
        QuestionId::Energy,
        QuestionId::InjuryPain,
        QuestionId::Stress,
        QuestionId::Motivation,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            QuestionId::SleepQuality => "sleep_quality",
            QuestionId::SleepHours => "sleep_hours",
            QuestionId::MuscleSoreness => "muscle_soreness",
            QuestionId::Energy => "energy",
            QuestionId::InjuryPain => "injury_pain",
            QuestionId::Stress => "stress",
            QuestionId::Motivation => "motivation",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.key() == key)
    }

    pub fn category(&self) -> Category {
        match self {
            QuestionId::SleepQuality | QuestionId::SleepHours => Category::Recovery,
            QuestionId::MuscleSoreness | QuestionId::Energy | QuestionId::InjuryPain => Category::Physical,
            QuestionId::Stress => Category::Psychological,
            QuestionId::Motivation => Category::Readiness,
        }
    }

    pub fn scale(&self) -> Scale {
        match self {
            QuestionId::SleepHours => Scale::SleepHours,
            QuestionId::MuscleSoreness | QuestionId::Stress => Scale::Inverted,
            _ => Scale::OneToTen,
        }
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Recovery,
    Physical,
    Psychological,
    Readiness,
}

/// How an answer maps onto the 1-10 score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    OneToTen,
    /// 10 is the worst answer
    Inverted,
    /// Hours slept, converted with [`sleep_hours_score`]
    SleepHours,
}

/// Per-question weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionWeights {
    pub sleep_quality: f64,
    pub sleep_hours: f64,
    pub muscle_soreness: f64,
    pub energy: f64,
    pub injury_pain: f64,
    pub stress: f64,
    pub motivation: f64,
}

impl QuestionWeights {
    pub fn weight(&self, question: QuestionId) -> f64 {
        match question {
            QuestionId::SleepQuality => self.sleep_quality,
            QuestionId::SleepHours => self.sleep_hours,
            QuestionId::MuscleSoreness => self.muscle_soreness,
            QuestionId::Energy => self.energy,
            QuestionId::InjuryPain => self.injury_pain,
            QuestionId::Stress => self.stress,
            QuestionId::Motivation => self.motivation,
        }
    }
}

impl Default for QuestionWeights {
    fn default() -> Self {
        QuestionWeights {
            sleep_quality: 1.5,
            sleep_hours: 1.0,
            muscle_soreness: 1.25,
            energy: 1.25,
            injury_pain: 1.5,
            stress: 1.0,
            motivation: 1.0,
        }
    }
}

/// Wellness scoring settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WellnessConfig {
    pub weights: QuestionWeights,

    /// Lower bounds of the Excellent, Good, Moderate and Poor tiers
    pub excellent_min: f64,
    pub good_min: f64,
    pub moderate_min: f64,
    pub poor_min: f64,

    /// Injury/pain scores below these raise a yellow and red flag
    pub pain_flag_below: f64,
    pub pain_red_flag_below: f64,

    /// Sleep quality below this raises a flag
    pub sleep_quality_flag_below: f64,
}

impl Default for WellnessConfig {
    fn default() -> Self {
        WellnessConfig {
            weights: QuestionWeights::default(),
            excellent_min: 8.5,
            good_min: 7.0,
            moderate_min: 5.5,
            poor_min: 4.5,
            pain_flag_below: 7.0,
            pain_red_flag_below: 5.0,
            sleep_quality_flag_below: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellnessTier {
    Excellent,
    Good,
    Moderate,
    Poor,
    VeryPoor,
}

impl WellnessTier {
    pub fn from_score(score: f64, config: &WellnessConfig) -> Self {
        if score >= config.excellent_min {
            WellnessTier::Excellent
        } else if score >= config.good_min {
            WellnessTier::Good
        } else if score >= config.moderate_min {
            WellnessTier::Moderate
        } else if score >= config.poor_min {
            WellnessTier::Poor
        } else {
            WellnessTier::VeryPoor
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            WellnessTier::Excellent => "Feeling great. Train as planned.",
            WellnessTier::Good => "Good readiness. Proceed with planned training.",
            WellnessTier::Moderate => "Some fatigue present. Keep intensity controlled.",
            WellnessTier::Poor => "Significant fatigue. Favour easy aerobic work.",
            WellnessTier::VeryPoor => "Very poor wellness. Rest or active recovery only.",
        }
    }
}

/// A questionnaire answer that needs attention regardless of the composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalFlag {
    pub question: QuestionId,
    pub level: FlagLevel,
    pub score: f64,
    pub message: String,
}

/// Scored questionnaire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessScore {
    /// Weighted composite on the 1-10 scale, rounded to two decimals
    pub composite: f64,
    pub tier: WellnessTier,
    pub recommendation: String,
    pub item_scores: BTreeMap<QuestionId, f64>,
    pub category_scores: BTreeMap<Category, f64>,
    pub critical_flags: Vec<CriticalFlag>,
    pub warnings: Vec<DataQualityWarning>,
}

impl WellnessScore {
    pub fn has_red_flag(&self) -> bool {
        self.critical_flags.iter().any(|f| f.level == FlagLevel::Red)
    }
}

/// Convert hours slept to the 1-10 scale
pub fn sleep_hours_score(hours: f64) -> f64 {
    const STEPS: [(f64, f64); 9] = [
        (9.0, 10.0),
        (8.0, 9.0),
        (7.5, 8.0),
        (7.0, 7.0),
        (6.5, 6.0),
        (6.0, 5.0),
        (5.5, 4.0),
        (5.0, 3.0),
        (4.0, 2.0),
    ];
    STEPS
        .iter()
        .find(|(min_hours, _)| hours >= *min_hours)
        .map(|(_, score)| *score)
        .unwrap_or(1.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default)]
pub struct WellnessScorer {
    config: WellnessConfig,
}

impl WellnessScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WellnessConfig) -> Self {
        WellnessScorer { config }
    }

    pub fn score(&self, response: &WellnessResponse) -> Result<WellnessScore> {
        let cfg = &self.config;

        for key in response.answers.keys() {
            if QuestionId::from_key(key).is_none() {
                return Err(ValidationError::Unknown { field: key.clone() }.into());
            }
        }

        let mut item_scores = BTreeMap::new();
        let mut raw_scaled = Vec::new();
        for question in QuestionId::ALL {
            let raw = response.get(question).ok_or_else(|| ValidationError::Missing {
                field: question.key().to_string(),
            })?;
            let score = Self::item_score(question, raw)?;
            if question.scale() != Scale::SleepHours {
                raw_scaled.push(raw);
            }
            item_scores.insert(question, score);
        }

        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        let mut categories: BTreeMap<Category, (f64, f64)> = BTreeMap::new();
        for (question, score) in &item_scores {
            let weight = cfg.weights.weight(*question);
            weighted += weight * score;
            total_weight += weight;
            let entry = categories.entry(question.category()).or_insert((0.0, 0.0));
            entry.0 += weight * score;
            entry.1 += weight;
        }
        if total_weight <= 0.0 {
            return Err(ValidationError::Invalid {
                reason: "wellness weights sum to zero".to_string(),
            }
            .into());
        }

        let composite = round2(weighted / total_weight);
        let category_scores = categories
            .into_iter()
            .filter(|(_, (_, w))| *w > 0.0)
            .map(|(category, (sum, w))| (category, round2(sum / w)))
            .collect();

        let critical_flags = self.critical_flags(&item_scores);

        let mut warnings = Vec::new();
        if let Some(first) = raw_scaled.first() {
            if raw_scaled.iter().all(|v| v == first) {
                warnings.push(DataQualityWarning::IdenticalResponses { value: *first });
            }
        }

        let tier = WellnessTier::from_score(composite, cfg);
        debug!(composite, ?tier, flags = critical_flags.len(), "wellness scored");

        Ok(WellnessScore {
            composite,
            tier,
            recommendation: tier.recommendation().to_string(),
            item_scores,
            category_scores,
            critical_flags,
            warnings,
        })
    }

    fn item_score(question: QuestionId, raw: f64) -> Result<f64> {
        let field = question.key().to_string();
        if !raw.is_finite() {
            return Err(ValidationError::NonFinite { field }.into());
        }
        match question.scale() {
            Scale::SleepHours => {
                if !(0.0..=24.0).contains(&raw) {
                    return Err(ValidationError::OutOfRange {
                        field,
                        value: raw,
                        min: 0.0,
                        max: 24.0,
                    }
                    .into());
                }
                Ok(sleep_hours_score(raw))
            }
            scale => {
                if raw.fract() != 0.0 {
                    return Err(ValidationError::NotInteger { field, value: raw }.into());
                }
                if !(1.0..=10.0).contains(&raw) {
                    return Err(ValidationError::OutOfRange {
                        field,
                        value: raw,
                        min: 1.0,
                        max: 10.0,
                    }
                    .into());
                }
                Ok(if scale == Scale::Inverted { 11.0 - raw } else { raw })
            }
        }
    }

    fn critical_flags(&self, item_scores: &BTreeMap<QuestionId, f64>) -> Vec<CriticalFlag> {
        let cfg = &self.config;
        let mut flags = Vec::new();

        if let Some(&pain) = item_scores.get(&QuestionId::InjuryPain) {
            if pain < cfg.pain_flag_below {
                let level = if pain < cfg.pain_red_flag_below {
                    FlagLevel::Red
                } else {
                    FlagLevel::Yellow
                };
                flags.push(CriticalFlag {
                    question: QuestionId::InjuryPain,
                    level,
                    score: pain,
                    message: format!("Injury or pain reported ({}/10). Assess before training.", pain),
                });
            }
        }

        if let Some(&sleep) = item_scores.get(&QuestionId::SleepQuality) {
            if sleep < cfg.sleep_quality_flag_below {
                flags.push(CriticalFlag {
                    question: QuestionId::SleepQuality,
                    level: FlagLevel::Yellow,
                    score: sleep,
                    message: format!("Very poor sleep quality ({}/10).", sleep),
                });
            }
        }

        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadinessError;

    fn response(sq: f64, hours: f64, soreness: f64, energy: f64, pain: f64, stress: f64, motivation: f64) -> WellnessResponse {
        WellnessResponse::new()
            .with(QuestionId::SleepQuality, sq)
            .with(QuestionId::SleepHours, hours)
            .with(QuestionId::MuscleSoreness, soreness)
            .with(QuestionId::Energy, energy)
            .with(QuestionId::InjuryPain, pain)
            .with(QuestionId::Stress, stress)
            .with(QuestionId::Motivation, motivation)
    }

    #[test]
    fn test_excellent_response() {
        let score = WellnessScorer::new()
            .score(&response(9.0, 8.0, 2.0, 9.0, 9.0, 2.0, 9.0))
            .unwrap();
        assert_eq!(score.composite, 9.0);
        assert_eq!(score.tier, WellnessTier::Excellent);
        assert!(score.critical_flags.is_empty());
        assert_eq!(score.category_scores[&Category::Physical], 9.0);
    }

    #[test]
    fn test_exact_excellent_boundary() {
        // 72.25 weighted points over 8.5 total weight
        let score = WellnessScorer::new()
            .score(&response(9.0, 6.5, 2.0, 8.0, 9.0, 2.0, 9.0))
            .unwrap();
        assert_eq!(score.composite, 8.5);
        assert_eq!(score.tier, WellnessTier::Excellent);
    }

    #[test]
    fn test_tier_breakpoints() {
        let cfg = WellnessConfig::default();
        assert_eq!(WellnessTier::from_score(8.5, &cfg), WellnessTier::Excellent);
        assert_eq!(WellnessTier::from_score(8.49, &cfg), WellnessTier::Good);
        assert_eq!(WellnessTier::from_score(7.0, &cfg), WellnessTier::Good);
        assert_eq!(WellnessTier::from_score(5.5, &cfg), WellnessTier::Moderate);
        assert_eq!(WellnessTier::from_score(4.5, &cfg), WellnessTier::Poor);
        assert_eq!(WellnessTier::from_score(4.49, &cfg), WellnessTier::VeryPoor);
    }

    #[test]
    fn test_inverted_questions() {
        let score = WellnessScorer::new()
            .score(&response(5.0, 7.0, 10.0, 5.0, 8.0, 1.0, 5.0))
            .unwrap();
        assert_eq!(score.item_scores[&QuestionId::MuscleSoreness], 1.0);
        assert_eq!(score.item_scores[&QuestionId::Stress], 10.0);
        assert_eq!(score.item_scores[&QuestionId::SleepHours], 7.0);
    }

    #[test]
    fn test_pain_flags() {
        let yellow = WellnessScorer::new()
            .score(&response(8.0, 8.0, 3.0, 8.0, 6.0, 3.0, 8.0))
            .unwrap();
        assert_eq!(yellow.critical_flags.len(), 1);
        assert_eq!(yellow.critical_flags[0].level, FlagLevel::Yellow);

        let red = WellnessScorer::new()
            .score(&response(8.0, 8.0, 3.0, 8.0, 4.0, 3.0, 8.0))
            .unwrap();
        assert!(red.has_red_flag());
    }

    #[test]
    fn test_sleep_quality_flag_independent_of_composite() {
        let score = WellnessScorer::new()
            .score(&response(3.0, 9.0, 1.0, 10.0, 10.0, 1.0, 10.0))
            .unwrap();
        assert_eq!(score.tier, WellnessTier::Excellent);
        assert_eq!(score.critical_flags.len(), 1);
        assert_eq!(score.critical_flags[0].question, QuestionId::SleepQuality);
    }

    #[test]
    fn test_sleep_hours_steps() {
        assert_eq!(sleep_hours_score(9.5), 10.0);
        assert_eq!(sleep_hours_score(7.5), 8.0);
        assert_eq!(sleep_hours_score(7.49), 7.0);
        assert_eq!(sleep_hours_score(4.0), 2.0);
        assert_eq!(sleep_hours_score(2.0), 1.0);
    }

    #[test]
    fn test_validation_errors() {
        let scorer = WellnessScorer::new();

        let out_of_range = response(11.0, 8.0, 3.0, 8.0, 8.0, 3.0, 8.0);
        assert!(matches!(
            scorer.score(&out_of_range),
            Err(ReadinessError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let fractional = response(7.5, 8.0, 3.0, 8.0, 8.0, 3.0, 8.0);
        assert!(matches!(
            scorer.score(&fractional),
            Err(ReadinessError::Validation(ValidationError::NotInteger { .. }))
        ));

        let mut missing = response(7.0, 8.0, 3.0, 8.0, 8.0, 3.0, 8.0);
        missing.answers.remove("energy");
        assert!(matches!(
            scorer.score(&missing),
            Err(ReadinessError::Validation(ValidationError::Missing { .. }))
        ));

        let unknown = response(7.0, 8.0, 3.0, 8.0, 8.0, 3.0, 8.0).with_key("mood", 5.0);
        assert!(matches!(
            scorer.score(&unknown),
            Err(ReadinessError::Validation(ValidationError::Unknown { .. }))
        ));

        let too_long = response(7.0, 30.0, 3.0, 8.0, 8.0, 3.0, 8.0);
        assert!(scorer.score(&too_long).is_err());
    }

    #[test]
    fn test_identical_responses_warning() {
        let score = WellnessScorer::new()
            .score(&response(5.0, 7.0, 5.0, 5.0, 5.0, 5.0, 5.0))
            .unwrap();
        assert_eq!(score.warnings, vec![DataQualityWarning::IdenticalResponses { value: 5.0 }]);
    }

    #[test]
    fn test_deserializes_from_flat_map() {
        let json = r#"{"sleep_quality": 7, "sleep_hours": 7.5, "muscle_soreness": 4,
            "energy": 7, "injury_pain": 10, "stress": 3, "motivation": 8}"#;
        let parsed: WellnessResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.get(QuestionId::SleepHours), Some(7.5));
        assert!(WellnessScorer::new().score(&parsed).is_ok());
    }

    impl WellnessResponse {
        fn with_key(mut self, key: &str, value: f64) -> Self {
            self.answers.insert(key.to_string(), value);
            self
        }
    }
}
