use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::assessment::AssessmentConfig;
use crate::baseline::BaselineConfig;
use crate::composite::{CompositeConfig, ScoreTable};
use crate::error::ReadinessError;
use crate::logging::LogConfig;
use crate::modification::{ModificationConfig, ReductionRule};
use crate::models::Methodology;
use crate::trends::TrendConfig;
use crate::wellness::{QuestionId, WellnessConfig};

/// Every tunable threshold, grouped by component
///
/// Missing sections in a TOML file fall back to their defaults, so a config
/// file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Methodology used when a command does not name one
    pub default_methodology: Methodology,

    pub baseline: BaselineConfig,
    pub assessment: AssessmentConfig,
    pub wellness: WellnessConfig,
    pub composite: CompositeConfig,
    pub modification: ModificationConfig,
    pub trends: TrendConfig,
    pub logging: LogConfig,
}

impl ReadinessConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: ReadinessConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// `~/.readyrs/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".readyrs")
            .join("config.toml")
    }

    /// Load the file at `path` (or the default path), falling back to defaults
    /// when it does not exist. A file that exists but is invalid is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_config_path);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_file(&path)
    }

    /// Check internal consistency of thresholds
    pub fn validate(&self) -> std::result::Result<(), ReadinessError> {
        let b = &self.baseline;
        if b.min_valid_days == 0 || b.min_valid_days > b.window_days {
            return Err(invalid(format!(
                "baseline.min_valid_days ({}) must be between 1 and window_days ({})",
                b.min_valid_days, b.window_days
            )));
        }
        if !(0.0..=1.0).contains(&b.max_rejected_fraction) {
            return Err(invalid("baseline.max_rejected_fraction must be within 0-1"));
        }
        if !(b.normal_band_sd < b.yellow_band_sd && b.yellow_band_sd < b.red_band_sd) {
            return Err(invalid("baseline band multiples must increase: normal < yellow < red"));
        }

        let w = &self.wellness;
        for question in QuestionId::ALL {
            if w.weights.weight(question) <= 0.0 {
                return Err(invalid(format!("wellness weight for {} must be positive", question.key())));
            }
        }
        if !(w.excellent_min > w.good_min && w.good_min > w.moderate_min && w.moderate_min > w.poor_min) {
            return Err(invalid("wellness tier minimums must be descending"));
        }

        let c = &self.composite;
        let weights = [
            c.weights.hrv,
            c.weights.resting_hr,
            c.weights.wellness,
            c.weights.workload_ratio,
            c.weights.sleep,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(invalid("composite weights must be positive"));
        }
        check_table("composite.hrv_table", &c.hrv_table, Order::Descending)?;
        check_table("composite.sleep_table", &c.sleep_table, Order::Descending)?;
        check_table("composite.rhr_table", &c.rhr_table, Order::Ascending)?;
        if c.red_flag_max >= c.yellow_flag_max {
            return Err(invalid("composite.red_flag_max must be below yellow_flag_max"));
        }
        if !(c.excellent_min > c.good_min && c.good_min > c.moderate_min && c.moderate_min > c.suboptimal_min) {
            return Err(invalid("composite tier minimums must be descending"));
        }

        let m = &self.modification;
        for (name, rule) in [
            ("threshold_rule", &m.threshold_rule),
            ("vo2max_rule", &m.vo2max_rule),
            ("long_run_rule", &m.long_run_rule),
            ("easy_rule", &m.easy_rule),
        ] {
            check_rule(name, rule)?;
        }
        if !(0.0..1.0).contains(&m.minor_volume_cut) {
            return Err(invalid("modification.minor_volume_cut must be within 0-1"));
        }

        let t = &self.trends;
        if t.min_history_days == 0 || t.min_history_days > t.max_history_days {
            return Err(invalid("trends.min_history_days must be between 1 and max_history_days"));
        }

        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ReadinessError {
    ReadinessError::Configuration(reason.into())
}

enum Order {
    Ascending,
    Descending,
}

fn check_table(name: &str, table: &ScoreTable, order: Order) -> std::result::Result<(), ReadinessError> {
    let ordered = table.steps.windows(2).all(|pair| match order {
        Order::Descending => pair[0].0 > pair[1].0,
        Order::Ascending => pair[0].0 < pair[1].0,
    });
    if !ordered {
        return Err(invalid(format!("{} boundaries are out of order", name)));
    }
    if table
        .steps
        .iter()
        .any(|(_, score)| !(0.0..=10.0).contains(score))
    {
        return Err(invalid(format!("{} scores must be within 0-10", name)));
    }
    Ok(())
}

fn check_rule(name: &str, rule: &ReductionRule) -> std::result::Result<(), ReadinessError> {
    let fractions = [rule.duration_cut, rule.repetition_cut];
    if fractions.iter().any(|f| !(0.0..1.0).contains(f)) || rule.recovery_extension < 0.0 {
        return Err(invalid(format!("modification.{} has an out-of-range fraction", name)));
    }
    Ok(())
}
