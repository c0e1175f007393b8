// Library interface for readyrs
// Integration tests and the CLI use the same public API

pub mod assessment;
pub mod baseline;
pub mod composite;
pub mod config;
pub mod error;
pub mod import;
pub mod logging;
pub mod methodology;
pub mod models;
pub mod modification;
pub mod pipeline;
pub mod quality;
pub mod trends;
pub mod wellness;

// Re-export commonly used types for convenience
pub use models::*;
pub use assessment::{DailyAssessment, DailyMetricAssessor, DeviationStatus, RecommendedAction, TrendDirection};
pub use baseline::{Baseline, BaselineEstimator, BaselineRegistry, ThresholdBands};
pub use composite::{CompositeReadiness, ReadinessAggregator, ReadinessInputs, ReadinessTier};
pub use config::ReadinessConfig;
pub use error::{ReadinessError, Result, ValidationError};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use methodology::{rules_for, MethodologyRules};
pub use modification::{ModificationEngine, ModificationLevel, WorkoutModification};
pub use pipeline::{DailyReadiness, HistoryReplay, ReadinessPipeline, SkippedDay};
pub use quality::DataQualityWarning;
pub use trends::{HistoryEntry, Severity, TrendAnalyzer, TrendWarningReport};
pub use wellness::{QuestionId, WellnessResponse, WellnessScore, WellnessScorer};
