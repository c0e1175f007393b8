use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;
use crate::import::{has_extension, import_error, ImportFormat};
use crate::models::{DailySample, SampleQuality};
use crate::wellness::{QuestionId, WellnessResponse};

/// CSV importer with flexible column mapping
///
/// One row per athlete and day. Wellness answers live in columns named after
/// the question keys; the `sleep_hours` column feeds both the sample and the
/// questionnaire.
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        Self::add_mapping(&mut column_mapping, "athlete_id", &["athlete_id", "athlete", "athlete_name", "user"]);
        Self::add_mapping(&mut column_mapping, "date", &["date", "day", "measured_on"]);
        Self::add_mapping(&mut column_mapping, "hrv_rmssd", &["hrv_rmssd", "hrv", "rmssd", "hrv_ms"]);
        Self::add_mapping(
            &mut column_mapping,
            "resting_hr",
            &["resting_hr", "rhr", "resting_heart_rate", "morning_hr"],
        );
        Self::add_mapping(&mut column_mapping, "sleep_hours", &["sleep_hours", "sleep", "sleep_duration"]);
        Self::add_mapping(&mut column_mapping, "quality", &["quality", "data_quality", "sample_quality"]);
        Self::add_mapping(
            &mut column_mapping,
            "hrv_artifact_percent",
            &["hrv_artifact_percent", "artifacts", "artifact_percent", "artifact_pct"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "hrv_duration_seconds",
            &["hrv_duration_seconds", "measurement_duration", "recording_seconds"],
        );
        Self::add_mapping(&mut column_mapping, "muscle_soreness", &["muscle_soreness", "soreness"]);
        Self::add_mapping(&mut column_mapping, "injury_pain", &["injury_pain", "pain"]);
        Self::add_mapping(&mut column_mapping, "sleep_quality", &["sleep_quality"]);
        Self::add_mapping(&mut column_mapping, "energy", &["energy"]);
        Self::add_mapping(&mut column_mapping, "stress", &["stress"]);
        Self::add_mapping(&mut column_mapping, "motivation", &["motivation"]);

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    fn parse_date(value: &str) -> Option<NaiveDate> {
        ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"]
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
    }

    fn parse_quality(value: &str) -> Option<SampleQuality> {
        match value.to_lowercase().as_str() {
            "good" | "ok" => Some(SampleQuality::Good),
            "fair" => Some(SampleQuality::Fair),
            "poor" | "bad" => Some(SampleQuality::Poor),
            _ => None,
        }
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_samples(&self, file_path: &Path) -> Result<Vec<DailySample>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(file_path)
            .map_err(|e| import_error(file_path, e.to_string()))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| import_error(file_path, e.to_string()))?
            .iter()
            .map(|h| self.normalize_column_name(h))
            .collect();

        for required in ["athlete_id", "date"] {
            if !headers.iter().any(|h| h == required) {
                return Err(import_error(file_path, format!("missing required column '{}'", required)));
            }
        }

        let mut samples = Vec::new();
        for (index, result) in reader.records().enumerate() {
            // header is line 1
            let line = index + 2;
            let record = result.map_err(|e| import_error(file_path, e.to_string()))?;
            let bad_value = |column: &str, value: &str| {
                import_error(file_path, format!("line {}: invalid {} '{}'", line, column, value))
            };

            let mut athlete_id = None;
            let mut date = None;
            let mut fields: Vec<(&str, &str)> = Vec::new();
            for (column, value) in headers.iter().zip(record.iter()) {
                if value.is_empty() {
                    continue;
                }
                match column.as_str() {
                    "athlete_id" => athlete_id = Some(value.to_string()),
                    "date" => date = Some(Self::parse_date(value).ok_or_else(|| bad_value("date", value))?),
                    _ => fields.push((column.as_str(), value)),
                }
            }

            let (Some(athlete_id), Some(date)) = (athlete_id, date) else {
                return Err(import_error(file_path, format!("line {}: athlete and date are required", line)));
            };

            let mut sample = DailySample::new(athlete_id, date);
            let mut answers = WellnessResponse::new();
            let number = |column: &str, value: &str| value.parse::<f64>().map_err(|_| bad_value(column, value));

            for (column, value) in fields {
                match column {
                    "hrv_rmssd" => sample.hrv_rmssd = Some(number(column, value)?),
                    "resting_hr" => sample.resting_hr = Some(number(column, value)?),
                    "sleep_hours" => sample.sleep_hours = Some(number(column, value)?),
                    "hrv_artifact_percent" => sample.hrv_artifact_percent = Some(number(column, value)?),
                    "hrv_duration_seconds" => {
                        sample.hrv_duration_seconds = Some(value.parse().map_err(|_| bad_value(column, value))?)
                    }
                    "quality" => {
                        sample.quality = Self::parse_quality(value).ok_or_else(|| bad_value(column, value))?
                    }
                    other => {
                        // Unknown columns are ignored
                        if let Some(question) = QuestionId::from_key(other) {
                            answers = answers.with(question, number(column, value)?);
                        }
                    }
                }
            }

            if !answers.answers.is_empty() {
                if let Some(hours) = sample.sleep_hours {
                    answers = answers.with(QuestionId::SleepHours, hours);
                }
                sample.wellness = Some(answers);
            }
            samples.push(sample);
        }

        if samples.is_empty() {
            return Err(import_error(file_path, "no samples found"));
        }
        Ok(samples)
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}
