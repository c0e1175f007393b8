//! Loading daily samples, planned workouts and readiness history from files

use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ReadinessError, Result};
use crate::models::{DailySample, PlannedWorkout, SampleLog};
use crate::trends::HistoryEntry;

pub mod csv;
pub mod json;

/// A file format that daily samples can be read from
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Read every sample in the file
    fn import_samples(&self, file_path: &Path) -> Result<Vec<DailySample>>;

    fn format_name(&self) -> &'static str;
}

/// Picks an importer by file extension
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat + Send + Sync>>,
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportManager {
    pub fn new() -> Self {
        Self {
            importers: vec![Box::new(csv::CsvImporter::new()), Box::new(json::JsonImporter)],
        }
    }

    /// Import samples from one file, auto-detecting the format
    pub fn import_samples(&self, file_path: &Path) -> Result<Vec<DailySample>> {
        let importer = self
            .importers
            .iter()
            .find(|i| i.can_import(file_path))
            .ok_or_else(|| import_error(file_path, "unsupported file type, expected .csv or .json"))?;

        debug!(file = %file_path.display(), format = importer.format_name(), "importing samples");
        let samples = importer.import_samples(file_path)?;
        info!(file = %file_path.display(), count = samples.len(), "samples imported");
        Ok(samples)
    }

    /// Import samples from several files into one log
    ///
    /// A second sample for the same athlete and day is rejected.
    pub fn import_log<P: AsRef<Path>>(&self, files: &[P]) -> Result<SampleLog> {
        let mut log = SampleLog::new();
        for file in files {
            for sample in self.import_samples(file.as_ref())? {
                log.append(sample)?;
            }
        }
        Ok(log)
    }
}

/// Load planned workouts from a JSON array
pub fn load_workouts(file_path: &Path) -> Result<Vec<PlannedWorkout>> {
    json::read_json(file_path)
}

/// Load readiness history from a JSON array
pub fn load_history(file_path: &Path) -> Result<Vec<HistoryEntry>> {
    json::read_json(file_path)
}

pub(crate) fn import_error(file_path: &Path, reason: impl Into<String>) -> ReadinessError {
    ReadinessError::Import {
        source_name: file_path.display().to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn has_extension(file_path: &Path, extension: &str) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

pub(crate) fn read_to_string(file_path: &Path) -> Result<String> {
    Ok(fs::read_to_string(file_path)?)
}
