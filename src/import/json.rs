use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::Result;
use crate::import::{has_extension, import_error, read_to_string, ImportFormat};
use crate::models::DailySample;

/// Samples as a JSON array of `DailySample` objects
pub struct JsonImporter;

impl ImportFormat for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    fn import_samples(&self, file_path: &Path) -> Result<Vec<DailySample>> {
        read_json(file_path)
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let content = read_to_string(file_path)?;
    serde_json::from_str(&content).map_err(|e| import_error(file_path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SampleQuality;
    use crate::wellness::QuestionId;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_samples_with_wellness() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("samples.json");
        fs::write(
            &path,
            r#"[
                {"athlete_id": "ana", "date": "2024-01-05", "hrv_rmssd": 58.0, "resting_hr": 48.0,
                 "wellness": {"sleep_quality": 8, "injury_pain": 9}},
                {"athlete_id": "ana", "date": "2024-01-06", "quality": "poor"}
            ]"#,
        )
        .unwrap();

        let samples = JsonImporter.import_samples(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].wellness.as_ref().unwrap().get(QuestionId::InjuryPain), Some(9.0));
        assert_eq!(samples[1].quality, SampleQuality::Poor);
        assert_eq!(samples[1].hrv_rmssd, None);
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("samples.json");
        fs::write(&path, "[{").unwrap();
        assert!(JsonImporter.import_samples(&path).is_err());
    }
}
