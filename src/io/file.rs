use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::engine::DependencyGraph;
use crate::error::{PlannerError, Result};
use crate::model::Dataset;

/// Where the dataset comes from and goes to.
pub trait PlannerStorage {
    fn load(&self) -> Result<Dataset>;
    fn save(&self, dataset: &Dataset) -> Result<()>;
}

/// Pretty-printed JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Like [`PlannerStorage::load`], but a missing file is `Ok(None)`.
    /// Every other failure, including a corrupt or cyclic file, is an error.
    pub fn load_existing(&self) -> Result<Option<Dataset>> {
        match self.load() {
            Ok(dataset) => Ok(Some(dataset)),
            Err(PlannerError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl PlannerStorage for JsonFileStorage {
    /// Read and validate. A dependency cycle fails the load.
    fn load(&self) -> Result<Dataset> {
        let json = std::fs::read_to_string(&self.path)?;
        let mut dataset: Dataset = serde_json::from_str(&json)?;
        DependencyGraph::from_dataset(&dataset).check_acyclic()?;
        dataset.normalize();
        info!(
            path = %self.path.display(),
            assignments = dataset.assignments.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    fn save(&self, dataset: &Dataset) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(dataset)?;
        std::fs::write(&self.path, json)?;
        info!(path = %self.path.display(), "dataset saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Assignment, Dependency};
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("plans").join("data.json"));
        let dataset = Dataset::sample(d(6));
        storage.save(&dataset).unwrap();
        let loaded = storage.load().unwrap();
        assert_eq!(loaded.assignments.len(), dataset.assignments.len());
        assert_eq!(loaded.edges(), dataset.edges());
    }

    #[test]
    fn test_load_fills_defaults_and_clamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"{ "assignments": [
                { "id": "x", "resourceId": "r", "projectId": "p",
                  "start": "2025-01-09", "end": "2025-01-02" }
            ] }"#,
        )
        .unwrap();
        let loaded = JsonFileStorage::new(&path).load().unwrap();
        let a = &loaded.assignments[0];
        assert_eq!((a.start, a.end), (d(9), d(9)));
        assert_eq!(a.progress, 0);
        assert!(loaded.resources.is_empty());
    }

    #[test]
    fn test_cyclic_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("data.json"));
        let mut a = Assignment::new("r".into(), "p".into(), d(1), d(2)).with_id("a");
        let mut b = Assignment::new("r".into(), "p".into(), d(3), d(4)).with_id("b");
        a.dependencies
            .push(Dependency::finish_to_start("b".into(), "a".into()));
        b.dependencies
            .push(Dependency::finish_to_start("a".into(), "b".into()));
        storage
            .save(&Dataset {
                assignments: vec![a, b],
                ..Dataset::default()
            })
            .unwrap();
        assert!(matches!(
            storage.load(),
            Err(PlannerError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("absent.json"));
        assert!(matches!(storage.load(), Err(PlannerError::Io(_))));
    }

    #[test]
    fn test_load_existing_separates_missing_from_broken() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("data.json"));
        assert!(storage.load_existing().unwrap().is_none());

        std::fs::write(storage.path(), "{ not json").unwrap();
        assert!(matches!(
            storage.load_existing(),
            Err(PlannerError::Json(_))
        ));
    }
}
