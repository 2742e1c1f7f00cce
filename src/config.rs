//! User settings, persisted as JSON in the OS config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::LayoutMetrics;
use crate::error::Result;
use crate::model::ExtendPolicy;
use crate::store::DEFAULT_UNDO_DEPTH;

const APP_NAME: &str = "GanttPlanner";
const SETTINGS_FILE: &str = "settings.json";
const DATA_FILE: &str = "data.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    pub initial_days: u32,
    pub day_width: f32,
    pub min_day_width: f32,
    pub max_day_width: f32,
    pub zoom_step: f32,
    pub extend_threshold_px: f32,
    pub extend_chunk_days: u32,
    pub far_extend_chunk_days: u32,
    pub far_scroll_factor: f32,
    /// Day widths bound to the digit keys 1–5.
    pub timescale_presets: Vec<f32>,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            initial_days: 90,
            day_width: 96.0,
            min_day_width: 24.0,
            max_day_width: 160.0,
            zoom_step: 8.0,
            extend_threshold_px: 1000.0,
            extend_chunk_days: 30,
            far_extend_chunk_days: 90,
            far_scroll_factor: 3.0,
            timescale_presets: vec![24.0, 48.0, 96.0, 128.0, 160.0],
        }
    }
}

impl TimelineSettings {
    pub fn extend_policy(&self) -> ExtendPolicy {
        ExtendPolicy {
            threshold_px: self.extend_threshold_px,
            chunk_days: self.extend_chunk_days,
            far_chunk_days: self.far_extend_chunk_days,
            far_scroll_factor: self.far_scroll_factor,
        }
    }

    pub fn clamp_day_width(&self, width: f32) -> f32 {
        let lo = self.min_day_width.max(1.0);
        width.clamp(lo, self.max_day_width.max(lo))
    }

    pub fn preset(&self, index: usize) -> Option<f32> {
        self.timescale_presets
            .get(index)
            .map(|w| self.clamp_day_width(*w))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub lane_height: f32,
    pub row_padding: f32,
    pub handle_width: f32,
    pub header_height: f32,
    pub label_width: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            lane_height: 28.0,
            row_padding: 6.0,
            handle_width: 7.0,
            header_height: 44.0,
            label_width: 180.0,
        }
    }
}

impl LayoutSettings {
    pub fn metrics(&self) -> LayoutMetrics {
        LayoutMetrics {
            lane_height: self.lane_height.max(4.0),
            row_padding: self.row_padding.max(0.0),
            handle_width: self.handle_width.max(0.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub data_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub undo_depth: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            undo_depth: DEFAULT_UNDO_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    pub timeline: TimelineSettings,
    pub layout: LayoutSettings,
    pub storage: StorageSettings,
    pub history: HistorySettings,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

impl PlannerSettings {
    /// `settings.json` in the config directory, or the working directory
    /// when the platform has no home.
    pub fn default_path() -> PathBuf {
        project_dirs()
            .map(|d| d.config_dir().join(SETTINGS_FILE))
            .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
    }

    /// Where the dataset lives: the explicit override, else `data.json` in
    /// the data directory.
    pub fn data_path(&self) -> PathBuf {
        self.storage.data_path.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|d| d.data_dir().join(DATA_FILE))
                .unwrap_or_else(|| PathBuf::from(DATA_FILE))
        })
    }

    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    /// Missing or unreadable files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no settings file, using defaults");
                return Self::default();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "invalid settings file, using defaults");
            Self::default()
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
