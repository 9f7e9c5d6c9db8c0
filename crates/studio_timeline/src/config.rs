// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration, stored as RON.

use crate::error::Result;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::project::Resolution;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for a [`TimelineEngine`](crate::TimelineEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum history entries kept
    pub history_capacity: usize,
    /// Viewport width in pixels assumed by zoom-to-fit and zoom-to-selection
    pub viewport_width: f64,
    /// Pixels per second at zoom 1
    pub base_pixels_per_second: f64,
    /// Gap in seconds between an element and its duplicate
    pub duplicate_gap: f64,
    /// Duration of new projects in seconds
    pub default_duration: f64,
    /// Frame rate of new projects
    pub default_fps: f64,
    /// Resolution of new projects
    pub default_resolution: Resolution,
    /// Actor recorded on history entries
    pub actor_id: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            viewport_width: 1200.0,
            base_pixels_per_second: 100.0,
            duplicate_gap: 0.1,
            default_duration: 60.0,
            default_fps: 30.0,
            default_resolution: Resolution::default(),
            actor_id: "local".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse from a RON string
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: EngineConfig = ron::from_str(content)?;
        Ok(config.normalized())
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Save to a RON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Coerce out-of-range values
    pub fn normalized(mut self) -> Self {
        self.history_capacity = self.history_capacity.max(1);
        if !(self.base_pixels_per_second.is_finite() && self.base_pixels_per_second > 0.0) {
            self.base_pixels_per_second = 100.0;
        }
        if !(self.viewport_width.is_finite() && self.viewport_width > 0.0) {
            self.viewport_width = 1200.0;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.viewport_width, 1200.0);
        assert_eq!(config.actor_id, "local");
    }

    #[test]
    fn test_partial_ron() {
        let config = EngineConfig::from_ron_str("(history_capacity: 0, actor_id: \"ann\")").unwrap();
        assert_eq!(config.history_capacity, 1);
        assert_eq!(config.actor_id, "ann");
        assert_eq!(config.duplicate_gap, 0.1);
    }

    #[test]
    fn test_bad_ron() {
        assert!(EngineConfig::from_ron_str("(history_capacity: \"x\")").is_err());
    }

    #[test]
    fn test_save_load() {
        let path = std::env::temp_dir().join(format!("engine-{}.ron", uuid::Uuid::new_v4()));
        let config = EngineConfig {
            history_capacity: 12,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
