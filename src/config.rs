//! Editor configuration loaded from `config.json`.

use crate::constants::{
    DEFAULT_CONTAINER_HEIGHT, DEFAULT_CONTAINER_WIDTH, DEFAULT_DEBOUNCE, DEFAULT_GRID_SIZE,
    MAX_DEBOUNCE, MIN_WIDGET_HEIGHT, MIN_WIDGET_WIDTH,
};
use crate::error::ConfigError;
use crate::widget::Size;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub grid_size: i32,
    pub min_width: i32,
    pub min_height: i32,
    pub debounce_ms: u64,
    pub container_width: i32,
    pub container_height: i32,
    /// Where page documents live; the platform data dir when unset.
    pub data_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            min_width: MIN_WIDGET_WIDTH,
            min_height: MIN_WIDGET_HEIGHT,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            container_width: DEFAULT_CONTAINER_WIDTH,
            container_height: DEFAULT_CONTAINER_HEIGHT,
            data_dir: None,
        }
    }
}

impl EditorConfig {
    /// Reads the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        Ok(config.sanitized())
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Replaces nonsensical values with defaults instead of rejecting the file.
    ///
    /// The grid never exceeds the container's shorter side and the debounce is
    /// capped at [`MAX_DEBOUNCE`].
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.min_width <= 0 {
            self.min_width = defaults.min_width;
        }
        if self.min_height <= 0 {
            self.min_height = defaults.min_height;
        }
        if self.container_width <= 0 {
            self.container_width = defaults.container_width;
        }
        if self.container_height <= 0 {
            self.container_height = defaults.container_height;
        }
        if self.grid_size < 0 {
            self.grid_size = defaults.grid_size;
        }
        self.grid_size = self
            .grid_size
            .min(self.container_width.min(self.container_height));
        self.debounce_ms = self.debounce_ms.min(MAX_DEBOUNCE.as_millis() as u64);
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn min_size(&self) -> Size {
        Size::new(self.min_width, self.min_height)
    }

    pub fn container_size(&self) -> Size {
        Size::new(self.container_width, self.container_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.grid_size, 20);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"gridSize": 10, "debounceMs": 250, "minWidth": -5}"#).unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.grid_size, 10);
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.min_width, MIN_WIDGET_WIDTH);
        assert_eq!(config.container_size(), Size::new(1200, 800));
    }

    #[test]
    fn oversized_grid_and_debounce_are_capped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"gridSize": 1500000000, "debounceMs": 18446744073709551615, "containerHeight": 600}"#,
        )
        .unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.grid_size, 600);
        assert_eq!(config.debounce(), MAX_DEBOUNCE);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "gridSize = 10").unwrap();
        assert!(matches!(EditorConfig::load(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = EditorConfig {
            grid_size: 25,
            data_dir: Some(dir.path().join("pages")),
            ..EditorConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }
}
