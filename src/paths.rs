use crate::config::EditorConfig;
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

/// Overrides the directory page documents are stored in.
pub const DATA_DIR_ENV: &str = "SNIPPET_CANVAS_DATA_DIR";

pub struct AppPaths {
    pub config_file: PathBuf,
    pub pages: PathBuf,
}

impl AppPaths {
    pub fn from_project_dirs() -> Option<Self> {
        ProjectDirs::from("com", "snippetcanvas", "SnippetCanvas").map(|dirs| {
            let config_file = dirs.config_dir().join("config.json");
            let pages = dirs.data_dir().join("pages");

            Self { config_file, pages }
        })
    }

    /// Page directory in priority order: environment, config file, platform default.
    pub fn pages_dir(&self, config: &EditorConfig) -> PathBuf {
        std::env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| config.data_dir.clone())
            .unwrap_or_else(|| self.pages.clone())
    }

    pub fn ensure_dirs_exist(&self) -> std::io::Result<()> {
        if let Some(parent) = self.config_file.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
