//! The page store collaborator: where page documents are read from and written to.
//!
//! Writes use full-list replace semantics: the whole widget array of a page is
//! sent on every update, never a per-widget patch.

use crate::error::StoreError;
use crate::widget::{Page, Widget};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub trait PageStore {
    fn get_page(&self, page_id: Uuid) -> Result<Page, StoreError>;

    /// Replaces the page's widget list and returns the stored page.
    fn update_page_widgets(&mut self, page_id: Uuid, widgets: &[Widget])
        -> Result<Page, StoreError>;

    fn list_pages(&self) -> Result<Vec<Page>, StoreError>;

    /// Creates or overwrites a whole page document.
    fn save_page(&mut self, page: &Page) -> Result<(), StoreError>;

    /// Returns the page flagged as default, falling back to the first page by name.
    fn default_page(&self) -> Result<Option<Page>, StoreError> {
        let mut pages = self.list_pages()?;
        pages.sort_by(|a, b| a.name.cmp(&b.name));
        let index = pages.iter().position(|p| p.is_default).unwrap_or(0);
        Ok((index < pages.len()).then(|| pages.swap_remove(index)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

/// Keeps pages in a map. Writes can be armed to fail for exercising rollback.
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    pages: HashMap<Uuid, Page>,
    failing_writes: usize,
    write_count: usize,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.insert(page.id, page);
        self
    }

    /// Makes the next `count` widget writes fail with [`StoreError::Rejected`].
    pub fn fail_next_writes(&mut self, count: usize) {
        self.failing_writes = count;
    }

    /// Number of widget writes attempted, failed ones included.
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    pub fn page(&self, page_id: Uuid) -> Option<&Page> {
        self.pages.get(&page_id)
    }
}

impl PageStore for MemoryPageStore {
    fn get_page(&self, page_id: Uuid) -> Result<Page, StoreError> {
        self.pages
            .get(&page_id)
            .cloned()
            .ok_or(StoreError::NotFound(page_id))
    }

    fn update_page_widgets(
        &mut self,
        page_id: Uuid,
        widgets: &[Widget],
    ) -> Result<Page, StoreError> {
        self.write_count += 1;
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(StoreError::Rejected("simulated failure".to_string()));
        }
        let page = self
            .pages
            .get_mut(&page_id)
            .ok_or(StoreError::NotFound(page_id))?;
        page.widgets = widgets.to_vec();
        Ok(page.clone())
    }

    fn list_pages(&self) -> Result<Vec<Page>, StoreError> {
        Ok(self.pages.values().cloned().collect())
    }

    fn save_page(&mut self, page: &Page) -> Result<(), StoreError> {
        self.pages.insert(page.id, page.clone());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON file store
// ─────────────────────────────────────────────────────────────────────────────

/// Stores each page as `<page-id>.json` inside one directory.
#[derive(Debug, Clone)]
pub struct JsonFilePageStore {
    dir: PathBuf,
}

impl JsonFilePageStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn page_path(&self, page_id: Uuid) -> PathBuf {
        self.dir.join(format!("{page_id}.json"))
    }

    fn read_page(path: &Path) -> Result<Page, StoreError> {
        let file = fs::File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Writes through a temporary file so a crash never leaves a half-written page.
    fn write_page(&self, page: &Page) -> Result<(), StoreError> {
        let path = self.page_path(page.id);
        let tmp = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(fs::File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, page)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &path)?;
        debug!("wrote page {} to {}", page.id, path.display());
        Ok(())
    }
}

impl PageStore for JsonFilePageStore {
    fn get_page(&self, page_id: Uuid) -> Result<Page, StoreError> {
        match Self::read_page(&self.page_path(page_id)) {
            Err(StoreError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(page_id))
            }
            other => other,
        }
    }

    fn update_page_widgets(
        &mut self,
        page_id: Uuid,
        widgets: &[Widget],
    ) -> Result<Page, StoreError> {
        let mut page = self.get_page(page_id)?;
        page.widgets = widgets.to_vec();
        self.write_page(&page)?;
        Ok(page)
    }

    fn list_pages(&self) -> Result<Vec<Page>, StoreError> {
        let mut pages = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match Self::read_page(&path) {
                Ok(page) => pages.push(page),
                Err(err) => warn!("skipping {}: {}", path.display(), err),
            }
        }
        Ok(pages)
    }

    fn save_page(&mut self, page: &Page) -> Result<(), StoreError> {
        self.write_page(page)
    }
}
