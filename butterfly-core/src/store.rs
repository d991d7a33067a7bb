//! Content store: discovers article files and loads them as records.

use crate::frontmatter::parse_frontmatter_lenient;
use crate::models::ContentRecord;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Article not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Flat directory of `<id>.<extension>` files
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
    extension: String,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read every content file in the root, ordered by file name.
    ///
    /// A missing root yields an empty list. Files that cannot be read are
    /// logged and skipped.
    pub fn list(&self) -> Vec<ContentRecord> {
        if !self.root.is_dir() {
            tracing::debug!("Content root {:?} does not exist", self.root);
            return Vec::new();
        }

        let mut records = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let Some(id) = self.id_for(entry.path()) else {
                continue;
            };

            match fs::read_to_string(entry.path()) {
                Ok(content) => records.push(record_from_source(id, &content)),
                Err(e) => tracing::warn!("Failed to read {:?}: {}", entry.path(), e),
            }
        }

        tracing::debug!("Loaded {} content files from {:?}", records.len(), self.root);
        records
    }

    /// Load a single record by id
    pub fn load(&self, id: &str) -> Result<ContentRecord, StoreError> {
        if !is_valid_id(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let path = self.root.join(format!("{}.{}", id, self.extension));
        if !path.is_file() {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let content = fs::read_to_string(&path)?;
        Ok(record_from_source(id.to_string(), &content))
    }

    fn id_for(&self, path: &Path) -> Option<String> {
        let name = path.file_name()?.to_str()?;
        let id = name.strip_suffix(&self.extension)?.strip_suffix('.')?;
        is_valid_id(id).then(|| id.to_string())
    }
}

/// Ids are bare file stems: no separators, no parent references
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0'])
}

/// Build a record from the full text of a content file
pub fn record_from_source(id: String, content: &str) -> ContentRecord {
    let (frontmatter, body) = parse_frontmatter_lenient(content);

    ContentRecord {
        id,
        title: frontmatter.title_or_default(),
        description: frontmatter.description_or_default(),
        category: frontmatter.category_or_default(),
        date: frontmatter.date_or_default(),
        raw_body: body,
    }
}
