//! Directory loader
//!
//! Walks a data directory recursively in sorted path order and merges every
//! YAML or JSON document into one [`DataStore`]. Files read later replace
//! entities with the same id. Hidden files and directories are skipped; any
//! other file with an unknown extension aborts the load.

use std::fs;
use std::path::{Path, PathBuf};

use stagectl_core::DataStore;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::document::DataDocument;
use crate::error::{LoadError, Result};

/// Maximum accepted size of a single data file (16 MB)
pub const MAX_DATA_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        match extension {
            "json" => Ok(DocumentFormat::Json),
            "yml" | "yaml" => Ok(DocumentFormat::Yaml),
            _ => Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: extension.to_string(),
            }),
        }
    }
}

/// Loads show data from a directory tree
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
    max_file_size: u64,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_size: MAX_DATA_FILE_SIZE,
        }
    }

    /// Override the per-file size limit
    pub fn with_max_file_size(mut self, limit: u64) -> Self {
        self.max_file_size = limit;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load and merge every document below the root
    pub fn load(&self) -> Result<DataStore> {
        if !self.root.is_dir() {
            return Err(LoadError::DirectoryNotFound(self.root.clone()));
        }

        let mut store = DataStore::new();
        let mut files = 0usize;

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let document = self.load_file(entry.path())?;
            debug!(
                "Loaded {} entities from {:?}",
                document.len(),
                entry.path()
            );
            document.merge_into(&mut store);
            files += 1;
        }

        info!(
            "Loaded {} entities from {} files in {:?}",
            store.len(),
            files,
            self.root
        );
        Ok(store)
    }

    /// Parse a single document
    pub fn load_file(&self, path: &Path) -> Result<DataDocument> {
        let format = DocumentFormat::from_path(path)?;

        let size = fs::metadata(path)?.len();
        if size > self.max_file_size {
            return Err(LoadError::FileTooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.max_file_size,
            });
        }

        let content = fs::read_to_string(path)?;
        parse_document(&content, format, path)
    }
}

/// Parse document text in the given format. `path` is only used for errors.
pub fn parse_document(content: &str, format: DocumentFormat, path: &Path) -> Result<DataDocument> {
    // an empty YAML file is a valid, empty document
    if content.trim().is_empty() {
        return Ok(DataDocument::default());
    }

    match format {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        }),
        DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
