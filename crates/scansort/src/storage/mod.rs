//! Read-side access to the managed directories
//!
//! Routing owns all writes into the buckets; this module only lists,
//! locates and describes what routing has filed. Directories are created
//! lazily by the write side, so a missing directory here is simply
//! empty, never an error.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::error::{Error, Result};

/// Directory selectors accepted by the list endpoint
pub const DIRECTORY_FILTERS: &[&str] = &["scan", "fully_indexed", "partially_indexed", "failed"];

/// Metadata for one stored file
#[derive(Debug, Clone, Serialize)]
pub struct FileMetadata {
    pub filename: String,
    /// Which managed directory holds the file
    pub directory: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

/// File counts per managed directory
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryStats {
    pub scan: usize,
    pub fully_indexed: usize,
    pub partially_indexed: usize,
    pub failed: usize,
}

/// Lookup facade over the four managed directories
#[derive(Clone)]
pub struct FileStore {
    storage: StorageConfig,
}

impl FileStore {
    pub fn new(storage: StorageConfig) -> Self {
        Self { storage }
    }

    /// Labeled directories in lookup precedence order: indexed buckets
    /// first, the intake directory last.
    fn directories(&self) -> [(&'static str, &PathBuf); 4] {
        [
            ("fully_indexed", &self.storage.fully_indexed_dir),
            ("partially_indexed", &self.storage.partially_indexed_dir),
            ("failed", &self.storage.failed_dir),
            ("scan", &self.storage.scan_dir),
        ]
    }

    fn dir_for_filter(&self, filter: &str) -> Option<&PathBuf> {
        // Short aliases accepted alongside the directory names
        let label = match filter {
            "fully" => "fully_indexed",
            "partial" => "partially_indexed",
            other => other,
        };
        self.directories()
            .into_iter()
            .find(|(candidate, _)| *candidate == label)
            .map(|(_, dir)| dir)
    }

    /// Filenames in one directory, or the deduplicated union of all four
    /// when `filter` is `None`. Always sorted. An unknown filter is a
    /// config error.
    pub fn list_files(&self, filter: Option<&str>) -> Result<Vec<String>> {
        let mut names = match filter {
            Some(filter) => {
                let dir = self.dir_for_filter(filter).ok_or_else(|| {
                    Error::Config(format!(
                        "Unknown directory filter '{}' (expected one of: {})",
                        filter,
                        DIRECTORY_FILTERS.join(", ")
                    ))
                })?;
                list_dir(dir)
            }
            None => {
                let mut all: Vec<String> = self
                    .directories()
                    .into_iter()
                    .flat_map(|(_, dir)| list_dir(dir))
                    .collect();
                all.sort();
                all.dedup();
                all
            }
        };
        names.sort();
        Ok(names)
    }

    /// Locate a file by name, searching the buckets before the intake
    /// directory.
    pub fn fetch_file(&self, filename: &str) -> Result<PathBuf> {
        for (_, dir) in self.directories() {
            let candidate = dir.join(filename);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(Error::FileNotFound(filename.to_string()))
    }

    /// Size, modification time and holding directory for a stored file
    pub fn metadata(&self, filename: &str) -> Result<FileMetadata> {
        for (label, dir) in self.directories() {
            let candidate = dir.join(filename);
            let meta = match std::fs::metadata(&candidate) {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            return Ok(FileMetadata {
                filename: filename.to_string(),
                directory: label.to_string(),
                size_bytes: meta.len(),
                modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
            });
        }
        Err(Error::FileNotFound(filename.to_string()))
    }

    /// Case-insensitive substring search across every managed directory
    pub fn search(&self, query: &str) -> Vec<String> {
        let needle = query.to_lowercase();
        let mut matches: Vec<String> = self
            .directories()
            .into_iter()
            .flat_map(|(_, dir)| list_dir(dir))
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect();
        matches.sort();
        matches.dedup();
        matches
    }

    /// File counts per directory
    pub fn stats(&self) -> DirectoryStats {
        DirectoryStats {
            scan: list_dir(&self.storage.scan_dir).len(),
            fully_indexed: list_dir(&self.storage.fully_indexed_dir).len(),
            partially_indexed: list_dir(&self.storage.partially_indexed_dir).len(),
            failed: list_dir(&self.storage.failed_dir).len(),
        }
    }
}

/// Plain files in a directory; a missing directory reads as empty
fn list_dir(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect()
}
