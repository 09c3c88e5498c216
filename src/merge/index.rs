//! Metadata index: variant key → metadata document path.
//!
//! The metadata tree holds one folder per variant key (`chair_plasto`,
//! `chair_plasto_1`, ...), each optionally containing a fixed-named JSON file.
//! The index is built once per batch and only ever read afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::merge::BatchError;

/// Read-only mapping from variant key to metadata file.
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    entries: BTreeMap<String, PathBuf>,
}

impl MetadataIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `root` and index every `<root>/<key>/<file_name>` that exists.
    ///
    /// Folders are visited in name order; a later folder with the same key
    /// replaces an earlier one. A missing root is a batch precondition failure.
    pub fn build(root: &Path, file_name: &str) -> Result<Self, BatchError> {
        if !root.is_dir() {
            return Err(BatchError::MissingMetadataRoot(root.to_path_buf()));
        }

        let read_dir = fs::read_dir(root)
            .map_err(|source| BatchError::Io { path: root.to_path_buf(), source })?;

        let mut folders: Vec<PathBuf> = read_dir
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    log::warn!("Skipping unreadable metadata entry in {}: {}", root.display(), e);
                    None
                }
            })
            .filter(|path| path.is_dir())
            .collect();
        folders.sort();

        let mut index = Self::new();
        for folder in folders {
            let Some(key) = folder.file_name().and_then(|n| n.to_str()) else {
                log::debug!("Skipping non UTF-8 metadata folder {}", folder.display());
                continue;
            };
            let meta_file = folder.join(file_name);
            if meta_file.is_file() {
                index.insert(key.to_string(), meta_file);
            }
        }

        log::info!("Indexed {} metadata variants from {}", index.len(), root.display());
        Ok(index)
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, key: String, path: PathBuf) {
        self.entries.insert(key, path);
    }

    /// Look up a variant key.
    pub fn get(&self, key: &str) -> Option<&Path> {
        self.entries.get(key).map(PathBuf::as_path)
    }

    /// Check whether a variant key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether any key belongs to `classname`: equal to it or prefixed by
    /// `"{classname}_"`.
    pub fn has_candidates(&self, classname: &str) -> bool {
        if self.contains(classname) {
            return true;
        }
        let prefix = format!("{}_", classname);
        self.entries
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(key, _)| key.starts_with(&prefix))
    }

    /// Number of indexed variants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, PathBuf)> for MetadataIndex {
    fn from_iter<I: IntoIterator<Item = (String, PathBuf)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}
