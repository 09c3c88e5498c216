//! Raw per-item assets produced by the extraction step.
//!
//! Layout of one item directory:
//!
//! ```text
//! <raw>/<classname>/
//!   renderdata.json                         render key -> {"X": int, "Y": int}
//!   furni.json                              optional visualization descriptor
//!   <classname>_icon[_<color>].png
//!   rendered/<classname>_dir_<d>[_<color>]_no_sd.png
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::FilesConfig;
use crate::merge::MergeError;

/// Pixel offset of a render, in raw image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOffset {
    #[serde(rename(deserialize = "X"))]
    pub x: i64,
    #[serde(rename(deserialize = "Y"))]
    pub y: i64,
}

/// Render key → offset table from `renderdata.json`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderTable {
    offsets: BTreeMap<String, RenderOffset>,
}

impl RenderTable {
    /// Load a render table from disk.
    pub fn load(path: &Path) -> Result<Self, MergeError> {
        let contents = fs::read_to_string(path).map_err(|e| MergeError::io(path, e))?;
        let value: serde_json::Value =
            serde_json::from_str(&contents).map_err(|e| MergeError::json(path, e))?;
        if !value.is_object() {
            return Err(MergeError::RenderTable {
                path: path.to_path_buf(),
                message: "expected an object keyed by render name".to_string(),
            });
        }
        let offsets = serde_json::from_value(value).map_err(|e| MergeError::json(path, e))?;
        Ok(Self { offsets })
    }

    /// Offset for an exact render key.
    pub fn get(&self, key: &str) -> Option<RenderOffset> {
        self.offsets.get(key).copied()
    }

    /// Whether the table has an exact render key.
    pub fn contains(&self, key: &str) -> bool {
        self.offsets.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl FromIterator<(String, RenderOffset)> for RenderTable {
    fn from_iter<I: IntoIterator<Item = (String, RenderOffset)>>(iter: I) -> Self {
        Self { offsets: iter.into_iter().collect() }
    }
}

/// Paths of one raw item directory.
#[derive(Debug, Clone)]
pub struct RawItem {
    /// Item classname (directory name)
    pub classname: String,
    /// Item directory
    pub dir: PathBuf,
    files: FilesConfig,
}

impl RawItem {
    /// Describe the raw item stored in `dir`.
    ///
    /// Returns `None` if the directory name is not valid UTF-8.
    pub fn new(dir: PathBuf, files: FilesConfig) -> Option<Self> {
        let classname = dir.file_name()?.to_str()?.to_string();
        Some(Self { classname, dir, files })
    }

    /// Path of the render-offset table.
    pub fn render_data_path(&self) -> PathBuf {
        self.dir.join(&self.files.render_data)
    }

    /// Path of the visualization descriptor.
    pub fn visualization_path(&self) -> PathBuf {
        self.dir.join(&self.files.visualization)
    }

    /// Directory of rendered images.
    pub fn rendered_dir(&self) -> PathBuf {
        self.dir.join(&self.files.rendered_dir)
    }

    /// Source image for a render key.
    pub fn render_image(&self, render_key: &str) -> PathBuf {
        self.rendered_dir().join(format!("{}.png", render_key))
    }

    /// Whether the rendered folder holds at least one `*_no_sd.png`.
    pub fn has_renders(&self) -> bool {
        let rendered = self.rendered_dir();
        if !rendered.is_dir() {
            return false;
        }
        let pattern =
            format!("{}/*_no_sd.png", glob::Pattern::escape(&rendered.to_string_lossy()));
        match glob::glob(&pattern) {
            Ok(mut paths) => paths.any(|p| p.map(|p| p.is_file()).unwrap_or(false)),
            Err(e) => {
                log::warn!("Invalid render pattern for {}: {}", self.classname, e);
                false
            }
        }
    }
}

/// List item directories under the raw root, sorted by name.
pub fn discover_items(root: &Path, files: &FilesConfig) -> std::io::Result<Vec<RawItem>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    Ok(dirs
        .into_iter()
        .filter_map(|dir| {
            let item = RawItem::new(dir.clone(), files.clone());
            if item.is_none() {
                log::warn!("Skipping item directory with non UTF-8 name: {}", dir.display());
            }
            item
        })
        .collect())
}
