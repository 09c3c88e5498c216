//! Merged item bundles and their `data.json` document.
//!
//! ```json
//! {
//!   "base_id": "chair_plasto",
//!   "name": "Plasto Chair",
//!   "description": "",
//!   "dimensions": { "x": 1, "y": 1 },
//!   "category": "chair",
//!   "furni_line": "plasto",
//!   "variants": {
//!     "0": {
//!       "id": "chair_plasto",
//!       "name": "Plasto Chair",
//!       "description": "",
//!       "icon": "icons/chair_plasto_icon_0.png",
//!       "renders": {
//!         "0": { "path": "renders/chair_plasto_dir_2_0_no_sd.png", "offset": { "x": -34, "y": 58 } }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Maps are ordered (variants by numeric color, renders by rotation), so the
//! document is byte-identical for identical inputs.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::merge::{BaseAttributes, ColorVariantId, Dimensions, MergeError, RenderOffset};

/// File name of the bundle document.
pub const BUNDLE_FILENAME: &str = "data.json";

/// Image reference plus offset for one rotation slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRef {
    /// Path relative to the bundle root
    pub path: String,
    /// Pixel offset
    pub offset: RenderOffset,
}

/// One color variant of an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantEntry {
    /// `base_id` for color 0, `base_id_color` otherwise
    pub id: String,
    pub name: String,
    pub description: String,
    /// Icon path relative to the bundle root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Rotation slot → render
    pub renders: BTreeMap<u8, RenderRef>,
}

/// Variant id for a color of `base_id`.
pub fn variant_id(base_id: &str, color: &ColorVariantId) -> String {
    if color.is_default() {
        base_id.to_string()
    } else {
        format!("{}_{}", base_id, color)
    }
}

/// The merged output document for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedItemBundle {
    pub base_id: String,
    pub name: String,
    pub description: String,
    pub dimensions: Dimensions,
    pub category: String,
    pub furni_line: String,
    pub variants: BTreeMap<ColorVariantId, VariantEntry>,
}

impl MergedItemBundle {
    /// Start a bundle from canonical attributes, with no variants yet.
    pub fn new(base: &BaseAttributes) -> Self {
        Self {
            base_id: base.base_id.clone(),
            name: base.name.clone(),
            description: base.description.clone(),
            dimensions: base.dimensions,
            category: base.category.clone(),
            furni_line: base.furni_line.clone(),
            variants: BTreeMap::new(),
        }
    }

    /// Add a variant; entries without renders are dropped.
    ///
    /// Returns whether the entry was kept.
    pub fn add_variant(&mut self, color: ColorVariantId, entry: VariantEntry) -> bool {
        if entry.renders.is_empty() {
            return false;
        }
        self.variants.insert(color, entry);
        true
    }

    /// Whether the bundle may be emitted (at least one variant with renders).
    pub fn is_emittable(&self) -> bool {
        self.variants.values().any(|v| !v.renders.is_empty())
    }

    /// Serialize to the pretty-printed document, newline terminated.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Write `data.json` into `bundle_dir`, replacing any previous document.
    pub fn write(&self, bundle_dir: &Path) -> Result<PathBuf, MergeError> {
        fs::create_dir_all(bundle_dir).map_err(|e| MergeError::io(bundle_dir, e))?;
        let path = bundle_dir.join(BUNDLE_FILENAME);
        let json = self.to_json().map_err(|e| MergeError::json(&path, e))?;

        let file = File::create(&path).map_err(|e| MergeError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(json.as_bytes()).map_err(|e| MergeError::io(&path, e))?;
        writer.flush().map_err(|e| MergeError::io(&path, e))?;
        Ok(path)
    }
}
