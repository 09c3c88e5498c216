//! Base record selection.
//!
//! Variants arrive in ascending numeric color order. The first one with a
//! usable metadata record defines the item's canonical attributes and its
//! `base_id`. This picks the default-color record when present, otherwise the
//! lowest-numbered variant that exists.

use serde::Serialize;
use std::path::PathBuf;

use crate::merge::record::non_empty;
use crate::merge::{ColorVariantId, MetadataRecord};

/// Default for `category` and `furni_line` when the record omits them.
pub const UNKNOWN: &str = "unknown";

/// A color variant paired with its metadata record.
#[derive(Debug, Clone)]
pub struct MatchedVariant {
    /// Color id
    pub color: ColorVariantId,
    /// Metadata record
    pub record: MetadataRecord,
    /// Metadata document the record came from
    pub source: PathBuf,
}

/// Footprint in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub x: i64,
    pub y: i64,
}

/// Canonical, color-independent attributes of an item.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseAttributes {
    pub base_id: String,
    pub name: String,
    pub description: String,
    pub dimensions: Dimensions,
    pub category: String,
    pub furni_line: String,
    /// Color of the variant the attributes were taken from
    pub source_color: ColorVariantId,
}

impl BaseAttributes {
    /// Build canonical attributes from one record, filling defaults.
    pub fn from_record(classname: &str, color: &ColorVariantId, record: &MetadataRecord) -> Self {
        Self {
            base_id: record.base_id(classname),
            name: non_empty(record.name.as_deref()).unwrap_or(classname).to_string(),
            description: record.description.clone().unwrap_or_default(),
            dimensions: Dimensions { x: record.xdim.unwrap_or(1), y: record.ydim.unwrap_or(1) },
            category: non_empty(record.category.as_deref()).unwrap_or(UNKNOWN).to_string(),
            furni_line: non_empty(record.furni_line.as_deref()).unwrap_or(UNKNOWN).to_string(),
            source_color: color.clone(),
        }
    }
}

/// Pick the base among matched variants (first in the given order).
pub fn select_base(classname: &str, variants: &[MatchedVariant]) -> Option<BaseAttributes> {
    let first = variants.first()?;
    log::debug!(
        "Base record for {} taken from color {} ({})",
        classname,
        first.color,
        first.source.display()
    );
    Some(BaseAttributes::from_record(classname, &first.color, &first.record))
}
