//! Variant matching: which metadata entry describes `(classname, color)`.
//!
//! Resolution order:
//! 1. the primary key: bare `"{classname}"` for color `0`, else `"{classname}_{color}"`
//! 2. `"{classname}_0"`, for color `0` only
//!
//! Publishers are inconsistent about the `_0` suffix on the default color, so
//! step 2 recovers that case. When both folders exist the bare one wins, as it
//! sorts first. Non-default colors never guess; a miss is common and simply
//! leaves the variant out of the bundle.

use std::path::Path;

use crate::merge::{ColorVariantId, MetadataIndex};

/// Primary variant key for a color.
pub fn variant_key(classname: &str, color: &ColorVariantId) -> String {
    if color.is_default() {
        classname.to_string()
    } else {
        format!("{}_{}", classname, color)
    }
}

/// Candidate keys for `(classname, color)` in lookup order.
pub fn candidate_keys(classname: &str, color: &ColorVariantId) -> Vec<String> {
    let mut keys = vec![variant_key(classname, color)];
    if color.is_default() {
        keys.push(format!("{}_{}", classname, color));
    }
    keys
}

/// Resolve the metadata file for one variant, or `None` if unmatched.
pub fn match_variant<'a>(
    index: &'a MetadataIndex,
    classname: &str,
    color: &ColorVariantId,
) -> Option<&'a Path> {
    let found = candidate_keys(classname, color).into_iter().find_map(|key| index.get(&key));
    if found.is_none() {
        log::debug!("No metadata for {} color {}", classname, color);
    }
    found
}
