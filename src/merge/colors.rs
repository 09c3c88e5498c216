//! Color variant resolution.
//!
//! Each raw item may ship a visualization descriptor (`furni.json`) listing the
//! colors it can be rendered in, grouped by rendering size:
//!
//! ```json
//! { "visualizations": { "64": { "colors": { "1": {...}, "2": {...} } },
//!                       "32": { "colors": { ... } } } }
//! ```
//!
//! The resolver picks one size's `colors` mapping and returns its keys in
//! numeric order. Anything missing or malformed yields the default color.

use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::Path;

/// Rendering sizes tried first, in order.
pub const SIZE_PREFERENCE: [&str; 2] = ["64", "32"];

/// Identifier of one color rendition of an item.
///
/// Kept in its string form so metadata keys are rebuilt verbatim, but ordered
/// numerically (`"2"` sorts before `"10"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorVariantId(String);

impl ColorVariantId {
    /// The colorless / default rendition.
    pub fn default_color() -> Self {
        Self("0".to_string())
    }

    /// Parse a color id; only plain ASCII digit strings that fit a `u32` are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse::<u32>().ok().map(|_| Self(raw.to_string()))
    }

    /// The id as written in source data.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value used for ordering.
    pub fn value(&self) -> u32 {
        self.0.parse().unwrap_or(u32::MAX)
    }

    /// Whether this is color `"0"`.
    pub fn is_default(&self) -> bool {
        self.0 == "0"
    }
}

impl Ord for ColorVariantId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(&other.value()).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for ColorVariantId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ColorVariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for ColorVariantId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Resolve the color ids declared by a visualization descriptor.
///
/// Never empty: falls back to `["0"]`.
pub fn resolve_color_ids(descriptor: Option<&Value>) -> Vec<ColorVariantId> {
    let colors = descriptor.and_then(select_color_mapping);

    let mut ids: Vec<ColorVariantId> = match colors {
        Some(colors) => colors
            .keys()
            .filter_map(|key| {
                let id = ColorVariantId::parse(key);
                if id.is_none() {
                    log::debug!("Ignoring non-numeric color id '{}'", key);
                }
                id
            })
            .collect(),
        None => Vec::new(),
    };

    if ids.is_empty() {
        return vec![ColorVariantId::default_color()];
    }

    ids.sort();
    ids.dedup();
    ids
}

/// Read `path` and resolve its color ids.
///
/// A missing or unparsable file yields `["0"]`.
pub fn load_color_ids(path: &Path) -> Vec<ColorVariantId> {
    let descriptor = match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<Value>(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                log::debug!("Unparsable visualization descriptor {}: {}", path.display(), e);
                None
            }
        },
        Err(_) => None,
    };
    resolve_color_ids(descriptor.as_ref())
}

/// Pick the `colors` mapping of the preferred rendering size.
///
/// Sizes are tried in [`SIZE_PREFERENCE`] order, then the remaining sizes in
/// key order; the first with a non-empty `colors` object wins.
fn select_color_mapping(descriptor: &Value) -> Option<&serde_json::Map<String, Value>> {
    let sizes = size_table(descriptor)?;

    let preferred = SIZE_PREFERENCE.iter().filter_map(|size| sizes.get(*size));
    let remaining = sizes
        .iter()
        .filter(|(size, _)| !SIZE_PREFERENCE.contains(&size.as_str()))
        .map(|(_, v)| v);

    preferred.chain(remaining).find_map(|size| {
        size.get("colors").and_then(Value::as_object).filter(|colors| !colors.is_empty())
    })
}

/// Locate the size-keyed table inside a descriptor.
fn size_table(descriptor: &Value) -> Option<&serde_json::Map<String, Value>> {
    ["visualizations", "visualization"]
        .iter()
        .find_map(|key| descriptor.get(*key).and_then(Value::as_object))
        .or_else(|| descriptor.as_object())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(values: &[&str]) -> Vec<ColorVariantId> {
        values.iter().map(|v| ColorVariantId::parse(v).unwrap()).collect()
    }

    #[test]
    fn test_no_descriptor_defaults_to_zero() {
        assert_eq!(resolve_color_ids(None), ids(&["0"]));
    }

    #[test]
    fn test_prefers_size_64() {
        let descriptor = json!({
            "visualizations": {
                "32": { "colors": { "7": {} } },
                "64": { "colors": { "1": {}, "2": {} } }
            }
        });
        assert_eq!(resolve_color_ids(Some(&descriptor)), ids(&["1", "2"]));
    }

    #[test]
    fn test_falls_back_to_size_32() {
        let descriptor = json!({
            "visualizations": {
                "1": { "colors": { "9": {} } },
                "32": { "colors": { "3": {} } }
            }
        });
        assert_eq!(resolve_color_ids(Some(&descriptor)), ids(&["3"]));
    }

    #[test]
    fn test_falls_back_to_remaining_size() {
        let descriptor = json!({ "1": { "colors": { "4": {}, "0": {} } } });
        assert_eq!(resolve_color_ids(Some(&descriptor)), ids(&["0", "4"]));
    }

    #[test]
    fn test_skips_size_without_colors() {
        let descriptor = json!({
            "visualization": {
                "64": { "layers": {} },
                "32": { "colors": { "5": {} } }
            }
        });
        assert_eq!(resolve_color_ids(Some(&descriptor)), ids(&["5"]));
    }

    #[test]
    fn test_numeric_not_lexical_order() {
        let descriptor = json!({ "64": { "colors": { "10": {}, "2": {}, "0": {} } } });
        let resolved = resolve_color_ids(Some(&descriptor));
        let as_str: Vec<&str> = resolved.iter().map(ColorVariantId::as_str).collect();
        assert_eq!(as_str, vec!["0", "2", "10"]);
    }

    #[test]
    fn test_empty_colors_defaults_to_zero() {
        let descriptor = json!({ "64": { "colors": {} } });
        assert_eq!(resolve_color_ids(Some(&descriptor)), ids(&["0"]));
    }

    #[test]
    fn test_non_numeric_keys_ignored() {
        let descriptor = json!({ "64": { "colors": { "red": {}, "3": {} } } });
        assert_eq!(resolve_color_ids(Some(&descriptor)), ids(&["3"]));

        let signed = json!({ "64": { "colors": { "+1": {}, "2": {} } } });
        assert_eq!(resolve_color_ids(Some(&signed)), ids(&["2"]));

        let only_bad = json!({ "64": { "colors": { "red": {} } } });
        assert_eq!(resolve_color_ids(Some(&only_bad)), ids(&["0"]));
    }

    #[test]
    fn test_unexpected_shape_defaults_to_zero() {
        assert_eq!(resolve_color_ids(Some(&json!([1, 2, 3]))), ids(&["0"]));
        assert_eq!(resolve_color_ids(Some(&json!({ "64": "nope" }))), ids(&["0"]));
    }

    #[test]
    fn test_load_missing_and_malformed_files() {
        let temp = tempfile::TempDir::new().unwrap();
        assert_eq!(load_color_ids(&temp.path().join("furni.json")), ids(&["0"]));

        let bad = temp.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        assert_eq!(load_color_ids(&bad), ids(&["0"]));

        let good = temp.path().join("good.json");
        fs::write(&good, r#"{"visualizations":{"64":{"colors":{"2":{},"1":{}}}}}"#).unwrap();
        assert_eq!(load_color_ids(&good), ids(&["1", "2"]));
    }

    #[test]
    fn test_color_id_parse_and_default() {
        assert!(ColorVariantId::parse("-1").is_none());
        assert!(ColorVariantId::parse("abc").is_none());
        assert!(ColorVariantId::parse("+1").is_none());
        assert!(ColorVariantId::parse(" 1").is_none());
        assert!(ColorVariantId::parse("").is_none());
        assert!(ColorVariantId::parse("99999999999").is_none());
        assert!(ColorVariantId::default_color().is_default());
        assert!(!ColorVariantId::parse("3").unwrap().is_default());
    }
}
