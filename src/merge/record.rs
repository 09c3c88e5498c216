//! Metadata records published by the furniture API.
//!
//! Only the `hotelData` object of each document is read. Every field is
//! optional and extracted leniently: a value of an unexpected type is coerced
//! when it has an obvious reading (`1.0` or `"2"` as a dimension, `5` as a
//! category) and dropped otherwise. Defaults are applied when the record is
//! turned into bundle attributes, not at parse time.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::merge::MergeError;

/// The `hotelData` section of a metadata document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetadataRecord {
    /// Declared classname, possibly carrying a `*color` suffix
    #[serde(default, deserialize_with = "lenient_string")]
    pub classname: Option<String>,
    /// Display name
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    /// Description
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    /// Footprint width in grid units
    #[serde(default, deserialize_with = "lenient_int")]
    pub xdim: Option<i64>,
    /// Footprint depth in grid units
    #[serde(default, deserialize_with = "lenient_int")]
    pub ydim: Option<i64>,
    /// Catalogue category
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: Option<String>,
    /// Furni-line grouping
    #[serde(default, deserialize_with = "lenient_string")]
    pub furni_line: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MetadataDocument {
    #[serde(rename = "hotelData", default)]
    hotel_data: Option<Map<String, Value>>,
}

/// Strings pass through; numbers and booleans become their text form.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Integers pass through; floats are truncated; numeric strings are parsed.
fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64)
            })
        }
        _ => None,
    })
}

impl MetadataRecord {
    /// Load the record from a metadata document.
    ///
    /// Returns `Ok(None)` when the document has no usable `hotelData` object.
    pub fn load(path: &Path) -> Result<Option<Self>, MergeError> {
        let contents = fs::read_to_string(path).map_err(|e| MergeError::io(path, e))?;
        Self::from_json(&contents).map_err(|e| MergeError::json(path, e))
    }

    /// Parse a metadata document.
    ///
    /// A missing, `null` or empty `hotelData` object yields `Ok(None)`.
    pub fn from_json(contents: &str) -> Result<Option<Self>, serde_json::Error> {
        let document: MetadataDocument = serde_json::from_str(contents)?;
        match document.hotel_data {
            Some(fields) if !fields.is_empty() => {
                serde_json::from_value(Value::Object(fields)).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Declared classname, or `fallback` when absent or empty.
    pub fn declared_classname<'a>(&'a self, fallback: &'a str) -> &'a str {
        non_empty(self.classname.as_deref()).unwrap_or(fallback)
    }

    /// Classname with any `*color` suffix removed.
    ///
    /// Falls back to `fallback` when stripping leaves nothing.
    pub fn base_id(&self, fallback: &str) -> String {
        let stripped = strip_color_suffix(self.declared_classname(fallback));
        if stripped.is_empty() { fallback } else { stripped }.to_string()
    }
}

/// Strip everything from the first `*`.
pub fn strip_color_suffix(classname: &str) -> &str {
    classname.split('*').next().unwrap_or(classname)
}

/// Treat empty strings like missing values.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
