//! Configuration schema types for `furnimerge.toml`
//!
//! Defines the structure and validation rules for merge configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::merge::CopyPolicy;

/// Input and output roots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Raw asset tree (one directory per item)
    #[serde(default = "default_raw")]
    pub raw: PathBuf,
    /// Metadata tree (one directory per variant key)
    #[serde(default = "default_metadata")]
    pub metadata: PathBuf,
    /// Bundle output tree
    #[serde(default = "default_out")]
    pub out: PathBuf,
}

fn default_raw() -> PathBuf {
    PathBuf::from("assets/2_extracted_swf_data")
}

fn default_metadata() -> PathBuf {
    PathBuf::from("assets/3_metadata_processed_api")
}

fn default_out() -> PathBuf {
    PathBuf::from("assets/4_final_furni_data")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { raw: default_raw(), metadata: default_metadata(), out: default_out() }
    }
}

/// Fixed file names inside the input trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Metadata document inside each variant folder
    #[serde(default = "default_metadata_file")]
    pub metadata: String,
    /// Render-offset table inside each item directory
    #[serde(default = "default_render_data")]
    pub render_data: String,
    /// Visualization descriptor inside each item directory
    #[serde(default = "default_visualization")]
    pub visualization: String,
    /// Folder of rendered images inside each item directory
    #[serde(default = "default_rendered_dir")]
    pub rendered_dir: String,
}

fn default_metadata_file() -> String {
    "data.json".to_string()
}

fn default_render_data() -> String {
    "renderdata.json".to_string()
}

fn default_visualization() -> String {
    "furni.json".to_string()
}

fn default_rendered_dir() -> String {
    "rendered".to_string()
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            metadata: default_metadata_file(),
            render_data: default_render_data(),
            visualization: default_visualization(),
            rendered_dir: default_rendered_dir(),
        }
    }
}

/// Batch execution settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MergeSettings {
    /// Worker count (0 = available parallelism)
    #[serde(default)]
    pub jobs: usize,
    /// What to do with existing images in a bundle
    #[serde(default)]
    pub copy_policy: CopyPolicy,
}

/// Complete furnimerge.toml configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub merge: MergeSettings,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "files.metadata")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "furnimerge.toml: '{}' {}", self.field, self.message)
    }
}

impl MergeConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        let paths = [
            ("paths.raw", &self.paths.raw),
            ("paths.metadata", &self.paths.metadata),
            ("paths.out", &self.paths.out),
        ];
        for (field, path) in paths {
            if path.as_os_str().is_empty() {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: "must be a non-empty path".to_string(),
                });
            }
        }

        let names = [
            ("files.metadata", &self.files.metadata),
            ("files.render_data", &self.files.render_data),
            ("files.visualization", &self.files.visualization),
            ("files.rendered_dir", &self.files.rendered_dir),
        ];
        for (field, name) in names {
            if name.is_empty() {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: "must be a non-empty file name".to_string(),
                });
            } else if name.contains(['/', '\\']) {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: "must be a plain file name, not a path".to_string(),
                });
            }
        }

        if self.paths.out == self.paths.raw || self.paths.out == self.paths.metadata {
            errors.push(ConfigValidationError {
                field: "paths.out".to_string(),
                message: "must differ from the input directories".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: MergeConfig = toml::from_str("").unwrap();
        assert_eq!(config, MergeConfig::default());
        assert_eq!(config.files.metadata, "data.json");
        assert_eq!(config.merge.copy_policy, CopyPolicy::SkipExisting);
        assert!(config.is_valid());
    }

    #[test]
    fn test_parse_full_config() {
        let config: MergeConfig = toml::from_str(
            r#"
[paths]
raw = "raw"
metadata = "meta"
out = "bundles"

[files]
metadata = "meta.json"

[merge]
jobs = 4
copy_policy = "checksum"
"#,
        )
        .unwrap();

        assert_eq!(config.paths.raw, PathBuf::from("raw"));
        assert_eq!(config.files.metadata, "meta.json");
        assert_eq!(config.files.render_data, "renderdata.json");
        assert_eq!(config.merge.jobs, 4);
        assert_eq!(config.merge.copy_policy, CopyPolicy::Checksum);
    }

    #[test]
    fn test_unknown_copy_policy_rejected() {
        let result: Result<MergeConfig, _> = toml::from_str("[merge]\ncopy_policy = \"sometimes\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = MergeConfig::default();
        config.files.metadata = String::new();
        config.files.rendered_dir = "a/b".to_string();
        config.paths.out = config.paths.raw.clone();

        let errors = config.validate();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["files.metadata", "files.rendered_dir", "paths.out"]);
        assert!(errors[0].to_string().starts_with("furnimerge.toml: 'files.metadata'"));
    }
}
