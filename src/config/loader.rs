//! Configuration loading and discovery for `furnimerge.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::MergeConfig;
use crate::merge::CopyPolicy;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file name searched for by [`find_config`].
pub const CONFIG_FILENAME: &str = "furnimerge.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse furnimerge.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override raw asset directory
    pub raw: Option<PathBuf>,
    /// Override metadata directory
    pub metadata: Option<PathBuf>,
    /// Override output directory
    pub out: Option<PathBuf>,
    /// Number of parallel jobs
    pub jobs: Option<usize>,
    /// Override copy policy
    pub copy_policy: Option<CopyPolicy>,
}

/// Find furnimerge.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for furnimerge.toml
/// 2. Check XDG_CONFIG_HOME/furnimerge/furnimerge.toml (or ~/.config/furnimerge/furnimerge.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find furnimerge.toml in XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("furnimerge").join(CONFIG_FILENAME);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find furnimerge.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a furnimerge.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the default
/// configuration.
pub fn load_config(path: Option<&Path>) -> Result<MergeConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<MergeConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: MergeConfig = toml::from_str(&contents)?;
    validate(config)
}

fn validate(config: MergeConfig) -> Result<MergeConfig, ConfigError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }
    Ok(config)
}

/// Default configuration used when no furnimerge.toml is found.
pub fn default_config() -> MergeConfig {
    MergeConfig::default()
}

/// Apply CLI overrides to a loaded config and re-validate it.
pub fn merge_cli_overrides(
    mut config: MergeConfig,
    overrides: &CliOverrides,
) -> Result<MergeConfig, ConfigError> {
    if let Some(ref raw) = overrides.raw {
        config.paths.raw = raw.clone();
    }
    if let Some(ref metadata) = overrides.metadata {
        config.paths.metadata = metadata.clone();
    }
    if let Some(ref out) = overrides.out {
        config.paths.out = out.clone();
    }
    if let Some(jobs) = overrides.jobs {
        config.merge.jobs = jobs;
    }
    if let Some(policy) = overrides.copy_policy {
        config.merge.copy_policy = policy;
    }
    validate(config)
}

/// Get the project root directory from a config file path.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let config_path = dir.join(CONFIG_FILENAME);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(contents.as_bytes())
            .expect("should write config content");
        config_path
    }

    #[test]
    fn test_find_config_in_current_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "[merge]\njobs = 2");

        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "");

        let subdir = temp.path().join("assets").join("raw");
        fs::create_dir_all(&subdir).expect("should create subdirectories");

        let found = find_config_from(subdir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_not_found() {
        let temp = TempDir::new().expect("should create temp dir");
        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, None);
    }

    #[test]
    #[serial]
    fn test_find_xdg_config() {
        let temp = TempDir::new().expect("should create temp dir");
        let dir = temp.path().join("furnimerge");
        fs::create_dir_all(&dir).expect("should create xdg dir");
        let config_path = write_config(&dir, "");

        let previous = env::var_os("XDG_CONFIG_HOME");
        env::set_var("XDG_CONFIG_HOME", temp.path());
        let found = find_xdg_config();
        match previous {
            Some(value) => env::set_var("XDG_CONFIG_HOME", value),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }

        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(
            temp.path(),
            r#"
[paths]
raw = "in/raw"
out = "out"

[merge]
jobs = 3
copy_policy = "overwrite"
"#,
        );

        let config = load_config(Some(&config_path)).expect("should load valid config");
        assert_eq!(config.paths.raw, PathBuf::from("in/raw"));
        assert_eq!(config.paths.out, PathBuf::from("out"));
        assert_eq!(config.merge.jobs, 3);
        assert_eq!(config.merge.copy_policy, CopyPolicy::Overwrite);
    }

    #[test]
    fn test_load_config_missing_file_is_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let result = load_config(Some(&temp.path().join("nonexistent.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "this is not valid toml {{{");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_validation_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "[files]\nmetadata = \"\"\n");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_merge_cli_overrides() {
        let overrides = CliOverrides {
            raw: Some(PathBuf::from("/data/raw")),
            out: Some(PathBuf::from("/data/out")),
            jobs: Some(8),
            copy_policy: Some(CopyPolicy::Checksum),
            ..Default::default()
        };
        let config = merge_cli_overrides(default_config(), &overrides).unwrap();

        assert_eq!(config.paths.raw, PathBuf::from("/data/raw"));
        assert_eq!(config.paths.metadata, PathBuf::from("assets/3_metadata_processed_api"));
        assert_eq!(config.paths.out, PathBuf::from("/data/out"));
        assert_eq!(config.merge.jobs, 8);
        assert_eq!(config.merge.copy_policy, CopyPolicy::Checksum);
    }

    #[test]
    fn test_merge_cli_overrides_revalidates() {
        let overrides = CliOverrides {
            raw: Some(PathBuf::from("same")),
            out: Some(PathBuf::from("same")),
            ..Default::default()
        };
        let result = merge_cli_overrides(default_config(), &overrides);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_project_root() {
        let path = Path::new("/work/furnimerge.toml");
        assert_eq!(project_root(path), Some(Path::new("/work")));
    }
}
