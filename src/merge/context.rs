//! Merge context containing configuration and state for a batch.

use crate::config::{FilesConfig, MergeConfig};
use crate::merge::CopyPolicy;
use std::path::{Path, PathBuf};

/// Merge context shared read-only by every unit of work.
///
/// Holds the loaded configuration, the directory relative paths resolve
/// against, and the per-run switches from the command line.
#[derive(Debug, Clone)]
pub struct MergeContext {
    /// The loaded configuration
    config: MergeConfig,
    /// Project root directory (where furnimerge.toml is located)
    project_root: PathBuf,
    /// Plan without writing anything
    dry_run: bool,
    /// Optional filter to merge specific items only
    item_filter: Option<Vec<String>>,
}

impl MergeContext {
    /// Create a new merge context.
    pub fn new(config: MergeConfig, project_root: PathBuf) -> Self {
        Self { config, project_root, dry_run: false, item_filter: None }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Raw asset root (resolved).
    pub fn raw_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.paths.raw)
    }

    /// Metadata root (resolved).
    pub fn metadata_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.paths.metadata)
    }

    /// Bundle output root (resolved).
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.paths.out)
    }

    /// Output directory for one bundle.
    pub fn bundle_dir(&self, base_id: &str) -> PathBuf {
        self.out_dir().join(base_id)
    }

    /// File names inside the input trees.
    pub fn files(&self) -> &FilesConfig {
        &self.config.files
    }

    /// Copy policy for bundle images.
    pub fn copy_policy(&self) -> CopyPolicy {
        self.config.merge.copy_policy
    }

    /// Worker count, with `0` meaning available parallelism.
    pub fn jobs(&self) -> usize {
        match self.config.merge.jobs {
            0 => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            n => n,
        }
    }

    /// Whether this is a dry run.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Set dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Restrict the batch to the named items.
    pub fn with_filter(mut self, items: Vec<String>) -> Self {
        self.item_filter = Some(items);
        self
    }

    /// Get the item filter.
    pub fn item_filter(&self) -> Option<&[String]> {
        self.item_filter.as_deref()
    }

    /// Whether `classname` passes the item filter.
    pub fn accepts(&self, classname: &str) -> bool {
        match &self.item_filter {
            Some(items) => items.iter().any(|item| item == classname),
            None => true,
        }
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    /// If relative, joins it with the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}
