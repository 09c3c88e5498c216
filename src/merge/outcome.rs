//! Merge outcome types.
//!
//! Each item ends in exactly one [`ItemOutcome`]; the driver aggregates them
//! into a [`MergeReport`].

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Why an item produced no bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No metadata key belongs to the item
    NoMetadata,
    /// No `*_no_sd.png` in the rendered folder
    NoRenders,
    /// No render-offset table
    NoRenderData,
    /// Metadata matched, but no matched document had a `hotelData` object
    BadMetadata,
    /// No variant matched, or no matched variant had a render
    NoValidVariants,
    /// Another item owns the same `base_id`
    DuplicateBaseId { base_id: String, owner: String },
}

impl SkipReason {
    /// Stable outcome tag.
    pub fn tag(&self) -> &'static str {
        match self {
            SkipReason::NoMetadata => "skipped_no_metadata",
            SkipReason::NoRenders => "skipped_no_renders",
            SkipReason::NoRenderData => "skipped_no_render_data",
            SkipReason::BadMetadata => "skipped_bad_metadata",
            SkipReason::NoValidVariants => "skipped_no_valid_variants",
            SkipReason::DuplicateBaseId { .. } => "skipped_duplicate_base_id",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoMetadata => write!(f, "no metadata found"),
            SkipReason::NoRenders => write!(f, "no rendered images"),
            SkipReason::NoRenderData => write!(f, "no render-offset table"),
            SkipReason::BadMetadata => write!(f, "matched metadata has no hotelData"),
            SkipReason::NoValidVariants => write!(f, "no valid variants matched"),
            SkipReason::DuplicateBaseId { base_id, owner } => {
                write!(f, "base_id '{}' already owned by '{}'", base_id, owner)
            }
        }
    }
}

/// Final outcome for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Bundle written (or, in a dry run, ready to write)
    Processed,
    /// Expected absence of data
    Skipped(SkipReason),
    /// Unexpected failure with its trace
    Error(String),
}

impl ItemOutcome {
    /// Stable outcome tag (`processed`, `skipped_*`, `error`).
    pub fn tag(&self) -> &'static str {
        match self {
            ItemOutcome::Processed => "processed",
            ItemOutcome::Skipped(reason) => reason.tag(),
            ItemOutcome::Error(_) => "error",
        }
    }

    /// Whether the item was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self, ItemOutcome::Skipped(_))
    }

    /// Whether the item failed.
    pub fn is_error(&self) -> bool {
        matches!(self, ItemOutcome::Error(_))
    }
}

impl std::fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemOutcome::Processed => write!(f, "processed"),
            ItemOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            ItemOutcome::Error(err) => write!(f, "error: {}", err),
        }
    }
}

/// Result of merging a single item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemResult {
    /// Raw classname of the item
    pub classname: String,
    /// Resolved base id, when one was selected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_id: Option<String>,
    /// Outcome
    #[serde(serialize_with = "serialize_outcome")]
    pub outcome: ItemOutcome,
    /// Time spent on this item
    #[serde(serialize_with = "serialize_duration_ms", rename = "duration_ms")]
    pub duration: Duration,
    /// Warning messages (if any)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ItemResult {
    /// Create a result with an outcome.
    pub fn new(classname: String, outcome: ItemOutcome, duration: Duration) -> Self {
        Self { classname, base_id: None, outcome, duration, warnings: vec![] }
    }

    /// Create a processed result.
    pub fn processed(classname: String, base_id: String, duration: Duration) -> Self {
        Self::new(classname, ItemOutcome::Processed, duration).with_base_id(base_id)
    }

    /// Create a skipped result.
    pub fn skipped(classname: String, reason: SkipReason, duration: Duration) -> Self {
        Self::new(classname, ItemOutcome::Skipped(reason), duration)
    }

    /// Create an error result.
    pub fn error(classname: String, trace: String, duration: Duration) -> Self {
        Self::new(classname, ItemOutcome::Error(trace), duration)
    }

    /// Set the base id.
    pub fn with_base_id(mut self, base_id: String) -> Self {
        self.base_id = Some(base_id);
        self
    }

    /// Add warnings to the result.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

fn serialize_outcome<S: serde::Serializer>(
    outcome: &ItemOutcome,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(None)?;
    map.serialize_entry("tag", outcome.tag())?;
    match outcome {
        ItemOutcome::Processed => {}
        ItemOutcome::Skipped(reason) => map.serialize_entry("detail", &reason.to_string())?,
        ItemOutcome::Error(trace) => map.serialize_entry("detail", trace)?,
    }
    map.end()
}

fn serialize_duration_ms<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Result of a complete merge run.
#[derive(Debug, Default, Serialize)]
pub struct MergeReport {
    /// Results for each item, in enumeration order
    pub items: Vec<ItemResult>,
    /// Total run duration
    #[serde(serialize_with = "serialize_duration_ms", rename = "total_duration_ms")]
    pub total_duration: Duration,
    /// Whether nothing was written
    pub dry_run: bool,
}

impl MergeReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item result.
    pub fn add_result(&mut self, result: ItemResult) {
        self.items.push(result);
    }

    /// Set the total duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.total_duration = duration;
        self
    }

    /// Count of items per outcome tag.
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.items {
            *counts.entry(item.outcome.tag()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of processed items.
    pub fn processed_count(&self) -> usize {
        self.items.iter().filter(|r| matches!(r.outcome, ItemOutcome::Processed)).count()
    }

    /// Number of skipped items (all reasons).
    pub fn skipped_count(&self) -> usize {
        self.items.iter().filter(|r| r.outcome.is_skipped()).count()
    }

    /// Number of failed items.
    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|r| r.outcome.is_error()).count()
    }

    /// Whether no item failed.
    pub fn is_success(&self) -> bool {
        self.error_count() == 0
    }

    /// Failed item results.
    pub fn errors(&self) -> Vec<&ItemResult> {
        self.items.iter().filter(|r| r.outcome.is_error()).collect()
    }

    /// Result for a classname.
    pub fn get(&self, classname: &str) -> Option<&ItemResult> {
        self.items.iter().find(|r| r.classname == classname)
    }

    /// All warnings, prefixed with their item.
    pub fn all_warnings(&self) -> Vec<String> {
        self.items
            .iter()
            .flat_map(|r| r.warnings.iter().map(move |w| format!("{}: {}", r.classname, w)))
            .collect()
    }

    /// Format a summary of the run.
    ///
    /// Error details are listed only when `show_errors` is set.
    pub fn summary(&self, show_errors: bool) -> String {
        let mut lines = Vec::new();

        let verb = if self.dry_run { "would write" } else { "written" };
        lines.push(format!(
            "Merge complete: {} bundles {}, {} skipped, {} errors ({} items) in {:?}",
            self.processed_count(),
            verb,
            self.skipped_count(),
            self.error_count(),
            self.items.len(),
            self.total_duration
        ));

        for (tag, count) in self.counts() {
            if tag.starts_with("skipped") {
                lines.push(format!("  - {}: {}", tag, count));
            }
        }

        let errors = self.errors();
        if !errors.is_empty() {
            if show_errors {
                lines.push(format!("Errors ({}):", errors.len()));
                for item in errors {
                    lines.push(format!("  - {}: {}", item.classname, item.outcome));
                }
            } else {
                lines.push(format!(
                    "{} items failed (use --show-errors for details)",
                    errors.len()
                ));
            }
        }

        let warnings = self.all_warnings();
        if !warnings.is_empty() {
            lines.push(format!("Warnings ({}):", warnings.len()));
            for warning in warnings.iter().take(5) {
                lines.push(format!("  - {}", warning));
            }
            if warnings.len() > 5 {
                lines.push(format!("  ... and {} more", warnings.len() - 5));
            }
        }

        lines.join("\n")
    }
}
