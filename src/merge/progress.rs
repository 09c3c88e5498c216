//! Batch progress reporting.
//!
//! The batch driver emits [`ProgressEvent`]s to a [`ProgressReporter`]. The
//! console reporter prints human-readable lines (errors always, every item in
//! verbose mode); the JSON reporter prints one JSON object per line.
//!
//! # Example
//!
//! ```ignore
//! use furnimerge::merge::{ConsoleProgress, ProgressEvent, ProgressReporter};
//!
//! let reporter = ConsoleProgress::new().with_verbose(true);
//! reporter.report(ProgressEvent::BatchStarted { total_items: 2, dry_run: false });
//! ```

use std::io::{IsTerminal, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::json;

use crate::merge::ItemOutcome;

/// Events that can be reported during a batch.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Batch started
    BatchStarted {
        /// Number of items scheduled
        total_items: usize,
        /// Whether nothing will be written
        dry_run: bool,
    },
    /// An item reached its final outcome
    ItemCompleted {
        /// Raw classname
        classname: String,
        /// Final outcome
        outcome: ItemOutcome,
        /// Duration in milliseconds
        duration_ms: u64,
    },
    /// Batch completed
    BatchCompleted {
        /// Whether no item errored
        success: bool,
        /// Total duration in milliseconds
        duration_ms: u64,
        /// Number of bundles written (or planned)
        processed: usize,
        /// Number of skipped items
        skipped: usize,
        /// Number of failed items
        failed: usize,
    },
    /// A warning was generated
    Warning {
        /// Item that generated the warning (if applicable)
        classname: Option<String>,
        /// Warning message
        message: String,
    },
}

/// Trait for progress reporters.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event.
    fn report(&self, event: ProgressEvent);

    /// Check if this reporter wants verbose output.
    fn is_verbose(&self) -> bool {
        false
    }
}

/// A progress reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullProgress;

impl NullProgress {
    /// Create a new null progress reporter.
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NullProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Console progress reporter with optional colors.
pub struct ConsoleProgress {
    use_colors: bool,
    verbose: bool,
    current: AtomicUsize,
    total: AtomicUsize,
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .field("current", &self.current)
            .field("total", &self.total)
            .finish()
    }
}

impl ConsoleProgress {
    /// Create a new console progress reporter writing to stderr.
    ///
    /// Colors are used only when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            use_colors: std::io::stderr().is_terminal(),
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a console progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            use_colors: false,
            verbose: false,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            output: Mutex::new(Box::new(output)),
        }
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn cyan(&self, text: &str) -> String {
        self.color(text, "\x1b[36m")
    }

    fn bold(&self, text: &str) -> String {
        self.color(text, "\x1b[1m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", line);
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::BatchStarted { total_items, dry_run } => {
                self.total.store(total_items, Ordering::SeqCst);
                self.current.store(0, Ordering::SeqCst);
                self.writeln(&format!(
                    "{} {} {} item{}...",
                    self.cyan("[merge]"),
                    if dry_run { "Planning" } else { "Merging" },
                    total_items,
                    if total_items == 1 { "" } else { "s" }
                ));
            }
            ProgressEvent::ItemCompleted { classname, outcome, duration_ms } => {
                let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
                if !self.verbose && !outcome.is_error() {
                    return;
                }
                let total = self.total.load(Ordering::SeqCst);

                let status = match &outcome {
                    ItemOutcome::Processed => self.green("ok"),
                    ItemOutcome::Skipped(reason) => self.yellow(reason.tag()),
                    ItemOutcome::Error(_) => self.red("FAILED"),
                };

                self.writeln(&format!(
                    "{} [{}/{}] {} {} ({})",
                    self.cyan("[merge]"),
                    current,
                    total,
                    status,
                    classname,
                    format_duration(duration_ms)
                ));

                if let ItemOutcome::Error(err) = outcome {
                    self.writeln(&format!("        {}", self.red(&err)));
                }
            }
            ProgressEvent::BatchCompleted { success, duration_ms, processed, skipped, failed } => {
                let duration_str = format_duration(duration_ms);
                if success {
                    self.writeln(&format!(
                        "\n{} {} {}, {} skipped in {}",
                        self.green("[done]"),
                        self.bold(&processed.to_string()),
                        if processed == 1 { "bundle" } else { "bundles" },
                        skipped,
                        duration_str
                    ));
                } else {
                    self.writeln(&format!(
                        "\n{} Merge finished with errors: {} processed, {} skipped, {} {} in {}",
                        self.red("[error]"),
                        processed,
                        skipped,
                        failed,
                        if failed == 1 { "failure" } else { "failures" },
                        duration_str
                    ));
                }
            }
            ProgressEvent::Warning { classname, message } => {
                if !self.verbose {
                    return;
                }
                let prefix = match classname {
                    Some(name) => format!("{}: ", name),
                    None => String::new(),
                };
                self.writeln(&format!("{} {}{}", self.yellow("[warn]"), prefix, message));
            }
        }
    }

    fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// JSON-lines progress reporter for machine-readable output.
pub struct JsonProgress {
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for JsonProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonProgress").finish()
    }
}

impl JsonProgress {
    /// Create a new JSON progress reporter writing to stderr.
    pub fn new() -> Self {
        Self { output: Mutex::new(Box::new(std::io::stderr())) }
    }

    /// Create a JSON progress reporter that writes to a custom output.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { output: Mutex::new(Box::new(output)) }
    }

    fn write_json(&self, value: &serde_json::Value) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{}", value);
        }
    }
}

impl Default for JsonProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let value = match event {
            ProgressEvent::BatchStarted { total_items, dry_run } => {
                json!({ "event": "batch_started", "total_items": total_items, "dry_run": dry_run })
            }
            ProgressEvent::ItemCompleted { classname, outcome, duration_ms } => {
                let mut value = json!({
                    "event": "item_completed",
                    "classname": classname,
                    "outcome": outcome.tag(),
                    "duration_ms": duration_ms,
                });
                match &outcome {
                    ItemOutcome::Processed => {}
                    ItemOutcome::Skipped(reason) => value["detail"] = json!(reason.to_string()),
                    ItemOutcome::Error(err) => value["error"] = json!(err),
                }
                value
            }
            ProgressEvent::BatchCompleted { success, duration_ms, processed, skipped, failed } => {
                json!({
                    "event": "batch_completed",
                    "success": success,
                    "duration_ms": duration_ms,
                    "processed": processed,
                    "skipped": skipped,
                    "failed": failed,
                })
            }
            ProgressEvent::Warning { classname, message } => {
                let mut value = json!({ "event": "warning", "message": message });
                if let Some(name) = classname {
                    value["classname"] = json!(name);
                }
                value
            }
        };
        self.write_json(&value);
    }
}

/// Format a duration in milliseconds to a human-readable string.
pub fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60_000;
        let seconds = (ms % 60_000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}
