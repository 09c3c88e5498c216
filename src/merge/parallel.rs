//! Parallel batch execution.
//!
//! # How It Works
//!
//! 1. Check the input roots and build the metadata index once
//! 2. Plan every item on a pool of scoped worker threads (no writes)
//! 3. Assign each `base_id` to exactly one item (see [`Claims`])
//! 4. Write the owned bundles on the same pool
//!
//! Each unit runs under `catch_unwind`, so a panicking item becomes an `error`
//! outcome instead of taking the batch down.
//!
//! # Example
//!
//! ```ignore
//! use furnimerge::merge::{MergeContext, ParallelMerge};
//!
//! let context = MergeContext::new(config, project_root);
//! let report = ParallelMerge::new(context).with_jobs(4).run()?;
//! println!("{}", report.summary(false));
//! ```

use std::any::Any;
use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::merge::{
    discover_items, error_chain, plan_item, write_plan, BatchError, Claims, ItemPlan, ItemResult,
    MergeContext, MergeReport, MetadataIndex, NullProgress, Planned, ProgressEvent, ProgressReporter,
    RawItem, SkipReason,
};

/// Parallel merge executor.
pub struct ParallelMerge {
    /// Merge context
    context: MergeContext,
    /// Number of parallel jobs
    jobs: usize,
    /// Progress sink
    reporter: Arc<dyn ProgressReporter>,
}

impl ParallelMerge {
    /// Create a new parallel merge sized from the context.
    pub fn new(context: MergeContext) -> Self {
        let jobs = context.jobs();
        Self { context, jobs, reporter: Arc::new(NullProgress::new()) }
    }

    /// Set the number of parallel jobs.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Set the progress reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Get the number of parallel jobs.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Get the merge context.
    pub fn context(&self) -> &MergeContext {
        &self.context
    }

    /// Run the batch.
    ///
    /// Fails only on preconditions, before any item is scheduled.
    pub fn run(&self) -> Result<MergeReport, BatchError> {
        let start = Instant::now();
        let ctx = &self.context;

        let raw_dir = ctx.raw_dir();
        if !raw_dir.is_dir() {
            return Err(BatchError::MissingRawRoot(raw_dir));
        }
        let index = MetadataIndex::build(&ctx.metadata_dir(), &ctx.files().metadata)?;
        let items = self.select_items(&raw_dir)?;

        if !ctx.is_dry_run() {
            let out_dir = ctx.out_dir();
            fs::create_dir_all(&out_dir)
                .map_err(|source| BatchError::Io { path: out_dir, source })?;
        }

        log::info!(
            "Merging {} items with {} workers{}",
            items.len(),
            self.jobs,
            if ctx.is_dry_run() { " (dry run)" } else { "" }
        );
        self.reporter.report(ProgressEvent::BatchStarted {
            total_items: items.len(),
            dry_run: ctx.is_dry_run(),
        });

        let results = self.execute(&index, &items);

        let mut report = MergeReport::new();
        report.dry_run = ctx.is_dry_run();
        for result in results {
            for warning in &result.warnings {
                self.reporter.report(ProgressEvent::Warning {
                    classname: Some(result.classname.clone()),
                    message: warning.clone(),
                });
            }
            self.reporter.report(ProgressEvent::ItemCompleted {
                classname: result.classname.clone(),
                outcome: result.outcome.clone(),
                duration_ms: result.duration.as_millis() as u64,
            });
            report.add_result(result);
        }
        let report = report.with_duration(start.elapsed());

        self.reporter.report(ProgressEvent::BatchCompleted {
            success: report.is_success(),
            duration_ms: report.total_duration.as_millis() as u64,
            processed: report.processed_count(),
            skipped: report.skipped_count(),
            failed: report.error_count(),
        });
        Ok(report)
    }

    /// Discover raw items and apply the item filter.
    fn select_items(&self, raw_dir: &std::path::Path) -> Result<Vec<RawItem>, BatchError> {
        let items = discover_items(raw_dir, self.context.files())
            .map_err(|source| BatchError::Io { path: raw_dir.to_path_buf(), source })?;

        let Some(filter) = self.context.item_filter() else {
            return Ok(items);
        };
        for name in filter {
            if !items.iter().any(|item| &item.classname == name) {
                self.reporter.report(ProgressEvent::Warning {
                    classname: Some(name.clone()),
                    message: "no raw asset directory for this item".to_string(),
                });
            }
        }
        Ok(items.into_iter().filter(|item| self.context.accepts(&item.classname)).collect())
    }

    /// Plan, claim and write; one result per item in enumeration order.
    fn execute(&self, index: &MetadataIndex, items: &[RawItem]) -> Vec<ItemResult> {
        let ctx = &self.context;

        let planned = run_pool(self.jobs, items, |item| plan_item(index, item));

        let mut results: Vec<Option<ItemResult>> = Vec::with_capacity(items.len());
        let mut ready: Vec<(usize, ItemPlan, Duration)> = Vec::new();
        for (idx, (item, (outcome, duration))) in items.iter().zip(planned).enumerate() {
            let classname = item.classname.clone();
            let result = match outcome {
                Ok(Ok(Planned::Ready(plan))) => {
                    ready.push((idx, plan, duration));
                    None
                }
                Ok(Ok(Planned::Skipped { reason, base_id, warnings })) => {
                    let mut result =
                        ItemResult::skipped(classname, reason, duration).with_warnings(warnings);
                    result.base_id = base_id;
                    Some(result)
                }
                Ok(Err(err)) => Some(ItemResult::error(classname, error_chain(&err), duration)),
                Err(panic) => Some(ItemResult::error(classname, panic, duration)),
            };
            results.push(result);
        }

        let claims: Claims =
            ready.iter().map(|(_, plan, _)| (plan.base_id(), plan.classname.as_str())).collect();

        let mut owned = Vec::new();
        for (idx, plan, duration) in ready {
            match claims.owner(plan.base_id()) {
                Some(owner) if owner != plan.classname => {
                    log::warn!(
                        "{}: base_id '{}' is owned by {}",
                        plan.classname,
                        plan.base_id(),
                        owner
                    );
                    let reason = SkipReason::DuplicateBaseId {
                        base_id: plan.base_id().to_string(),
                        owner: owner.to_string(),
                    };
                    results[idx] = Some(
                        ItemResult::skipped(plan.classname.clone(), reason, duration)
                            .with_base_id(plan.base_id().to_string())
                            .with_warnings(plan.warnings),
                    );
                }
                _ => owned.push((idx, plan, duration)),
            }
        }

        if ctx.is_dry_run() {
            for (idx, plan, duration) in owned {
                results[idx] = Some(finish(plan, Vec::new(), duration));
            }
        } else {
            let policy = ctx.copy_policy();
            let written = run_pool(self.jobs, &owned, |(_, plan, _)| {
                write_plan(plan, &ctx.bundle_dir(plan.base_id()), policy)
            });
            for ((idx, plan, plan_duration), (outcome, duration)) in owned.into_iter().zip(written) {
                let duration = plan_duration + duration;
                results[idx] = Some(match outcome {
                    Ok(Ok(warnings)) => finish(plan, warnings, duration),
                    Ok(Err(err)) => ItemResult::error(plan.classname, error_chain(&err), duration)
                        .with_base_id(plan.bundle.base_id),
                    Err(panic) => ItemResult::error(plan.classname, panic, duration)
                        .with_base_id(plan.bundle.base_id),
                });
            }
        }

        results
            .into_iter()
            .zip(items)
            .map(|(result, item)| {
                result.unwrap_or_else(|| {
                    ItemResult::error(
                        item.classname.clone(),
                        "item produced no outcome".to_string(),
                        Duration::ZERO,
                    )
                })
            })
            .collect()
    }
}

fn finish(plan: ItemPlan, write_warnings: Vec<String>, duration: Duration) -> ItemResult {
    let mut warnings = plan.warnings;
    warnings.extend(write_warnings);
    ItemResult::processed(plan.classname, plan.bundle.base_id, duration).with_warnings(warnings)
}

/// Run `work` over `inputs` on up to `jobs` scoped threads.
///
/// Results come back in input order with their duration. A panic inside
/// `work` is returned as `Err` with the panic message.
pub fn run_pool<T, R, F>(jobs: usize, inputs: &[T], work: F) -> Vec<(Result<R, String>, Duration)>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let run_one = |input: &T| {
        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| work(input))).map_err(panic_message);
        (outcome, start.elapsed())
    };

    if jobs <= 1 || inputs.len() <= 1 {
        return inputs.iter().map(run_one).collect();
    }

    let results = Mutex::new(Vec::with_capacity(inputs.len()));
    let next_idx = AtomicUsize::new(0);

    std::thread::scope(|s| {
        for _ in 0..jobs.min(inputs.len()) {
            s.spawn(|| loop {
                let idx = next_idx.fetch_add(1, Ordering::SeqCst);
                if idx >= inputs.len() {
                    break;
                }
                let result = run_one(&inputs[idx]);
                results
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push((idx, result));
            });
        }
    });

    // Sort results by original index to keep enumeration order
    let mut results = results.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, r)| r).collect()
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("panic: {}", detail)
}
