//! Merge command implementations (merge, inspect)

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use super::{PathArgs, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::config::loader::{find_config, load_config, merge_cli_overrides, project_root};
use crate::config::{default_config, CliOverrides, ConfigError};
use crate::merge::{
    error_chain, inspect_item, ConsoleProgress, CopyPolicy, JsonProgress, MergeContext,
    ParallelMerge, Planned, ProgressReporter,
};

/// Options for the merge command
#[derive(Debug, Default)]
pub struct MergeOptions {
    pub paths: PathArgs,
    pub jobs: Option<usize>,
    pub copy_policy: Option<CopyPolicy>,
    pub dry_run: bool,
    pub items: Vec<String>,
    pub report: Option<PathBuf>,
    pub show_errors: bool,
    pub json: bool,
    pub verbose: bool,
}

/// Run the merge command
pub fn run_merge(options: MergeOptions) -> ExitCode {
    let overrides = CliOverrides {
        jobs: options.jobs,
        copy_policy: options.copy_policy,
        ..path_overrides(&options.paths)
    };
    let context = match load_context(&options.paths, &overrides, options.verbose) {
        Ok(ctx) => ctx,
        Err(code) => return ExitCode::from(code),
    };
    let mut context = context.with_dry_run(options.dry_run);
    if !options.items.is_empty() {
        context = context.with_filter(options.items.clone());
    }

    let reporter: Arc<dyn ProgressReporter> = if options.json {
        Arc::new(JsonProgress::new())
    } else {
        Arc::new(ConsoleProgress::new().with_verbose(options.verbose))
    };

    let report = match ParallelMerge::new(context).with_reporter(reporter).run() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", error_chain(&e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if let Some(path) = &options.report {
        let written = serde_json::to_string_pretty(&report)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(path, json + "\n").map_err(|e| e.to_string()));
        if let Err(e) = written {
            eprintln!("Error writing report {}: {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    if options.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing report: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else if report.is_success() {
        println!("{}", report.summary(options.show_errors));
    } else {
        eprintln!("{}", report.summary(options.show_errors));
    }

    if report.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Run the inspect command
pub fn run_inspect(classname: &str, paths: &PathArgs, verbose: bool) -> ExitCode {
    let context = match load_context(paths, &path_overrides(paths), verbose) {
        Ok(ctx) => ctx.with_dry_run(true),
        Err(code) => return ExitCode::from(code),
    };

    match inspect_item(&context, classname) {
        Ok(Planned::Ready(plan)) => {
            for warning in &plan.warnings {
                eprintln!("warning: {}", warning);
            }
            match plan.bundle.to_json() {
                Ok(json) => {
                    print!("{}", json);
                    if verbose {
                        eprintln!(
                            "{} -> {} ({} files)",
                            classname,
                            context.bundle_dir(plan.base_id()).display(),
                            plan.copies.len()
                        );
                    }
                    ExitCode::from(EXIT_SUCCESS)
                }
                Err(e) => {
                    eprintln!("Error serializing bundle: {}", e);
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
        Ok(Planned::Skipped { reason, warnings, .. }) => {
            for warning in &warnings {
                eprintln!("warning: {}", warning);
            }
            println!("{}: {} ({})", classname, reason.tag(), reason);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", error_chain(&e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// CLI paths are relative to the working directory, not the project root.
fn path_overrides(paths: &PathArgs) -> CliOverrides {
    let cwd = std::env::current_dir().unwrap_or_default();
    let absolute = |p: &Option<PathBuf>| p.as_ref().map(|p| cwd.join(p));
    CliOverrides {
        raw: absolute(&paths.raw),
        metadata: absolute(&paths.metadata),
        out: absolute(&paths.out),
        ..Default::default()
    }
}

/// Load config, apply overrides, and build the context.
///
/// Returns the exit code on failure.
fn load_context(
    paths: &PathArgs,
    overrides: &CliOverrides,
    verbose: bool,
) -> Result<MergeContext, u8> {
    let config_path = paths.config.clone().or_else(find_config);

    let (config, root) = match &config_path {
        Some(path) => {
            if verbose {
                eprintln!("Using config: {}", path.display());
            }
            let config = load_config(Some(path)).map_err(|e| {
                eprintln!("Error loading config: {}", e);
                config_exit_code(&e)
            })?;
            let root = project_root(path)
                .map(Path::to_path_buf)
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
            (config, root)
        }
        None => {
            if verbose {
                eprintln!("No furnimerge.toml found, using defaults");
            }
            (default_config(), std::env::current_dir().unwrap_or_default())
        }
    };

    let config = merge_cli_overrides(config, overrides).map_err(|e| {
        eprintln!("Error: {}", e);
        config_exit_code(&e)
    })?;

    Ok(MergeContext::new(config, root))
}

/// Validation failures are usage errors; anything else is a runtime failure.
fn config_exit_code(error: &ConfigError) -> u8 {
    match error {
        ConfigError::Validation(_) => EXIT_INVALID_ARGS,
        _ => EXIT_ERROR,
    }
}
