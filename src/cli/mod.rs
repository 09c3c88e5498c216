//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod merge;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::merge::CopyPolicy;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// furnimerge - Merge extracted furniture renders with API metadata into bundles
#[derive(Parser)]
#[command(name = "furnimerge")]
#[command(about = "Merge extracted furniture renders with API metadata into per-item bundles")]
#[command(version)]
pub struct Cli {
    /// Show per-item progress and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Input/output locations shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Config file (default: furnimerge.toml found from the working directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Raw asset directory (one folder per item)
    #[arg(long)]
    pub raw: Option<PathBuf>,

    /// Metadata directory (one folder per variant key)
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// Bundle output directory
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge every item into its bundle
    Merge {
        #[command(flatten)]
        paths: PathArgs,

        /// Number of worker threads (0 = available parallelism)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// What to do with images already present in a bundle
        #[arg(long, value_enum)]
        copy_policy: Option<CopyPolicy>,

        /// Plan every item and report outcomes without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Only merge this item (repeatable)
        #[arg(long = "item", value_name = "CLASSNAME")]
        items: Vec<String>,

        /// Write the full run report as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// List error details in the summary
        #[arg(long)]
        show_errors: bool,

        /// Emit progress as JSON lines and the report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Plan one item and print its bundle document
    Inspect {
        /// Raw classname of the item
        classname: String,

        #[command(flatten)]
        paths: PathArgs,
    },
}

/// Initialise logging: `RUST_LOG` wins, otherwise warn (debug with `-v`).
fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = verbose_level(verbose, std::env::var_os("RUST_LOG").is_some()) {
        builder.filter_level(level);
    }
    let _ = builder.target(env_logger::Target::Stderr).try_init();
}

/// Level forced by `-v`, unless `RUST_LOG` already sets the filter.
fn verbose_level(verbose: bool, rust_log_set: bool) -> Option<log::LevelFilter> {
    (verbose && !rust_log_set).then_some(log::LevelFilter::Debug)
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Merge { paths, jobs, copy_policy, dry_run, items, report, show_errors, json } => {
            merge::run_merge(merge::MergeOptions {
                paths,
                jobs,
                copy_policy,
                dry_run,
                items,
                report,
                show_errors,
                json,
                verbose: cli.verbose,
            })
        }
        Commands::Inspect { classname, paths } => {
            merge::run_inspect(&classname, &paths, cli.verbose)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_merge_flags() {
        let cli = Cli::try_parse_from([
            "furnimerge",
            "merge",
            "--raw",
            "raw",
            "--item",
            "sofa_red",
            "--item",
            "chair_plasto",
            "--copy-policy",
            "checksum",
            "-j",
            "2",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Merge { paths, jobs, copy_policy, items, dry_run, .. } => {
                assert_eq!(paths.raw, Some(PathBuf::from("raw")));
                assert_eq!(jobs, Some(2));
                assert_eq!(copy_policy, Some(CopyPolicy::Checksum));
                assert_eq!(items, vec!["sofa_red", "chair_plasto"]);
                assert!(!dry_run);
            }
            Commands::Inspect { .. } => panic!("expected merge"),
        }
    }

    #[test]
    fn test_parse_inspect() {
        let cli = Cli::try_parse_from(["furnimerge", "inspect", "chair_plasto", "--out", "o"])
            .unwrap();
        match cli.command {
            Commands::Inspect { classname, paths } => {
                assert_eq!(classname, "chair_plasto");
                assert_eq!(paths.out, Some(PathBuf::from("o")));
            }
            Commands::Merge { .. } => panic!("expected inspect"),
        }
    }

    #[test]
    fn test_unknown_copy_policy_rejected() {
        let result = Cli::try_parse_from(["furnimerge", "merge", "--copy-policy", "never"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rust_log_overrides_verbose_flag() {
        assert_eq!(verbose_level(true, false), Some(log::LevelFilter::Debug));
        assert_eq!(verbose_level(true, true), None);
        assert_eq!(verbose_level(false, false), None);
    }
}
