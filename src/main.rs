//! furnimerge - Command-line tool for merging furniture render assets with metadata

use std::process::ExitCode;

use furnimerge::cli;

fn main() -> ExitCode {
    cli::run()
}
