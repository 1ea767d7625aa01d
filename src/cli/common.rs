//! Helpers shared by the CLI commands

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use super::CliConfig;
use crate::core::PackError;
use crate::packager::{Outcome, PackageManifest};
use crate::utils::fs::absolutize;
use crate::utils::progress::ProgressBar;

/// Exit code for a run that completed with per-file failures.
pub const EXIT_PARTIAL_FAILURE: i32 = 1;

/// Expands `~` and environment variables in a command-line path.
///
/// # Errors
///
/// Fails when the path names an undefined environment variable.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw).with_context(|| {
        format!(
            "Failed to expand environment variables in path: {raw}\n\n\
             Use $VAR or ${{VAR}} for variables that are set in the environment"
        )
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Expands every path in `raw`, in order.
pub fn expand_paths(raw: &[String]) -> Result<Vec<PathBuf>> {
    raw.iter().map(|path| expand_path(path)).collect()
}

/// Resolves `--starting-files`, rejecting an empty list as an input error.
pub fn starting_files(raw: &[String]) -> Result<Vec<PathBuf>> {
    if raw.is_empty() {
        return Err(PackError::EmptyStartingFiles.into());
    }
    Ok(expand_paths(raw)?.iter().map(|path| absolutize(path)).collect())
}

/// The project root: the given path, or the current directory.
pub fn project_root(explicit: Option<&str>) -> Result<PathBuf> {
    match explicit {
        Some(raw) => Ok(absolutize(&expand_path(raw)?)),
        None => std::env::current_dir().context("Failed to determine the current directory"),
    }
}

/// A progress bar honoring `--no-progress`, `--quiet` and `PSPACK_NO_PROGRESS`.
#[must_use]
pub fn progress_bar(config: &CliConfig) -> ProgressBar {
    ProgressBar::new(0, config.progress_enabled())
}

/// Prints a one-line-per-problem summary of a materialization to stdout.
pub fn print_manifest_summary(manifest: &PackageManifest, display_root: &Path) {
    let prefix = if manifest.dry_run { "Would package" } else { "Packaged" };
    let success = manifest.count(Outcome::Success);
    let skipped = manifest.count(Outcome::Skipped);
    let failed = manifest.count(Outcome::Failed);

    let mark = if failed == 0 { "✓".green() } else { "✗".red() };
    println!(
        "{mark} {prefix} {} file(s) into {} ({} skipped, {} failed)",
        success,
        display_root.display(),
        skipped,
        if failed == 0 { failed.to_string().normal() } else { failed.to_string().red() }
    );

    for record in manifest.files.iter().filter(|record| record.outcome != Outcome::Success) {
        let label = match record.outcome {
            Outcome::Failed => "failed".red(),
            _ => "skipped".yellow(),
        };
        println!(
            "  {label} {} -> {}: {}",
            record.source.display(),
            record.destination,
            record.reason.as_deref().unwrap_or("")
        );
    }

    for action in &manifest.post_package_results {
        if action.outcome == Outcome::Failed {
            println!(
                "  {} {} {}: {}",
                "post-package failed".red(),
                action.kind,
                action.path,
                action.reason.as_deref().unwrap_or("")
            );
        }
    }

    for warning in &manifest.warnings {
        println!("  {} {warning}", "warning".yellow());
    }
}

/// Exit code for a completed materialization.
#[must_use]
pub fn manifest_exit_code(manifest: &PackageManifest) -> i32 {
    if manifest.has_failures() { EXIT_PARTIAL_FAILURE } else { 0 }
}
