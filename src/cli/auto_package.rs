//! Analyze, synthesize a configuration and package in one step.
//!
//! The synthesized configuration is written next to the package as
//! `package-config.json` so it can be reviewed, edited and fed back into
//! `pspack package`. With `--dry-run` it is printed instead.
//!
//! # Examples
//!
//! ```bash
//! pspack auto-package --starting-files Main.ps1 --output dist
//! pspack auto-package --starting-files Main.ps1 --output dist --name tools --search-paths ~/Modules
//! pspack auto-package --starting-files Main.ps1 --output dist --dry-run
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use super::CliConfig;
use super::common::{
    expand_path, expand_paths, manifest_exit_code, print_manifest_summary, progress_bar,
    project_root, starting_files,
};
use crate::config::{CONFIG_FILE_NAME, save_configuration, to_json};
use crate::packager::{PackageOptions, materialize, project_root_for, synthesize};
use crate::resolver::{DEFAULT_MAX_DEPTH, GraphOptions, build_graph};

/// Command to package everything a set of scripts depends on.
#[derive(Args, Debug)]
pub struct AutoPackageCommand {
    /// Scripts to start the analysis from
    #[arg(long, num_args = 1.., value_name = "PATH")]
    starting_files: Vec<String>,

    /// Package root to create
    #[arg(long, value_name = "PATH")]
    output: String,

    /// Directories tried, in order, for references not found next to their script
    #[arg(long, num_args = 1.., value_name = "PATH")]
    search_paths: Vec<String>,

    /// Files deeper than this are packaged but not analyzed
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Package name (default: the first starting file's name without extension)
    #[arg(long)]
    name: Option<String>,

    /// Package into a non-empty output directory
    #[arg(long)]
    force: bool,

    /// Report what would be packaged and print the configuration without writing anything
    #[arg(long)]
    dry_run: bool,
}

impl AutoPackageCommand {
    /// Same exit codes as `package`.
    pub fn execute(self, config: &CliConfig) -> Result<i32> {
        let starting_files = starting_files(&self.starting_files)?;
        let output = expand_path(&self.output)?;

        let search_roots = if self.search_paths.is_empty() {
            vec![project_root(None)?]
        } else {
            expand_paths(&self.search_paths)?
        };
        let result = build_graph(
            &starting_files,
            &GraphOptions {
                search_roots,
                max_depth: self.max_depth,
            },
        )?;

        let name = self.name.clone().unwrap_or_else(|| default_name(result.starting_files.first()));
        let package_config = synthesize(&result, &name);
        package_config.validate()?;
        info!(
            "Synthesized '{}' with {} file groups from {} files",
            name,
            package_config.files.len(),
            result.all_files.len()
        );

        let options = PackageOptions {
            project_root: project_root_for(&result),
            dry_run: self.dry_run,
            force: self.force,
        };
        let progress = progress_bar(config);
        let manifest = materialize(&package_config, &output, &options, &progress)?;
        progress.finish_and_clear();

        print_manifest_summary(&manifest, &output);

        if self.dry_run {
            println!();
            println!("{}", "Synthesized configuration:".bold());
            print!("{}", to_json(&package_config)?);
        } else {
            let config_path = output.join(CONFIG_FILE_NAME);
            save_configuration(&package_config, &config_path)
                .with_context(|| format!("Failed to write {}", config_path.display()))?;
            println!("Configuration written to {}", config_path.display());
        }

        Ok(manifest_exit_code(&manifest))
    }
}

fn default_name(first: Option<&PathBuf>) -> String {
    first
        .and_then(|path| path.file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "package".to_string())
}
