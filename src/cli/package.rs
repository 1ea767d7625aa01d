//! Materialize a package from a configuration file.
//!
//! # Examples
//!
//! ```bash
//! pspack package --config package-config.json --output dist
//! pspack package --config package-config.json --output dist --force
//! pspack package --config build/package-config.json --output dist --project-root src --dry-run
//! ```

use anyhow::Result;
use clap::Args;
use tracing::debug;

use super::CliConfig;
use super::common::{expand_path, manifest_exit_code, print_manifest_summary, progress_bar, project_root};
use crate::config::load_configuration;
use crate::packager::{PackageOptions, materialize};

/// Command to materialize a package.
#[derive(Args, Debug)]
pub struct PackageCommand {
    /// Package configuration file
    #[arg(long, value_name = "PATH")]
    config: String,

    /// Package root to create
    #[arg(long, value_name = "PATH")]
    output: String,

    /// Directory that `source` patterns are evaluated against (default: current directory)
    #[arg(long, value_name = "PATH")]
    project_root: Option<String>,

    /// Package into a non-empty output directory
    #[arg(long)]
    force: bool,

    /// Report what would be packaged without writing anything
    #[arg(long)]
    dry_run: bool,
}

impl PackageCommand {
    /// Exits 0 when every file succeeded and 1 when any file failed.
    pub fn execute(self, config: &CliConfig) -> Result<i32> {
        let config_path = expand_path(&self.config)?;
        let output = expand_path(&self.output)?;
        let package_config = load_configuration(&config_path)?;

        let options = PackageOptions {
            project_root: project_root(self.project_root.as_deref())?,
            dry_run: self.dry_run,
            force: self.force,
        };
        debug!("Packaging with {:?}", options);

        let progress = progress_bar(config);
        let manifest = materialize(&package_config, &output, &options, &progress)?;
        progress.finish_and_clear();

        print_manifest_summary(&manifest, &output);
        Ok(manifest_exit_code(&manifest))
    }
}
