//! Rewrite script references inside a materialized package.
//!
//! # Examples
//!
//! ```bash
//! pspack rewrite-refs --config package-config.json --package-path dist
//! pspack rewrite-refs --config package-config.json --package-path dist --backup
//! pspack rewrite-refs --config package-config.json --package-path dist --dry-run
//! pspack rewrite-refs --config dist/package-config.json --package-path dist --search-paths ~/Modules
//! ```
//!
//! References are resolved the way `analyze` resolved them: next to their
//! script first, then through the search paths. Without `--search-paths` the
//! paths recorded by `auto-package` in the configuration are used, and failing
//! that the project root.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::{EXIT_PARTIAL_FAILURE, expand_path, expand_paths, project_root};
use crate::config::load_configuration;
use crate::packager::{RewriteOptions, rewrite_references};

/// Command to rewrite references after packaging.
#[derive(Args, Debug)]
pub struct RewriteRefsCommand {
    /// Package configuration the package was built from
    #[arg(long, value_name = "PATH")]
    config: String,

    /// Root of the materialized package
    #[arg(long, value_name = "PATH")]
    package_path: String,

    /// Root of the original scripts (default: current directory)
    #[arg(long, value_name = "PATH")]
    project_root: Option<String>,

    /// Directories tried, in order, for references not found next to their script
    #[arg(long, num_args = 1.., value_name = "PATH")]
    search_paths: Vec<String>,

    /// Keep a `.bak` copy of every rewritten script
    #[arg(long)]
    backup: bool,

    /// Count the changes without writing them
    #[arg(long)]
    dry_run: bool,
}

impl RewriteRefsCommand {
    /// Exits 0 when every script was processed and 1 when any failed.
    pub fn execute(self, _config: &CliConfig) -> Result<i32> {
        let package_config = load_configuration(&expand_path(&self.config)?)?;
        let package_path = expand_path(&self.package_path)?;

        let search_roots = if self.search_paths.is_empty() {
            package_config
                .dependency_metadata
                .as_ref()
                .map(|metadata| metadata.search_paths.clone())
                .unwrap_or_default()
        } else {
            expand_paths(&self.search_paths)?
        };

        let options = RewriteOptions {
            project_root: project_root(self.project_root.as_deref())?,
            search_roots,
            create_backups: self.backup,
            dry_run: self.dry_run,
        };
        let result = rewrite_references(&package_config, &package_path, &options)?;

        let verb = if self.dry_run { "Would update" } else { "Updated" };
        let mark = if result.success { "✓".green() } else { "✗".red() };
        println!(
            "{mark} {verb} {} reference(s) in {} script(s)",
            result.paths_updated, result.scripts_updated
        );
        for record in &result.records {
            println!(
                "  {}:{} {} -> {}",
                record.file.display(),
                record.line,
                record.old_text.bright_black(),
                record.new_text.cyan()
            );
        }
        for failure in &result.failures {
            println!("  {} {}: {}", "failed".red(), failure.file.display(), failure.reason);
        }

        Ok(if result.success { 0 } else { EXIT_PARTIAL_FAILURE })
    }
}
