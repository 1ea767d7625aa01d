//! Command-line interface for pspack.
//!
//! Each command lives in its own module with a clap `Args` struct and an
//! `execute` method returning the process exit code.
//!
//! # Available Commands
//!
//! - `analyze` - print the dependency graph of one or more starting scripts
//! - `package` - materialize a package from a `package-config.json`
//! - `auto-package` - analyze, synthesize a configuration, then package
//! - `rewrite-refs` - fix script references inside a materialized package
//!
//! # Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Everything succeeded |
//! | 1 | The run completed but some files failed |
//! | 2 | Nothing ran: invalid input, invalid configuration, or output conflict |
//!
//! # Global Options
//!
//! - `--verbose` - debug logging
//! - `--quiet` - errors only, no progress bars
//! - `--no-progress` - disable progress bars (also `PSPACK_NO_PROGRESS`)
//!
//! # Example
//!
//! ```bash
//! pspack analyze --starting-files Main.ps1 --search-paths ./lib
//! pspack package --config package-config.json --output dist --force
//! pspack rewrite-refs --config package-config.json --package-path dist --backup
//! ```

mod analyze;
mod auto_package;
pub mod common;
mod package;
mod rewrite_refs;


use anyhow::Result;
use clap::{Parser, Subcommand};

/// Environment variable that disables progress bars when set to anything.
pub const NO_PROGRESS_ENV: &str = "PSPACK_NO_PROGRESS";

/// Runtime configuration derived from the global flags.
///
/// Threaded explicitly into every command so that nothing reads ambient
/// process state after startup except [`CliConfig::progress_enabled`].
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Default log filter used when `RUST_LOG` is not set.
    pub log_level: Option<String>,

    /// Disable progress bars.
    pub no_progress: bool,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether commands may draw progress bars.
    #[must_use]
    pub fn progress_enabled(&self) -> bool {
        !self.no_progress && std::env::var_os(NO_PROGRESS_ENV).is_none()
    }
}

/// Dependency-aware packager for PowerShell script projects.
#[derive(Parser, Debug)]
#[command(
    name = "pspack",
    about = "Dependency-aware packager for PowerShell script projects",
    version,
    long_about = "pspack follows dot-source and Import-Module references from your entry scripts, \
                  then copies exactly the files they need into a self-contained package."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging on stderr.
    ///
    /// Equivalent to `RUST_LOG=debug`; an explicit `RUST_LOG` still wins.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors; implies `--no-progress`.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable progress bars.
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze the dependency graph of starting scripts.
    ///
    /// See [`analyze::AnalyzeCommand`].
    Analyze(analyze::AnalyzeCommand),

    /// Materialize a package from a configuration file.
    ///
    /// See [`package::PackageCommand`].
    Package(package::PackageCommand),

    /// Analyze, synthesize a configuration and package in one step.
    ///
    /// See [`auto_package::AutoPackageCommand`].
    AutoPackage(auto_package::AutoPackageCommand),

    /// Rewrite script references inside a materialized package.
    ///
    /// See [`rewrite_refs::RewriteRefsCommand`].
    RewriteRefs(rewrite_refs::RewriteRefsCommand),
}

impl Cli {
    /// Executes the parsed command and returns the process exit code.
    ///
    /// Errors are operation-level failures (bad input, invalid configuration,
    /// output conflicts); map them with [`crate::core::exit_code_for`].
    pub fn execute(self) -> Result<i32> {
        let config = self.build_config();
        self.execute_with_config(&config)
    }

    /// Builds a [`CliConfig`] from the global flags.
    ///
    /// `--verbose` selects `debug`, `--quiet` selects `error`, and the default
    /// is `warn` so that stdout stays reserved for command output.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: Some(log_level.to_string()),
            no_progress: self.no_progress || self.quiet,
        }
    }

    /// Executes the command with an explicit configuration.
    pub fn execute_with_config(self, config: &CliConfig) -> Result<i32> {
        match self.command {
            Commands::Analyze(cmd) => cmd.execute(config),
            Commands::Package(cmd) => cmd.execute(config),
            Commands::AutoPackage(cmd) => cmd.execute(config),
            Commands::RewriteRefs(cmd) => cmd.execute(config),
        }
    }
}
