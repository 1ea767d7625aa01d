//! Turning analyses and configurations into package trees.
//!
//! - [`synthesizer`] builds a [`PackageConfiguration`](crate::config::PackageConfiguration)
//!   from a dependency analysis
//! - [`materializer`] executes a configuration into an output directory and
//!   produces a [`PackageManifest`]
//! - [`actions`] performs individual file and post-package actions
//! - [`rewriter`] fixes script references after files have moved
//!
//! # Example
//!
//! ```rust,no_run
//! use pspack::config::load_configuration;
//! use pspack::packager::{PackageOptions, RewriteOptions, materialize, rewrite_references};
//! use pspack::utils::progress::ProgressBar;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = load_configuration(Path::new("package-config.json"))?;
//! let manifest = materialize(&config, Path::new("dist"), &PackageOptions::new("."), &ProgressBar::hidden())?;
//! if !manifest.has_failures() {
//!     rewrite_references(&config, Path::new("dist"), &RewriteOptions::new("."))?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod manifest;
pub mod materializer;
pub mod rewriter;
pub mod synthesizer;

pub use manifest::{ActionRecord, FileRecord, MANIFEST_FILE_NAME, Outcome, PackageManifest};
pub use materializer::{PackageOptions, PackagePlan, materialize, plan};
pub use rewriter::{RewriteOptions, RewriteResult, rewrite_references};
pub use synthesizer::{project_root_for, synthesize};
