//! pspack - dependency-aware packager for PowerShell script projects
//!
//! pspack follows dot-source (`. .\lib\Config.ps1`), `Import-Module` and
//! `using module` references from one or more entry scripts, builds the
//! dependency graph, and copies exactly the files that graph needs into a
//! self-contained package directory.
//!
//! # Architecture Overview
//!
//! Data flows in one direction:
//!
//! ```text
//! starting files ──▶ resolver::build_graph ──▶ DependencyGraphResult
//!                                                  │
//!                       packager::synthesize ◀─────┘
//!                                │
//!   package-config.json ──▶ PackageConfiguration ──▶ packager::materialize ──▶ PackageManifest
//!                                                                 │
//!                                         packager::rewrite_references ◀─┘
//! ```
//!
//! Per-item problems (an unresolved reference, one failed copy, a post-package
//! script that exits non-zero) are recorded as data in the results; only
//! operation-level problems (empty input, invalid configuration, an occupied
//! output directory) are returned as errors.
//!
//! # Core Modules
//!
//! - [`script`] - reference extraction from script text
//! - [`resolver`] - path resolution and the bounded dependency graph
//! - [`config`] - package configuration model, loading and validation
//! - [`packager`] - synthesis, materialization, manifests and reference rewriting
//! - [`pattern`] - glob expansion with exclusions
//! - [`core`] - error taxonomy and user-facing error rendering
//! - [`cli`] - command-line interface
//! - [`utils`] - filesystem helpers and progress bars
//!
//! # Configuration Format (package-config.json)
//!
//! ```json
//! {
//!   "package": { "name": "tools", "version": "1.0.0" },
//!   "directories": ["logs"],
//!   "files": [
//!     { "name": "entry", "source": "Main.ps1", "destination": "" },
//!     { "name": "libraries", "source": "lib/**/*.ps1", "destination": "scripts",
//!       "flatten": true, "exclude": ["*.Tests.ps1"] }
//!   ],
//!   "post_package": [
//!     { "type": "create_file", "path": "VERSION.txt", "content": "1.0.0" }
//!   ]
//! }
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Show what Main.ps1 pulls in
//! pspack analyze --starting-files Main.ps1
//!
//! # Package from a hand-written configuration
//! pspack package --config package-config.json --output dist
//!
//! # Package everything Main.ps1 needs, then fix flattened references
//! pspack auto-package --starting-files Main.ps1 --output dist
//! pspack rewrite-refs --config dist/package-config.json --package-path dist
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod packager;
pub mod pattern;
pub mod resolver;
pub mod script;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
