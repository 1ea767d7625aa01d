//! Reference resolution and dependency graph construction.
//!
//! The resolver turns the raw references reported by
//! [`script::reference_extractor`](crate::script::reference_extractor) into a graph
//! of concrete files.
//!
//! # Resolution Order
//!
//! For each reference, first match wins:
//!
//! 1. An absolute path that exists is used as-is (normalized)
//! 2. The path relative to the referencing script's directory, with
//!    `$PSScriptRoot` expanded to that directory
//! 3. The path joined to each search root, in the order given
//!
//! References containing runtime variables are never resolved.
//!
//! # Traversal
//!
//! [`build_graph`] walks breadth-first from the starting files with an explicit
//! visited set, so cycles terminate and every file is analyzed at most once.
//! Files beyond `max_depth` are recorded as discovered but never opened.
//!
//! ```rust,no_run
//! use pspack::resolver::{GraphOptions, build_graph};
//! use std::path::PathBuf;
//!
//! # fn example() -> anyhow::Result<()> {
//! let options = GraphOptions {
//!     search_roots: vec![PathBuf::from("/project")],
//!     max_depth: 5,
//! };
//! let result = build_graph(&[PathBuf::from("/project/Main.ps1")], &options)?;
//! println!("{}", result.to_tree_string(None));
//! # Ok(())
//! # }
//! ```

pub mod dependency_graph;
pub mod path_resolver;

pub use dependency_graph::{
    DEFAULT_MAX_DEPTH, DependencyGraphNode, DependencyGraphResult, GraphOptions, build_graph,
};
pub use path_resolver::{PathResolver, resolve_reference, resolve_reference_with};
