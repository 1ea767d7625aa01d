//! Integration test suite for pspack
//!
//! End-to-end tests that run the `pspack` binary against temporary
//! PowerShell projects and check its output, exit codes and the files it
//! writes.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **analyze**: dependency tree and JSON output
//! - **package**: materialization from a hand-written configuration
//! - **auto_package**: analysis, synthesis and packaging in one step
//! - **rewrite_refs**: reference rewriting after flattening
//! - **library**: the library API without the binary

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod analyze;
mod auto_package;
mod library;
mod package;
mod rewrite_refs;
