//! Test utilities for pspack
//!
//! Helpers shared by unit tests and the integration suite: a temporary
//! PowerShell project builder, canned package configurations, and one-time
//! logging setup.
//!
//! # Example
//!
//! ```rust,no_run
//! use pspack::test_utils::ScriptProject;
//!
//! let project = ScriptProject::new()
//!     .script("Main.ps1", ". $PSScriptRoot\\lib\\Config.ps1\n")
//!     .script("lib/Config.ps1", "$Settings = @{}\n");
//!
//! assert!(project.path("lib/Config.ps1").exists());
//! ```

pub mod fixtures;

pub use fixtures::{ConfigFixture, ScriptProject};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has any effect. `level` wins over `RUST_LOG`; with
/// neither, logging stays off.
///
/// ```bash
/// RUST_LOG=pspack=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
