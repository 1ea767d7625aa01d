//! Core types shared by every pspack component.
//!
//! - [`PackError`] - operation-level failures, grouped into [`ErrorCategory`]
//! - [`ErrorContext`] - user-facing wrapper with details and suggestions
//! - [`user_friendly_error`] / [`exit_code_for`] - CLI boundary helpers
//!
//! Per-item failures (one unresolved reference, one failed copy) are deliberately
//! absent here: they are recorded as data in the analysis and manifest types.

pub mod error;

pub use error::{ErrorCategory, ErrorContext, PackError, exit_code_for, user_friendly_error};
