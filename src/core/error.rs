//! Error handling for pspack
//!
//! This module provides the typed error taxonomy and user-friendly error reporting for the
//! packager. The error system is designed around two principles:
//! 1. **Strongly-typed errors** for the failures that abort an operation
//! 2. **Data, not errors,** for per-item failures (a reference that cannot be resolved, a
//!    file that cannot be copied). Those are recorded in result structures and never
//!    surface through this module.
//!
//! # Error Categories
//!
//! Every [`PackError`] belongs to one [`ErrorCategory`]:
//! - **Input**: the caller violated a precondition (empty starting-file list, missing or
//!   unparsable configuration file)
//! - **Validation**: a configuration parsed but is semantically invalid
//! - **Conflict**: the output directory is already populated and `--force` was not given
//! - **Io**: an unexpected filesystem failure outside per-item processing
//!
//! The CLI maps categories to exit codes with [`exit_code_for`]: input, validation and
//! conflict errors mean "nothing ran" (exit 2); unexpected I/O failures exit with 1.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pspack::core::{PackError, user_friendly_error};
//!
//! let error = anyhow::Error::from(PackError::EmptyStartingFiles);
//! let context = user_friendly_error(error);
//! context.display(); // colored error with a suggestion
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Broad classification of a [`PackError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Precondition violated by the caller.
    Input,
    /// Configuration parsed but semantically invalid.
    Validation,
    /// Output root already populated without `force`.
    Conflict,
    /// Unexpected filesystem or serialization failure.
    Io,
}

/// The main error type for pspack operations.
///
/// Only operation-level failures are represented here. Each variant names the
/// offending field, group, or path so the message is actionable on its own.
#[derive(Error, Debug)]
pub enum PackError {
    /// `analyze` or `auto-package` was given no starting files.
    #[error("No starting files were given")]
    EmptyStartingFiles,

    /// The configuration file does not exist.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was looked up
        path: String,
    },

    /// The configuration file could not be parsed as JSON.
    #[error("Invalid configuration syntax in {file}")]
    ConfigParseError {
        /// Path (or label) of the configuration source
        file: String,
        /// Parser message including line and column
        reason: String,
    },

    /// The configuration parsed but violates a semantic rule.
    #[error("Configuration validation failed: {reason}")]
    ConfigValidationError {
        /// Description naming the offending field or group
        reason: String,
    },

    /// Two file groups share a name.
    #[error("Duplicate file group name '{name}' (entries #{first} and #{second})")]
    DuplicateGroupName {
        /// The shared group name
        name: String,
        /// Zero-based index of the first entry using the name
        first: usize,
        /// Zero-based index of the later entry using the name
        second: usize,
    },

    /// A path in the configuration would escape the package root.
    #[error("{field} '{path}' in {owner} escapes the package root")]
    UnsafePath {
        /// Which field held the path (e.g. "destination")
        field: String,
        /// The offending path
        path: String,
        /// The group or section containing the field
        owner: String,
    },

    /// A glob pattern in the configuration does not compile.
    #[error("Invalid glob pattern '{pattern}' in {owner}: {reason}")]
    InvalidPattern {
        /// The pattern text
        pattern: String,
        /// The group containing the pattern
        owner: String,
        /// Compiler message
        reason: String,
    },

    /// The output root exists, is non-empty, and `force` was not given.
    #[error("Output directory is not empty: {path}")]
    OutputConflict {
        /// The output root
        path: String,
    },

    /// A filesystem operation outside per-file processing failed.
    #[error("File system error: {operation}")]
    FileSystemError {
        /// What was being attempted
        operation: String,
        /// The path involved
        path: String,
    },

    /// Wrapped [`std::io::Error`].
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Wrapped [`serde_json::Error`] raised while serializing output.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Free-form message.
    #[error("{message}")]
    Other {
        /// The message
        message: String,
    },
}

impl PackError {
    /// Returns the category this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyStartingFiles
            | Self::ConfigNotFound {
                ..
            }
            | Self::ConfigParseError {
                ..
            } => ErrorCategory::Input,
            Self::ConfigValidationError {
                ..
            }
            | Self::DuplicateGroupName {
                ..
            }
            | Self::UnsafePath {
                ..
            }
            | Self::InvalidPattern {
                ..
            } => ErrorCategory::Validation,
            Self::OutputConflict {
                ..
            } => ErrorCategory::Conflict,
            Self::FileSystemError {
                ..
            }
            | Self::IoError(_)
            | Self::JsonError(_)
            | Self::Other {
                ..
            } => ErrorCategory::Io,
        }
    }

    /// Process exit code for this error: 2 when nothing ran, 1 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Validation | ErrorCategory::Conflict => 2,
            ErrorCategory::Io => 1,
        }
    }
}

/// Exit code for an arbitrary error chain.
///
/// Walks the chain looking for a [`PackError`]; anything unrecognized exits with 1.
#[must_use]
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<PackError>())
        .map_or(1, PackError::exit_code)
}

/// Error wrapper carrying user-facing details and a suggestion.
///
/// ```rust,no_run
/// use pspack::core::{ErrorContext, PackError};
///
/// let context = ErrorContext::new(PackError::EmptyStartingFiles)
///     .with_suggestion("Pass at least one script with --starting-files");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: PackError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: PackError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Recognizes [`PackError`] (anywhere in the chain) and [`std::io::Error`]; everything
/// else is rendered with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    // A bare typed error gets the tailored context; one under `.context()` layers keeps
    // the outer message and reports the typed error as details.
    let error = if error.chain().next().is_some_and(|outer| outer.is::<PackError>()) {
        match error.downcast::<PackError>() {
            Ok(pack_error) => return create_error_context(pack_error),
            Err(other) => other,
        }
    } else {
        error
    };

    let outer_message = error.to_string();
    if let Some(typed) = error.chain().find_map(|c| c.downcast_ref::<PackError>()) {
        let details = typed.to_string();
        let base = ErrorContext::new(PackError::Other {
            message: outer_message,
        })
        .with_details(details);
        return match typed.category() {
            ErrorCategory::Input => {
                base.with_suggestion("Check the command-line arguments and input paths")
            }
            ErrorCategory::Validation => {
                base.with_suggestion("Fix the configuration entry named above and retry")
            }
            ErrorCategory::Conflict => {
                base.with_suggestion("Choose an empty output directory or pass --force")
            }
            ErrorCategory::Io => base,
        };
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(PackError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check file ownership and permissions of the input and output paths")
                .with_details("pspack did not have permission to read or write a file");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(PackError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(PackError::Other {
        message,
    })
}

/// Attach category-specific suggestions to a typed error.
fn create_error_context(error: PackError) -> ErrorContext {
    match &error {
        PackError::EmptyStartingFiles => ErrorContext::new(error)
            .with_suggestion("Pass one or more scripts with --starting-files")
            .with_details("Dependency analysis needs at least one entry point"),

        PackError::ConfigNotFound {
            path,
        } => {
            let suggestion = format!("Create {path} or point --config at an existing file");
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        PackError::ConfigParseError {
            reason,
            ..
        } => {
            let details = reason.clone();
            ErrorContext::new(error)
                .with_details(details)
                .with_suggestion("Check the JSON syntax: quotes, commas and matching brackets")
        }

        PackError::DuplicateGroupName {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Give every entry in \"files\" a unique \"name\""),

        PackError::UnsafePath {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Use a relative path without '..' components")
            .with_details("All package paths are relative to the output root"),

        PackError::OutputConflict {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Choose an empty output directory or pass --force")
            .with_details("pspack refuses to mix package output with unrelated content"),

        _ => ErrorContext::new(error),
    }
}
