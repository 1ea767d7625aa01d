//! Cross-platform utilities shared by the packager components.
//!
//! - [`fs`] - directory creation, atomic writes, lexical path handling, checksums
//! - [`progress`] - terminal progress bars for packaging runs

pub mod fs;
pub mod progress;
