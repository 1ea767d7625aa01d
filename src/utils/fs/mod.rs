//! File system utilities used by the analyzer, materializer and rewriter.
//!
//! # Key Features
//!
//! - **Atomic writes**: manifest, configuration and rewritten scripts are written with a
//!   temp-and-rename strategy so readers never see a partial file
//! - **Lexical path handling**: normalization, containment checks and relative-path
//!   computation without touching the filesystem
//! - **Checksums**: SHA-256 digests recorded per packaged file
//!
//! # Examples
//!
//! ```rust,no_run
//! use pspack::utils::fs::{ensure_dir, safe_write, calculate_checksum};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! ensure_dir(Path::new("dist/scripts"))?;
//! safe_write(Path::new("dist/README.txt"), "packaged")?;
//! let checksum = calculate_checksum(Path::new("dist/README.txt"))?;
//! println!("sha256:{checksum}");
//! # Ok(())
//! # }
//! ```

pub mod atomic;
pub mod dirs;
pub mod metadata;
pub mod paths;

pub use atomic::{atomic_write, safe_write};
pub use dirs::{ensure_dir, ensure_parent_dir, is_dir_empty};
pub use metadata::{calculate_checksum, checksum_bytes};
pub use paths::{
    absolutize, common_ancestor, is_safe_path, is_safe_relative, normalize_path, path_key,
    relative_path, to_forward_slashes,
};
