//! The record of a completed (or projected) materialization.
//!
//! The manifest is written once, as `package-manifest.json` at the package root,
//! after every file and post-package action has been processed. Dry runs build
//! the same structure without writing it.
//!
//! # Format
//!
//! ```json
//! {
//!   "configuration": { "package": { "name": "tools", "version": "1.0.0" }, "files": [...] },
//!   "generated_at": "2026-01-05T10:12:44.120Z",
//!   "dry_run": false,
//!   "project_root": "/src/tools",
//!   "output_root": "/dist/tools",
//!   "directories": ["scripts", "logs"],
//!   "files": [
//!     { "group": "lib", "source": "/src/tools/lib/Config.ps1", "destination": "scripts/Config.ps1",
//!       "action": "copy", "outcome": "success", "checksum": "sha256:9f86d0..." }
//!   ],
//!   "post_package": [ { "type": "create_file", "path": "VERSION.txt", "outcome": "success" } ],
//!   "warnings": []
//! }
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{FileAction, PackageConfiguration};
use crate::core::PackError;
use crate::utils::fs::{atomic_write, path_key};

/// File name of the manifest inside the package root.
pub const MANIFEST_FILE_NAME: &str = "package-manifest.json";

/// Per-item result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Skipped,
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Skipped => write!(f, "skipped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One processed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub group: String,
    /// Absolute source path.
    pub source: PathBuf,
    /// Destination relative to the package root, `/`-separated.
    pub destination: String,
    pub action: FileAction,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// `sha256:<hex>` of the source content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// One post-package action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// The configuration that was materialized, as loaded.
    pub configuration: PackageConfiguration,
    pub generated_at: DateTime<Utc>,
    pub dry_run: bool,
    pub project_root: PathBuf,
    pub output_root: PathBuf,
    /// Directories created under the package root, in creation order.
    pub directories: Vec<String>,
    /// Files in processing order: group order, then sorted within each group.
    pub files: Vec<FileRecord>,
    #[serde(rename = "post_package")]
    pub post_package_results: Vec<ActionRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl PackageManifest {
    /// Reads `package-manifest.json` from a package root.
    pub fn load(package_root: &Path) -> Result<Self> {
        let path = package_root.join(MANIFEST_FILE_NAME);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read package manifest: {}", path.display()))?;
        serde_json::from_str(&content)
            .map_err(PackError::from)
            .with_context(|| format!("Invalid package manifest: {}", path.display()))
    }

    /// Writes the manifest into `output_root` and returns its path.
    pub fn save(&self, output_root: &Path) -> Result<PathBuf> {
        let path = output_root.join(MANIFEST_FILE_NAME);
        let mut json = serde_json::to_string_pretty(self).map_err(PackError::from)?;
        json.push('\n');
        atomic_write(&path, json.as_bytes())
            .with_context(|| format!("Failed to write package manifest: {}", path.display()))?;
        Ok(path)
    }

    #[must_use]
    pub fn count(&self, outcome: Outcome) -> usize {
        self.files.iter().filter(|record| record.outcome == outcome).count()
    }

    /// Whether any file failed. Post-package failures do not count.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.count(Outcome::Failed) > 0
    }

    /// Successful records as `(absolute source, absolute packaged path)` pairs.
    pub fn packaged_files(&self) -> impl Iterator<Item = (&Path, PathBuf)> {
        self.files
            .iter()
            .filter(|record| record.outcome == Outcome::Success)
            .map(|record| (record.source.as_path(), self.output_root.join(&record.destination)))
    }

    /// The successful record for a source file, compared case-insensitively.
    #[must_use]
    pub fn record_for_source(&self, source: &Path) -> Option<&FileRecord> {
        let key = path_key(source);
        self.files
            .iter()
            .find(|record| record.outcome == Outcome::Success && path_key(&record.source) == key)
    }
}
