//! Package configuration model.
//!
//! A package configuration describes what goes into a package and where. It is
//! plain JSON, read once and treated as immutable while a package is built:
//!
//! ```json
//! {
//!   "package": { "name": "tools", "version": "1.0.0", "description": "Admin scripts" },
//!   "directories": ["logs"],
//!   "files": [
//!     { "name": "entry", "source": "Main.ps1", "destination": "" },
//!     { "name": "lib", "source": "lib/**/*.ps1", "destination": "scripts",
//!       "flatten": true, "exclude": ["*.Tests.ps1"] }
//!   ],
//!   "post_package": [
//!     { "type": "create_file", "path": "VERSION.txt", "content": "1.0.0" },
//!     { "type": "run_script", "path": "scripts/Setup.ps1", "args": ["-Quiet"] }
//!   ]
//! }
//! ```
//!
//! Unknown fields are rejected everywhere. Loading is split across
//! [`io`] (parsing, section checks) and [`validation`] (semantic rules).
//!
//! # File Groups
//!
//! Each group selects files either with a `source` glob evaluated against the
//! project root or with an explicit `source_files` list, never both. Files land
//! under `destination` (relative to the package root, `""` for the root itself):
//!
//! - **Preserve** (default): the path below the pattern's literal base directory is
//!   kept, so `lib/**/*.ps1` places `lib/util/Log.ps1` at `<destination>/util/Log.ps1`
//! - **Flatten** (`"flatten": true` or `"preserve_structure": false`): only the
//!   file name is kept

pub mod io;
pub mod validation;

pub use io::{CONFIG_FILE_NAME, from_json_str, load_configuration, save_configuration, to_json};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::script::ResolutionStatus;

/// Full declarative package description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageConfiguration {
    pub package: PackageMetadata,

    /// Relative directories created under the package root regardless of groups.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<String>,

    /// File groups in processing order.
    #[serde(default)]
    pub files: Vec<FileGroup>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_package: Vec<PostPackageAction>,

    /// Analysis details recorded by `auto-package`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_metadata: Option<DependencyMetadata>,
}

impl PackageConfiguration {
    /// Creates a configuration with metadata only.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package: PackageMetadata {
                name: name.into(),
                version: version.into(),
                description: None,
                auto_generated: None,
            },
            directories: Vec::new(),
            files: Vec::new(),
            post_package: Vec::new(),
            dependency_metadata: None,
        }
    }

    /// Finds a file group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&FileGroup> {
        self.files.iter().find(|group| group.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set on configurations produced by the synthesizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_generated: Option<bool>,
}

/// A named file-selection rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileGroup {
    /// Unique within the configuration.
    pub name: String,

    /// Glob relative to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Explicit file list, absolute or relative to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_files: Option<Vec<String>>,

    /// Directory under the package root; `""` is the root itself.
    pub destination: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_structure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flatten: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<FileAction>,
}

impl FileGroup {
    /// Group selecting files with a glob.
    #[must_use]
    pub fn from_pattern(name: impl Into<String>, source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: Some(source.into()),
            source_files: None,
            destination: destination.into(),
            preserve_structure: None,
            flatten: None,
            exclude: Vec::new(),
            action: None,
        }
    }

    /// Group selecting an explicit list of files.
    #[must_use]
    pub fn from_files(name: impl Into<String>, files: Vec<String>, destination: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            source_files: Some(files),
            destination: destination.into(),
            preserve_structure: None,
            flatten: None,
            exclude: Vec::new(),
            action: None,
        }
    }

    #[must_use]
    pub fn structure_mode(&self) -> StructureMode {
        if self.flatten == Some(true) || self.preserve_structure == Some(false) {
            StructureMode::Flatten
        } else {
            StructureMode::Preserve
        }
    }

    #[must_use]
    pub fn file_action(&self) -> FileAction {
        self.action.unwrap_or_default()
    }

    /// How this group selects its files, or `None` when it sets neither or both
    /// selectors (rejected by validation).
    #[must_use]
    pub fn selector(&self) -> Option<SourceSelector<'_>> {
        match (&self.source, &self.source_files) {
            (Some(pattern), None) => Some(SourceSelector::Pattern(pattern)),
            (None, Some(files)) => Some(SourceSelector::Files(files)),
            _ => None,
        }
    }
}

/// Borrowed view of a group's file selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSelector<'a> {
    Pattern(&'a str),
    Files(&'a [String]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureMode {
    Preserve,
    Flatten,
}

impl fmt::Display for StructureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preserve => write!(f, "preserve"),
            Self::Flatten => write!(f, "flatten"),
        }
    }
}

/// What happens to each selected file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    #[default]
    Copy,
    /// Source is removed after the destination is written.
    Move,
    /// Content is read into memory and written atomically.
    Write,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => write!(f, "copy"),
            Self::Move => write!(f, "move"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Step run after all file groups are processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum PostPackageAction {
    /// Writes `content` to `path` under the package root. Strings are written
    /// verbatim, anything else as pretty-printed JSON.
    CreateFile { path: String, content: serde_json::Value },
    /// Runs a script from the package with the package root as working directory.
    RunScript {
        path: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
    },
}

impl PostPackageAction {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::CreateFile { path, .. } | Self::RunScript { path, .. } => path,
        }
    }

    /// Short label used in logs and manifests.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateFile { .. } => "create_file",
            Self::RunScript { .. } => "run_script",
        }
    }
}

/// Analysis summary carried from `auto-package` into the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyMetadata {
    pub total_files_analyzed: usize,
    pub starting_files: Vec<PathBuf>,
    /// Search roots the analysis resolved references against, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<PathBuf>,
    pub unresolved_dependencies: Vec<UnresolvedDependency>,
}

/// A reference the analyzer could not follow, kept for manual follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnresolvedDependency {
    pub file: PathBuf,
    pub dependency: String,
    pub line: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResolutionStatus>,
}
