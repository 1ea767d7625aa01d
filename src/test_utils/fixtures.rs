//! Test fixtures for script trees and package configurations

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A PowerShell project laid out in a temporary directory.
///
/// The directory is removed when the value is dropped.
#[derive(Debug)]
pub struct ScriptProject {
    temp_dir: TempDir,
}

impl ScriptProject {
    /// Creates an empty project.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Adds a file and returns the project, for chaining.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    pub fn script(self, relative: &str, content: &str) -> Self {
        self.write(relative, content).expect("Failed to write fixture script");
        self
    }

    /// Writes a file below the project root, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Reads a file below the project root.
    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.path(relative);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Writes a configuration fixture as `package-config.json` at the root.
    pub fn with_config(&self, fixture: &ConfigFixture) -> Result<PathBuf> {
        self.write("package-config.json", &fixture.content)
    }

    /// Absolute path of `relative` inside the project.
    #[must_use]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl Default for ScriptProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Test fixture for package configuration JSON
#[derive(Clone, Debug)]
pub struct ConfigFixture {
    pub content: String,
    pub name: String,
}

impl ConfigFixture {
    /// `Main.ps1` and everything under `lib/` flattened into `scripts/`
    pub fn flatten_scripts() -> Self {
        Self {
            name: "flatten_scripts".to_string(),
            content: r#"
{
  "package": { "name": "flat", "version": "1.0.0" },
  "files": [
    { "name": "entry", "source": "Main.ps1", "destination": "scripts", "flatten": true },
    { "name": "libraries", "source": "lib/**/*.ps1", "destination": "scripts", "flatten": true }
  ]
}
"#
            .trim()
            .to_string(),
        }
    }

    /// Structure-preserving package with exclusions and post actions
    pub fn preserve_with_actions() -> Self {
        Self {
            name: "preserve_with_actions".to_string(),
            content: r#"
{
  "package": { "name": "tools", "version": "2.1.0", "description": "Tooling bundle" },
  "directories": ["logs", "config/local"],
  "files": [
    { "name": "root-scripts", "source": "*.ps1", "destination": "", "exclude": ["*.Tests.ps1"] },
    { "name": "library", "source": "lib/**/*.ps1", "destination": "modules", "preserve_structure": true }
  ],
  "post_package": [
    { "type": "create_file", "path": "VERSION.txt", "content": "2.1.0" },
    { "type": "create_file", "path": "config/settings.json", "content": { "level": "info" } }
  ]
}
"#
            .trim()
            .to_string(),
        }
    }

    /// Not JSON at all
    pub fn invalid_syntax() -> Self {
        Self {
            name: "invalid_syntax".to_string(),
            content: r#"{ "package": { "name": "broken", "version": "1.0.0" }, "files": [ "#.to_string(),
        }
    }

    /// Two groups share a name
    pub fn duplicate_groups() -> Self {
        Self {
            name: "duplicate_groups".to_string(),
            content: r#"
{
  "package": { "name": "dup", "version": "1.0.0" },
  "files": [
    { "name": "scripts", "source": "*.ps1", "destination": "a" },
    { "name": "scripts", "source": "lib/*.ps1", "destination": "b" }
  ]
}
"#
            .trim()
            .to_string(),
        }
    }

    /// A destination that climbs out of the package root
    pub fn escaping_destination() -> Self {
        Self {
            name: "escaping_destination".to_string(),
            content: r#"
{
  "package": { "name": "escape", "version": "1.0.0" },
  "files": [
    { "name": "sneaky", "source": "*.ps1", "destination": "../outside" }
  ]
}
"#
            .trim()
            .to_string(),
        }
    }

    /// Neither file groups nor directories
    pub fn degenerate() -> Self {
        Self {
            name: "degenerate".to_string(),
            content: r#"{ "package": { "name": "empty", "version": "1.0.0" }, "files": [] }"#
                .to_string(),
        }
    }
}
