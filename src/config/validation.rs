//! Semantic validation for package configurations.
//!
//! Validation runs after a configuration has been parsed and deserialized, so
//! every failure here means "parsed but invalid". Each error names the field and
//! the file group (or section) that caused it.

use anyhow::Result;
use std::collections::HashMap;

use super::{PackageConfiguration, SourceSelector};
use crate::core::PackError;
use crate::pattern::{PatternMatcher, validate_pattern_safety};
use crate::utils::fs::is_safe_relative;

impl PackageConfiguration {
    /// Validate the configuration and enforce packaging rules.
    ///
    /// # Validation Rules
    ///
    /// - At least one file group or explicit directory must be present
    /// - `package.name` and `package.version` must be non-empty
    /// - File group names must be non-empty and unique
    /// - Each group sets exactly one of `source` / `source_files`
    /// - `source` must be a valid glob relative to the project root; `exclude`
    ///   entries must be valid globs
    /// - `flatten: true` cannot be combined with `preserve_structure: true`
    /// - Destinations, explicit directories, and post-package paths must be
    ///   relative and must not escape the package root
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use pspack::config::{FileGroup, PackageConfiguration};
    ///
    /// let mut config = PackageConfiguration::new("tools", "1.0.0");
    /// config.files.push(FileGroup::from_pattern("scripts", "*.ps1", "bin"));
    /// assert!(config.validate().is_ok());
    ///
    /// config.files.push(FileGroup::from_pattern("escape", "*.ps1", "../bin"));
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() && self.directories.is_empty() {
            return Err(invalid(
                "configuration declares neither file groups nor directories; nothing would be packaged",
            ));
        }

        if self.package.name.trim().is_empty() {
            return Err(invalid("package.name must not be empty"));
        }
        if self.package.version.trim().is_empty() {
            return Err(invalid("package.version must not be empty"));
        }

        let mut seen_names: HashMap<&str, usize> = HashMap::new();
        for (index, group) in self.files.iter().enumerate() {
            if group.name.trim().is_empty() {
                return Err(invalid(format!("files[{index}].name must not be empty")));
            }
            if let Some(&first) = seen_names.get(group.name.as_str()) {
                return Err(PackError::DuplicateGroupName {
                    name: group.name.clone(),
                    first,
                    second: index,
                }
                .into());
            }
            seen_names.insert(&group.name, index);

            let owner = format!("file group '{}'", group.name);

            match group.selector() {
                Some(SourceSelector::Pattern(pattern)) => {
                    check_pattern(pattern, &owner)?;
                    validate_pattern_safety(pattern).map_err(|e| PackError::InvalidPattern {
                        pattern: pattern.to_string(),
                        owner: owner.clone(),
                        reason: format!("{e}; source patterns are evaluated relative to the project root"),
                    })?;
                }
                Some(SourceSelector::Files(files)) => {
                    if files.is_empty() {
                        return Err(invalid(format!("{owner} has an empty source_files list")));
                    }
                    if let Some(blank) = files.iter().position(|file| file.trim().is_empty()) {
                        return Err(invalid(format!("{owner} has an empty entry at source_files[{blank}]")));
                    }
                }
                None => {
                    return Err(invalid(format!(
                        "{owner} must set exactly one of 'source' or 'source_files'"
                    )));
                }
            }

            for exclude in &group.exclude {
                check_pattern(exclude, &owner)?;
            }

            if group.flatten == Some(true) && group.preserve_structure == Some(true) {
                return Err(invalid(format!(
                    "{owner} sets both 'flatten' and 'preserve_structure' to true"
                )));
            }

            check_relative("destination", &group.destination, &owner)?;
        }

        for directory in &self.directories {
            if directory.trim().is_empty() {
                return Err(invalid("directories must not contain empty entries"));
            }
            check_relative("directory", directory, "directories")?;
        }

        for (index, action) in self.post_package.iter().enumerate() {
            let owner = format!("post_package[{index}] ({})", action.kind());
            if action.path().trim().is_empty() {
                return Err(invalid(format!("{owner} has an empty path")));
            }
            check_relative("path", action.path(), &owner)?;
        }

        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> anyhow::Error {
    PackError::ConfigValidationError {
        reason: reason.into(),
    }
    .into()
}

fn check_pattern(pattern: &str, owner: &str) -> Result<()> {
    PatternMatcher::new(pattern).map_err(|e| PackError::InvalidPattern {
        pattern: pattern.to_string(),
        owner: owner.to_string(),
        reason: e.root_cause().to_string(),
    })?;
    Ok(())
}

fn check_relative(field: &str, path: &str, owner: &str) -> Result<()> {
    if is_safe_relative(path) {
        Ok(())
    } else {
        Err(PackError::UnsafePath {
            field: field.to_string(),
            path: path.to_string(),
            owner: owner.to_string(),
        }
        .into())
    }
}
