//! Reading and writing package configuration files.
//!
//! Loading happens in three stages so callers can tell the failures apart:
//!
//! 1. Text to JSON value; failure is [`PackError::ConfigParseError`] (input error)
//! 2. Required sections present and fields well-typed; failure is
//!    [`PackError::ConfigValidationError`]
//! 3. [`PackageConfiguration::validate`]; failures name the offending group

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use super::PackageConfiguration;
use crate::core::PackError;
use crate::utils::fs::atomic_write;

/// File name used for synthesized configurations.
pub const CONFIG_FILE_NAME: &str = "package-config.json";

/// Loads and validates a configuration file.
///
/// # Errors
///
/// - [`PackError::ConfigNotFound`] when `path` does not exist
/// - [`PackError::ConfigParseError`] when the file is not valid JSON
/// - a validation error when the content is not a valid configuration
pub fn load_configuration(path: &Path) -> Result<PackageConfiguration> {
    if !path.exists() {
        return Err(PackError::ConfigNotFound {
            path: path.display().to_string(),
        }
        .into());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

    let config = from_json_str(&content, &path.display().to_string())?;
    debug!(
        "Loaded configuration '{}' with {} file groups from {}",
        config.package.name,
        config.files.len(),
        path.display()
    );
    Ok(config)
}

/// Parses and validates configuration JSON; `label` names the source in errors.
pub fn from_json_str(content: &str, label: &str) -> Result<PackageConfiguration> {
    let value: Value = serde_json::from_str(content).map_err(|e| PackError::ConfigParseError {
        file: label.to_string(),
        reason: e.to_string(),
    })?;

    let Some(object) = value.as_object() else {
        return Err(validation_error("the top level must be a JSON object"));
    };
    if !object.contains_key("package") {
        return Err(validation_error("missing required section 'package'"));
    }
    if !object.contains_key("files") && !object.contains_key("directories") {
        return Err(validation_error("missing required section 'files'"));
    }

    let config: PackageConfiguration =
        serde_json::from_value(value).map_err(|e| validation_error(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Serializes a configuration as pretty-printed JSON with a trailing newline.
pub fn to_json(config: &PackageConfiguration) -> Result<String> {
    let mut json = serde_json::to_string_pretty(config).map_err(PackError::from)?;
    json.push('\n');
    Ok(json)
}

/// Writes a configuration atomically.
pub fn save_configuration(config: &PackageConfiguration, path: &Path) -> Result<()> {
    let json = to_json(config)?;
    atomic_write(path, json.as_bytes())
        .with_context(|| format!("Failed to write configuration file: {}", path.display()))
}

fn validation_error(reason: impl Into<String>) -> anyhow::Error {
    PackError::ConfigValidationError {
        reason: reason.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        DependencyMetadata, FileAction, FileGroup, PostPackageAction, UnresolvedDependency,
    };
    use crate::core::ErrorCategory;
    use crate::script::ResolutionStatus;
    use crate::test_utils::{ConfigFixture, ScriptProject};
    use serde_json::json;
    use std::path::PathBuf;

    fn category(err: &anyhow::Error) -> ErrorCategory {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<PackError>())
            .map(PackError::category)
            .unwrap()
    }

    #[test]
    fn test_load_fixture() {
        let project = ScriptProject::new();
        let path = project.with_config(&ConfigFixture::preserve_with_actions()).unwrap();

        let config = load_configuration(&path).unwrap();
        assert_eq!(config.package.name, "tools");
        assert_eq!(config.directories, vec!["logs", "config/local"]);
        assert_eq!(config.files.len(), 2);
        assert_eq!(config.files[0].exclude, vec!["*.Tests.ps1"]);
        assert_eq!(config.post_package.len(), 2);
    }

    #[test]
    fn test_parse_error_is_distinct_from_validation_error() {
        let parse = from_json_str(&ConfigFixture::invalid_syntax().content, "bad.json").unwrap_err();
        assert_eq!(category(&parse), ErrorCategory::Input);

        let missing = from_json_str(r#"{ "files": [] }"#, "x.json").unwrap_err();
        assert_eq!(category(&missing), ErrorCategory::Validation);
        assert!(missing.to_string().contains("'package'"));

        let unknown = from_json_str(
            r#"{ "package": { "name": "a", "version": "1" }, "files": [], "directories": ["d"], "extra": 1 }"#,
            "x.json",
        )
        .unwrap_err();
        assert_eq!(category(&unknown), ErrorCategory::Validation);

        let dup = from_json_str(&ConfigFixture::duplicate_groups().content, "x.json").unwrap_err();
        assert_eq!(category(&dup), ErrorCategory::Validation);

        let degenerate = from_json_str(&ConfigFixture::degenerate().content, "x.json").unwrap_err();
        assert_eq!(category(&degenerate), ErrorCategory::Validation);
    }

    #[test]
    fn test_missing_file() {
        let err = load_configuration(Path::new("/no/such/package-config.json")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PackError>(),
            Some(PackError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_round_trip() {
        let mut config = PackageConfiguration::new("round", "3.2.1");
        config.package.description = Some("Round trip".to_string());
        config.package.auto_generated = Some(true);
        config.directories = vec!["logs".to_string()];

        let mut flat = FileGroup::from_pattern("flat", "lib/**/*.ps1", "scripts");
        flat.flatten = Some(true);
        flat.exclude = vec!["*.Tests.ps1".to_string()];
        flat.action = Some(FileAction::Write);
        config.files.push(flat);
        config.files.push(FileGroup::from_files(
            "explicit",
            vec!["/abs/Main.ps1".to_string()],
            "",
        ));

        config.post_package = vec![
            PostPackageAction::CreateFile {
                path: "meta.json".to_string(),
                content: json!({ "a": [1, 2] }),
            },
            PostPackageAction::RunScript {
                path: "Setup.ps1".to_string(),
                args: vec!["-Force".to_string()],
            },
        ];
        config.dependency_metadata = Some(DependencyMetadata {
            total_files_analyzed: 2,
            starting_files: vec![PathBuf::from("/abs/Main.ps1")],
            search_paths: vec![PathBuf::from("/abs"), PathBuf::from("/modules")],
            unresolved_dependencies: vec![UnresolvedDependency {
                file: PathBuf::from("/abs/Main.ps1"),
                dependency: "$Var\\x.ps1".to_string(),
                line: 4,
                status: Some(ResolutionStatus::Variable),
            }],
        });

        let json = to_json(&config).unwrap();
        assert_eq!(from_json_str(&json, "round.json").unwrap(), config);
    }

    #[test]
    fn test_save_and_load() {
        let project = ScriptProject::new();
        let mut config = PackageConfiguration::new("saved", "1.0.0");
        config.files.push(FileGroup::from_pattern("all", "**/*.ps1", ""));

        let path = project.path("out/package-config.json");
        save_configuration(&config, &path).unwrap();
        assert_eq!(load_configuration(&path).unwrap(), config);
    }
}
