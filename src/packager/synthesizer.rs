//! Builds a package configuration from a dependency analysis.
//!
//! Every directory that contains a discovered file becomes one structure-preserving
//! file group listing exactly the discovered files, so packaging the result never
//! picks up unrelated neighbours. Groups and file lists are ordered
//! lexicographically; the same analysis always yields the same configuration.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{
    DependencyMetadata, FileGroup, PackageConfiguration, UnresolvedDependency,
};
use crate::resolver::DependencyGraphResult;
use crate::utils::fs::{common_ancestor, path_key, relative_path, to_forward_slashes};

/// Version given to synthesized packages.
pub const SYNTHESIZED_VERSION: &str = "1.0.0";

/// Name used for the group of files at the project root itself.
const ROOT_GROUP_NAME: &str = "root";

/// The directory synthesized destinations are relative to: the deepest directory
/// containing every discovered file.
#[must_use]
pub fn project_root_for(result: &DependencyGraphResult) -> PathBuf {
    let parents: Vec<PathBuf> = result
        .all_files
        .iter()
        .filter_map(|file| file.parent().map(Path::to_path_buf))
        .collect();
    common_ancestor(&parents).unwrap_or_else(|| PathBuf::from("/"))
}

/// Synthesizes a configuration covering every file in `result`.
///
/// # Examples
///
/// ```rust,no_run
/// use pspack::packager::synthesize;
/// use pspack::resolver::{GraphOptions, build_graph};
/// use std::path::PathBuf;
///
/// # fn example() -> anyhow::Result<()> {
/// let result = build_graph(&[PathBuf::from("Main.ps1")], &GraphOptions::default())?;
/// let config = synthesize(&result, "main-bundle");
/// assert_eq!(config.package.auto_generated, Some(true));
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn synthesize(result: &DependencyGraphResult, package_name: &str) -> PackageConfiguration {
    let project_root = project_root_for(result);

    // relative directory key -> (display directory, files)
    let mut by_directory: BTreeMap<String, (String, Vec<PathBuf>)> = BTreeMap::new();
    for file in &result.all_files {
        let directory = file.parent().unwrap_or(project_root.as_path());
        let relative = to_forward_slashes(&relative_path(&project_root, directory).to_string_lossy());
        let entry = by_directory
            .entry(path_key(Path::new(&relative)))
            .or_insert_with(|| (relative.clone(), Vec::new()));
        entry.1.push(file.clone());
    }

    let mut config = PackageConfiguration::new(package_name, SYNTHESIZED_VERSION);
    config.package.description = Some(format!(
        "Generated from {} starting file(s)",
        result.starting_files.len()
    ));
    config.package.auto_generated = Some(true);

    let mut used_names = HashSet::new();
    for (directory, mut files) in by_directory.into_values() {
        files.sort();
        files.dedup_by(|a, b| path_key(a) == path_key(b));

        let name = unique_group_name(&directory, &mut used_names);
        debug!("Synthesized group '{name}' with {} files", files.len());

        let mut group = FileGroup::from_files(
            name,
            files.iter().map(|file| file.display().to_string()).collect(),
            directory,
        );
        group.preserve_structure = Some(true);
        config.files.push(group);
    }

    config.dependency_metadata = Some(DependencyMetadata {
        total_files_analyzed: result.nodes.len(),
        starting_files: result.starting_files.clone(),
        search_paths: result.search_paths.clone(),
        unresolved_dependencies: result
            .unresolved_references()
            .map(|reference| UnresolvedDependency {
                file: reference.origin_path.clone(),
                dependency: reference.raw_text.clone(),
                line: reference.line_number,
                status: Some(reference.status),
            })
            .collect(),
    });

    config
}

fn unique_group_name(directory: &str, used: &mut HashSet<String>) -> String {
    let base = if directory.is_empty() {
        ROOT_GROUP_NAME.to_string()
    } else {
        directory.replace('/', "-")
    };

    let mut candidate = base.clone();
    let mut suffix = 2;
    while !used.insert(candidate.to_lowercase()) {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    candidate
}
