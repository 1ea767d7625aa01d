//! Executes a package configuration into an output tree.
//!
//! Materialization runs in four phases:
//!
//! 1. **Conflict check**: a non-empty output root requires `force`; nothing has
//!    been touched when this fails
//! 2. **Directories**: the output root, every group destination, then every
//!    explicit directory
//! 3. **Files**: groups in declared order, files sorted within each group; each
//!    file gets its own outcome
//! 4. **Post-package actions** in declared order, then the manifest
//!
//! Planning (phases 2 and 3 without side effects) is shared with dry runs and
//! with the reference rewriter, so all three agree on every destination.

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::actions::{perform_file_action, run_post_action};
use super::manifest::{FileRecord, Outcome, PackageManifest};
use crate::config::{FileAction, FileGroup, PackageConfiguration, SourceSelector, StructureMode};
use crate::core::PackError;
use crate::pattern::{PatternResolver, literal_base};
use crate::utils::fs::{
    absolutize, calculate_checksum, common_ancestor, ensure_dir, is_dir_empty, normalize_path,
    path_key, to_forward_slashes,
};
use crate::utils::progress::ProgressBar;

/// Options for [`materialize`].
#[derive(Debug, Clone)]
pub struct PackageOptions {
    /// Directory that `source` globs and relative `source_files` are evaluated against.
    pub project_root: PathBuf,
    /// Compute everything, change nothing.
    pub dry_run: bool,
    /// Allow packaging into a non-empty output root.
    pub force: bool,
}

impl PackageOptions {
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            dry_run: false,
            force: false,
        }
    }
}

/// What will happen to a planned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Perform the group's action.
    Process,
    /// Skipped with the given reason.
    Skip(String),
    /// Failed before any action, with the given reason.
    Fail(String),
}

/// One file with its computed destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub group: String,
    pub source: PathBuf,
    /// Relative to the package root, `/`-separated.
    pub destination: String,
    pub action: FileAction,
    pub disposition: Disposition,
}

/// Side-effect-free expansion of a configuration.
#[derive(Debug, Clone, Default)]
pub struct PackagePlan {
    /// Relative directories to create, deduplicated, in creation order.
    pub directories: Vec<String>,
    pub files: Vec<PlannedFile>,
    pub warnings: Vec<String>,
}

impl PackagePlan {
    /// Files that will be written, as `(source, destination)` pairs.
    pub fn processed(&self) -> impl Iterator<Item = &PlannedFile> {
        self.files.iter().filter(|file| file.disposition == Disposition::Process)
    }
}

/// Expands every group into concrete files and destinations.
///
/// Files under `skip_root` (normally the output root) are ignored so that
/// packaging into a directory inside the project never picks up earlier output.
///
/// # Errors
///
/// Fails only when a group's patterns do not compile, which validation rules out
/// for loaded configurations.
pub fn plan(config: &PackageConfiguration, project_root: &Path, skip_root: Option<&Path>) -> Result<PackagePlan> {
    let project_root = absolutize(project_root);
    let skip_key = skip_root.map(|root| path_key(&absolutize(root)));

    let mut plan = PackagePlan::default();
    let mut seen_dirs = HashSet::new();
    let mut add_dir = |plan: &mut PackagePlan, dir: &str| {
        let unified = to_forward_slashes(dir).trim_matches('/').to_string();
        if !unified.is_empty() && seen_dirs.insert(path_key(Path::new(&unified))) {
            plan.directories.push(unified);
        }
    };

    for group in &config.files {
        add_dir(&mut plan, &group.destination);
    }
    for directory in &config.directories {
        add_dir(&mut plan, directory);
    }

    // destination key -> (source key, source, group)
    let mut claimed: HashMap<String, (String, PathBuf, String)> = HashMap::new();

    for group in &config.files {
        let selected = select_files(group, &project_root)?;
        let selected: Vec<SelectedFile> = selected
            .into_iter()
            .filter(|file| {
                skip_key
                    .as_ref()
                    .is_none_or(|skip| !path_key(&file.source).starts_with(&format!("{skip}/")))
            })
            .collect();

        if selected.is_empty() {
            let warning = format!("file group '{}' matched no files", group.name);
            warn!("{warning}");
            plan.warnings.push(warning);
        }

        for file in selected {
            let destination = destination_for(group, &file);
            let disposition = if file.missing {
                Disposition::Fail("source file does not exist".to_string())
            } else {
                claim(&mut claimed, &destination, &file.source, &group.name)
            };

            debug!(
                "[{}] {} -> {} ({:?})",
                group.name,
                file.source.display(),
                destination,
                disposition
            );
            plan.files.push(PlannedFile {
                group: group.name.clone(),
                source: file.source,
                destination,
                action: group.file_action(),
                disposition,
            });
        }
    }

    Ok(plan)
}

fn claim(
    claimed: &mut HashMap<String, (String, PathBuf, String)>,
    destination: &str,
    source: &Path,
    group: &str,
) -> Disposition {
    let destination_key = path_key(Path::new(destination));
    let source_key = path_key(source);

    match claimed.get(&destination_key) {
        Some((prior_source_key, _, prior_group)) if *prior_source_key == source_key => {
            Disposition::Skip(format!("already packaged by group '{prior_group}'"))
        }
        Some((_, prior_source, prior_group)) => Disposition::Fail(format!(
            "destination '{destination}' already written from {} (group '{prior_group}')",
            prior_source.display()
        )),
        None => {
            claimed.insert(destination_key, (source_key, source.to_path_buf(), group.to_string()));
            Disposition::Process
        }
    }
}

struct SelectedFile {
    source: PathBuf,
    /// Path below the group's base directory.
    relative: PathBuf,
    missing: bool,
}

fn select_files(group: &FileGroup, project_root: &Path) -> Result<Vec<SelectedFile>> {
    let mut resolver = PatternResolver::new();
    for exclude in &group.exclude {
        resolver.exclude(exclude)?;
    }

    match group.selector() {
        Some(SourceSelector::Pattern(pattern)) => {
            let base = literal_base(pattern);
            let matches = resolver
                .resolve(pattern, project_root)
                .with_context(|| format!("Failed to expand source of file group '{}'", group.name))?;

            Ok(matches
                .into_iter()
                .map(|relative_to_root| {
                    let relative = relative_to_root
                        .strip_prefix(&base)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| relative_to_root.clone());
                    SelectedFile {
                        source: project_root.join(&relative_to_root),
                        relative,
                        missing: false,
                    }
                })
                .collect())
        }
        Some(SourceSelector::Files(files)) => {
            let sources: Vec<PathBuf> = files
                .iter()
                .map(|file| {
                    let unified = to_forward_slashes(file);
                    let path = Path::new(&unified);
                    if path.is_absolute() {
                        normalize_path(path)
                    } else {
                        normalize_path(&project_root.join(path))
                    }
                })
                .filter(|source| {
                    let relative = source.strip_prefix(project_root).unwrap_or(source);
                    !resolver.is_excluded(relative)
                })
                .collect();

            let parents: Vec<PathBuf> =
                sources.iter().filter_map(|source| source.parent().map(Path::to_path_buf)).collect();
            let base = common_ancestor(&parents).unwrap_or_default();

            let mut selected: Vec<SelectedFile> = sources
                .into_iter()
                .map(|source| SelectedFile {
                    relative: source
                        .strip_prefix(&base)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| PathBuf::from(source.file_name().unwrap_or_default())),
                    missing: !source.is_file(),
                    source,
                })
                .collect();
            selected.sort_by(|a, b| a.source.cmp(&b.source));
            Ok(selected)
        }
        None => Err(PackError::ConfigValidationError {
            reason: format!(
                "file group '{}' must set exactly one of 'source' or 'source_files'",
                group.name
            ),
        }
        .into()),
    }
}

fn destination_for(group: &FileGroup, file: &SelectedFile) -> String {
    let leaf = match group.structure_mode() {
        StructureMode::Flatten => PathBuf::from(file.source.file_name().unwrap_or_default()),
        StructureMode::Preserve => file.relative.clone(),
    };
    let leaf = to_forward_slashes(&leaf.to_string_lossy());
    let directory = to_forward_slashes(&group.destination).trim_matches('/').to_string();

    let joined = if directory.is_empty() {
        leaf
    } else {
        format!("{directory}/{leaf}")
    };
    to_forward_slashes(&normalize_path(Path::new(&joined)).to_string_lossy())
}

/// Materializes `config` into `output_root`.
///
/// Per-file and per-action failures are recorded in the returned manifest; the
/// manifest is also written to `output_root` unless this is a dry run.
///
/// # Errors
///
/// - [`PackError::OutputConflict`] when `output_root` is non-empty and `force` is
///   not set (or is a regular file)
/// - I/O errors creating directories or writing the manifest
pub fn materialize(
    config: &PackageConfiguration,
    output_root: &Path,
    options: &PackageOptions,
    progress: &ProgressBar,
) -> Result<PackageManifest> {
    let output_root = absolutize(output_root);
    let project_root = absolutize(&options.project_root);

    check_output_root(&output_root, options.force)?;

    let plan = plan(config, &project_root, Some(&output_root))?;
    info!(
        "Packaging '{}' into {} ({} files{})",
        config.package.name,
        output_root.display(),
        plan.files.len(),
        if options.dry_run { ", dry run" } else { "" }
    );

    if !options.dry_run {
        ensure_dir(&output_root).map_err(|e| PackError::FileSystemError {
            operation: format!("creating output directory: {e:#}"),
            path: output_root.display().to_string(),
        })?;
        for directory in &plan.directories {
            let path = output_root.join(directory);
            ensure_dir(&path).map_err(|e| PackError::FileSystemError {
                operation: format!("creating directory: {e:#}"),
                path: path.display().to_string(),
            })?;
        }
    }

    progress.inc_length(plan.files.len() as u64);
    progress.set_message("Packaging files");

    let mut files = Vec::with_capacity(plan.files.len());
    for planned in &plan.files {
        files.push(process_file(planned, &output_root, options.dry_run));
        progress.inc(1);
    }

    progress.set_message("Running post-package actions");
    let post_package_results = config
        .post_package
        .iter()
        .map(|action| run_post_action(action, &output_root, options.dry_run))
        .collect();

    let manifest = PackageManifest {
        configuration: config.clone(),
        generated_at: Utc::now(),
        dry_run: options.dry_run,
        project_root,
        output_root: output_root.clone(),
        directories: plan.directories,
        files,
        post_package_results,
        warnings: plan.warnings,
    };

    if !options.dry_run {
        let path = manifest.save(&output_root)?;
        debug!("Wrote manifest to {}", path.display());
    }

    info!(
        "Packaged {} files ({} skipped, {} failed)",
        manifest.count(Outcome::Success),
        manifest.count(Outcome::Skipped),
        manifest.count(Outcome::Failed)
    );
    Ok(manifest)
}

fn check_output_root(output_root: &Path, force: bool) -> Result<()> {
    if !output_root.exists() {
        return Ok(());
    }
    if !output_root.is_dir() {
        return Err(PackError::OutputConflict {
            path: output_root.display().to_string(),
        }
        .into());
    }
    if !force && !is_dir_empty(output_root)? {
        return Err(PackError::OutputConflict {
            path: output_root.display().to_string(),
        }
        .into());
    }
    Ok(())
}

fn process_file(planned: &PlannedFile, output_root: &Path, dry_run: bool) -> FileRecord {
    let mut record = FileRecord {
        group: planned.group.clone(),
        source: planned.source.clone(),
        destination: planned.destination.clone(),
        action: planned.action,
        outcome: Outcome::Success,
        reason: None,
        checksum: None,
    };

    match &planned.disposition {
        Disposition::Skip(reason) => {
            record.outcome = Outcome::Skipped;
            record.reason = Some(reason.clone());
            return record;
        }
        Disposition::Fail(reason) => {
            record.outcome = Outcome::Failed;
            record.reason = Some(reason.clone());
            return record;
        }
        Disposition::Process => {}
    }

    match calculate_checksum(&planned.source) {
        Ok(checksum) => record.checksum = Some(format!("sha256:{checksum}")),
        Err(e) => {
            record.outcome = Outcome::Failed;
            record.reason = Some(format!("{e:#}"));
            return record;
        }
    }

    if !dry_run {
        let destination = output_root.join(&planned.destination);
        if let Err(e) = perform_file_action(planned.action, &planned.source, &destination) {
            warn!("[{}] {e:#}", planned.group);
            record.outcome = Outcome::Failed;
            record.reason = Some(format!("{e:#}"));
        }
    }

    record
}
