//! Rewrites script references inside a materialized package.
//!
//! Flattening (or any destination that differs from the source layout) breaks
//! relative references. For every packaged script this module re-extracts the
//! references from the original content, resolves each one against the original
//! tree, and when the target was packaged too, substitutes the path from the new
//! location to the target's new location into the exact line/column span.
//!
//! Unresolved references, references to files outside the package, and lines
//! that no longer contain the original text are left untouched, so running the
//! rewriter twice changes nothing the second time.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::manifest::{MANIFEST_FILE_NAME, Outcome, PackageManifest};
use super::materializer::plan;
use crate::config::PackageConfiguration;
use crate::resolver::resolve_reference_with;
use crate::script::reference_extractor::{UTF8_BOM, decode_script};
use crate::script::{ResolutionStatus, SourceReference, extract_references, is_script_file, strip_leading_anchor};
use crate::utils::fs::{absolutize, atomic_write, path_key, relative_path, to_forward_slashes};

/// Suffix appended to a rewritten file's name for its backup copy.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Options for [`rewrite_references`].
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    /// Root of the original tree.
    pub project_root: PathBuf,
    /// Roots tried, in order, for references not found next to their script.
    /// Empty means the project root alone.
    pub search_roots: Vec<PathBuf>,
    /// Write `<file>.bak` before overwriting a script.
    pub create_backups: bool,
    /// Count changes without writing.
    pub dry_run: bool,
}

impl RewriteOptions {
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            search_roots: Vec::new(),
            create_backups: false,
            dry_run: false,
        }
    }
}

/// One substituted reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteRecord {
    /// Packaged script that was changed.
    pub file: PathBuf,
    pub line: usize,
    pub old_text: String,
    pub new_text: String,
}

/// A packaged script that could not be rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteFailure {
    pub file: PathBuf,
    pub reason: String,
}

/// Outcome of one rewrite run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RewriteResult {
    /// References substituted (or that would be, in a dry run).
    pub paths_updated: usize,
    /// Scripts with at least one substitution.
    pub scripts_updated: usize,
    /// False when any script failed.
    pub success: bool,
    pub records: Vec<RewriteRecord>,
    pub failures: Vec<RewriteFailure>,
}

/// Source-to-package mapping keyed by [`path_key`] of the source.
struct PackageMap {
    entries: Vec<(PathBuf, PathBuf)>,
    by_source: HashMap<String, PathBuf>,
}

impl PackageMap {
    fn new(entries: Vec<(PathBuf, PathBuf)>) -> Self {
        let by_source = entries
            .iter()
            .map(|(source, packaged)| (path_key(source), packaged.clone()))
            .collect();
        Self {
            entries,
            by_source,
        }
    }

    fn packaged(&self, source: &Path) -> Option<&PathBuf> {
        self.by_source.get(&path_key(source))
    }
}

/// Rewrites references in every packaged script under `package_path`.
///
/// Destinations come from `package-manifest.json` when the package has one;
/// otherwise they are re-planned from `config`.
///
/// # Errors
///
/// Fails only when neither the manifest nor the configuration can produce a
/// mapping. Per-script problems are reported in [`RewriteResult::failures`].
pub fn rewrite_references(
    config: &PackageConfiguration,
    package_path: &Path,
    options: &RewriteOptions,
) -> Result<RewriteResult> {
    let package_path = absolutize(package_path);
    let project_root = absolutize(&options.project_root);
    let map = package_map(config, &package_path, &project_root)?;
    let search_roots = if options.search_roots.is_empty() {
        vec![project_root]
    } else {
        options.search_roots.iter().map(|root| absolutize(root)).collect()
    };

    let mut result = RewriteResult {
        success: true,
        ..RewriteResult::default()
    };

    for (source, packaged) in &map.entries {
        if !is_script_file(packaged) {
            continue;
        }
        match rewrite_script(source, packaged, &map, &search_roots, options) {
            Ok(records) if records.is_empty() => {}
            Ok(records) => {
                result.scripts_updated += 1;
                result.paths_updated += records.len();
                result.records.extend(records);
            }
            Err(e) => {
                warn!("Failed to rewrite {}: {e:#}", packaged.display());
                result.success = false;
                result.failures.push(RewriteFailure {
                    file: packaged.clone(),
                    reason: format!("{e:#}"),
                });
            }
        }
    }

    info!(
        "Rewrote {} references in {} scripts{}",
        result.paths_updated,
        result.scripts_updated,
        if options.dry_run { " (dry run)" } else { "" }
    );
    Ok(result)
}

fn package_map(config: &PackageConfiguration, package_path: &Path, project_root: &Path) -> Result<PackageMap> {
    if package_path.join(MANIFEST_FILE_NAME).is_file() {
        let manifest = PackageManifest::load(package_path)?;
        debug!("Using manifest with {} file records", manifest.files.len());
        let entries = manifest
            .files
            .iter()
            .filter(|record| record.outcome == Outcome::Success)
            .map(|record| (record.source.clone(), package_path.join(&record.destination)))
            .collect();
        return Ok(PackageMap::new(entries));
    }

    debug!("No manifest in {}, planning destinations from configuration", package_path.display());
    let plan = plan(config, project_root, Some(package_path))
        .context("Failed to compute package destinations")?;
    Ok(PackageMap::new(
        plan.processed()
            .map(|file| (file.source.clone(), package_path.join(&file.destination)))
            .collect(),
    ))
}

struct Substitution {
    line: usize,
    start: usize,
    end: usize,
    old_text: String,
    new_text: String,
}

fn rewrite_script(
    source: &Path,
    packaged: &Path,
    map: &PackageMap,
    search_roots: &[PathBuf],
    options: &RewriteOptions,
) -> Result<Vec<RewriteRecord>> {
    let packaged_bytes =
        fs::read(packaged).with_context(|| format!("Failed to read packaged script {}", packaged.display()))?;
    let packaged_text = decode_script(&packaged_bytes);

    let original_text = if source.is_file() {
        let bytes = fs::read(source).with_context(|| format!("Failed to read {}", source.display()))?;
        decode_script(&bytes)
    } else {
        packaged_text.clone()
    };

    let packaged_dir = packaged.parent().unwrap_or(packaged);
    let probe = |candidate: &Path| candidate.is_file() || map.packaged(candidate).is_some();

    let mut substitutions: Vec<Substitution> = extract_references(&original_text, source)
        .into_iter()
        .filter(|reference| reference.status != ResolutionStatus::Variable && !reference.is_read_failure())
        .filter_map(|reference| {
            let target = resolve_reference_with(source, &reference.raw_text, search_roots, probe)?;
            let new_location = map.packaged(&target)?;
            let replacement = replacement_text(&reference, &relative_path(packaged_dir, new_location));
            (replacement != reference.raw_text).then(|| Substitution {
                line: reference.line_number,
                start: reference.column_start,
                end: reference.column_end,
                old_text: reference.raw_text,
                new_text: replacement,
            })
        })
        .collect();

    if substitutions.is_empty() {
        return Ok(Vec::new());
    }

    // Right to left so earlier spans on the same line keep their offsets.
    substitutions.sort_by(|a, b| (a.line, b.start).cmp(&(b.line, a.start)));

    let mut lines: Vec<String> = packaged_text.split_inclusive('\n').map(str::to_string).collect();
    let mut records = Vec::new();
    for substitution in substitutions {
        let Some(line) = lines.get_mut(substitution.line - 1) else {
            continue;
        };
        if line.get(substitution.start..substitution.end) != Some(substitution.old_text.as_str()) {
            debug!(
                "{}:{} no longer contains '{}', leaving it",
                packaged.display(),
                substitution.line,
                substitution.old_text
            );
            continue;
        }

        let quoted = substitution.start > 0
            && matches!(line.as_bytes()[substitution.start - 1], b'"' | b'\'');
        let new_text = if !quoted && substitution.new_text.contains(char::is_whitespace) {
            format!("\"{}\"", substitution.new_text)
        } else {
            substitution.new_text
        };

        debug!(
            "{}:{} '{}' -> '{}'",
            packaged.display(),
            substitution.line,
            substitution.old_text,
            new_text
        );
        line.replace_range(substitution.start..substitution.end, &new_text);
        records.push(RewriteRecord {
            file: packaged.to_path_buf(),
            line: substitution.line,
            old_text: substitution.old_text,
            new_text,
        });
    }

    if records.is_empty() || options.dry_run {
        records.sort_by_key(|record| record.line);
        return Ok(records);
    }

    if options.create_backups {
        let mut backup_name = packaged.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        backup_name.push(BACKUP_SUFFIX);
        let backup = packaged.with_file_name(backup_name);
        fs::write(&backup, &packaged_bytes)
            .with_context(|| format!("Failed to write backup {}", backup.display()))?;
    }

    let mut output = Vec::with_capacity(packaged_bytes.len());
    // UTF-16 input is written back as UTF-8, keeping a byte order mark.
    if [UTF8_BOM, &[0xFF, 0xFE], &[0xFE, 0xFF]].iter().any(|bom| packaged_bytes.starts_with(bom)) {
        output.extend_from_slice(UTF8_BOM);
    }
    output.extend_from_slice(lines.concat().as_bytes());
    atomic_write(packaged, &output)?;

    records.sort_by_key(|record| record.line);
    Ok(records)
}

/// Formats `relative` in the style of the original reference.
fn replacement_text(reference: &SourceReference, relative: &Path) -> String {
    let raw = reference.raw_text.as_str();
    let separator = if raw.contains('\\') || !raw.contains('/') { "\\" } else { "/" };
    let relative = to_forward_slashes(&relative.to_string_lossy()).replace('/', separator);

    if let Some((anchor, _)) = strip_leading_anchor(raw) {
        return format!("{anchor}{separator}{relative}");
    }

    let unified = to_forward_slashes(raw);
    if Path::new(&unified).is_absolute() || unified.as_bytes().get(1) == Some(&b':') {
        return format!("$PSScriptRoot{separator}{relative}");
    }

    // A bare file name would be looked up as a command.
    if (unified.starts_with("./") && !relative.starts_with("..")) || !relative.contains(separator) {
        return format!(".{separator}{relative}");
    }
    relative
}
