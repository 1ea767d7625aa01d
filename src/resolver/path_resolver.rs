//! Maps a reference string to the file it denotes.
//!
//! Resolution is a handful of single-shot existence checks. Nothing is walked, so
//! symlink loops cannot stall it.

use std::path::{Path, PathBuf};
use tracing::trace;

use crate::script::{ResolutionStatus, SourceReference, expand_anchor, strip_leading_anchor};
use crate::utils::fs::{absolutize, normalize_path, to_forward_slashes};

/// Resolves references against a fixed, ordered list of search roots.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    search_roots: Vec<PathBuf>,
}

impl PathResolver {
    /// Creates a resolver; roots are tried in the order given.
    #[must_use]
    pub fn new(search_roots: Vec<PathBuf>) -> Self {
        Self {
            search_roots: search_roots.iter().map(|root| absolutize(root)).collect(),
        }
    }

    #[must_use]
    pub fn search_roots(&self) -> &[PathBuf] {
        &self.search_roots
    }

    /// Resolves `raw` as written in the script at `origin`.
    #[must_use]
    pub fn resolve(&self, origin: &Path, raw: &str) -> Option<PathBuf> {
        resolve_reference(origin, raw, &self.search_roots)
    }

    /// Updates a reference's status and resolved path in place.
    ///
    /// Variable references and read-failure placeholders are left untouched.
    pub fn resolve_in_place(&self, reference: &mut SourceReference) {
        if reference.status == ResolutionStatus::Variable || reference.is_read_failure() {
            return;
        }

        match self.resolve(&reference.origin_path, &reference.raw_text) {
            Some(path) => {
                reference.status = ResolutionStatus::Resolved;
                reference.resolved_path = Some(path);
            }
            None => {
                reference.status = ResolutionStatus::NotFound;
                reference.resolved_path = None;
            }
        }
    }
}

/// Resolves a reference against the filesystem.
///
/// Returns the absolute, normalized path of the first existing regular file, or
/// `None` when nothing matches.
#[must_use]
pub fn resolve_reference(origin: &Path, raw: &str, search_roots: &[PathBuf]) -> Option<PathBuf> {
    resolve_reference_with(origin, raw, search_roots, Path::is_file)
}

/// Resolves a reference using `exists` as the existence probe.
///
/// Candidates are produced in priority order and `exists` is called once per
/// candidate until one is accepted.
pub fn resolve_reference_with(
    origin: &Path,
    raw: &str,
    search_roots: &[PathBuf],
    exists: impl Fn(&Path) -> bool,
) -> Option<PathBuf> {
    let unified = to_forward_slashes(raw.trim());
    if unified.is_empty() {
        return None;
    }

    let origin = absolutize(origin);
    let origin_dir = origin.parent().unwrap_or_else(|| Path::new("/"));

    if is_absolute_reference(&unified) {
        let candidate = normalize_path(Path::new(&unified));
        trace!("Trying absolute reference {}", candidate.display());
        return exists(&candidate).then_some(candidate);
    }

    let expanded = to_forward_slashes(&expand_anchor(&unified, origin_dir));
    let origin_candidate = if Path::new(&expanded).is_absolute() {
        normalize_path(Path::new(&expanded))
    } else {
        normalize_path(&origin_dir.join(&expanded))
    };
    trace!("Trying origin-relative candidate {}", origin_candidate.display());
    if exists(&origin_candidate) {
        return Some(origin_candidate);
    }

    // Anchored references are joined to search roots without their anchor.
    let relative = match strip_leading_anchor(&unified) {
        Some((_, rest)) => rest.trim_start_matches('/'),
        None => unified.as_str(),
    };
    for root in search_roots {
        let candidate = normalize_path(&root.join(relative));
        trace!("Trying search-root candidate {}", candidate.display());
        if exists(&candidate) {
            return Some(candidate);
        }
    }

    None
}

/// Absolute on this platform, or drive-qualified (`C:/...`) on any platform.
fn is_absolute_reference(unified: &str) -> bool {
    if Path::new(unified).is_absolute() {
        return true;
    }
    let bytes = unified.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}
