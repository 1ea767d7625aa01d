//! Path utilities for normalization, containment checks and relative paths.
//!
//! Everything here is lexical: no function touches the filesystem except
//! [`absolutize`], which only consults the current directory.

use std::path::{Component, Path, PathBuf};

/// Normalizes a path by resolving `.` and `..` components.
///
/// Leading `..` components of a relative path are kept; `..` directly under the
/// root is dropped, matching how the OS resolves `/..`.
///
/// # Examples
///
/// ```rust,no_run
/// use pspack::utils::fs::normalize_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(normalize_path(Path::new("/foo/./bar/../baz")), PathBuf::from("/foo/baz"));
/// assert_eq!(normalize_path(Path::new("../src/./lib.rs")), PathBuf::from("../src/lib.rs"));
/// ```
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Checks if a path stays inside the base directory after normalization.
///
/// # Examples
///
/// ```rust,no_run
/// use pspack::utils::fs::is_safe_path;
/// use std::path::Path;
///
/// let base = Path::new("/home/user/dist");
/// assert!(is_safe_path(base, Path::new("scripts/Main.ps1")));
/// assert!(!is_safe_path(base, Path::new("../../../etc/passwd")));
/// assert!(!is_safe_path(base, Path::new("/etc/passwd")));
/// ```
#[must_use]
pub fn is_safe_path(base: &Path, path: &Path) -> bool {
    let normalized_base = normalize_path(base);
    let normalized_path = if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    };

    normalized_path.starts_with(normalized_base)
}

/// Checks that a configuration path is relative and cannot escape its root.
///
/// Accepts both separator styles, so `lib\Config.ps1` and `lib/Config.ps1` are
/// treated alike. Drive-qualified paths (`C:\...`, `C:foo`) are rejected on every
/// platform because they are absolute on Windows.
#[must_use]
pub fn is_safe_relative(raw: &str) -> bool {
    let unified = to_forward_slashes(raw);
    if unified.starts_with('/') {
        return false;
    }
    let bytes = unified.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return false;
    }

    let path = Path::new(&unified);
    if path.is_absolute() || path.has_root() {
        return false;
    }

    !matches!(normalize_path(path).components().next(), Some(Component::ParentDir))
}

/// Replaces backslash separators with forward slashes.
#[must_use]
pub fn to_forward_slashes(raw: &str) -> String {
    raw.replace('\\', "/")
}

/// Case-insensitive identity key for a path.
///
/// Two paths that differ only in letter case, separator style, `.`/`..` segments,
/// or trailing separators produce the same key.
#[must_use]
pub fn path_key(path: &Path) -> String {
    let unified = to_forward_slashes(&path.to_string_lossy());
    let normalized = normalize_path(Path::new(&unified));
    let text = to_forward_slashes(&normalized.to_string_lossy());
    let trimmed = if text.len() > 1 {
        text.trim_end_matches('/')
    } else {
        text.as_str()
    };
    trimmed.to_lowercase()
}

/// Returns an absolute, normalized version of `path`.
///
/// Relative paths are joined to the current directory. If the current directory is
/// unavailable the path is only normalized.
#[must_use]
pub fn absolutize(path: &Path) -> PathBuf {
    match std::path::absolute(path) {
        Ok(absolute) => normalize_path(&absolute),
        Err(_) => normalize_path(path),
    }
}

/// Computes the relative path leading from directory `from_dir` to `to`.
///
/// Both inputs are normalized first. When they share no common prefix (for example
/// different drive letters) `to` is returned unchanged.
///
/// # Examples
///
/// ```rust,no_run
/// use pspack::utils::fs::relative_path;
/// use std::path::{Path, PathBuf};
///
/// let rel = relative_path(Path::new("/pkg/scripts"), Path::new("/pkg/lib/Config.ps1"));
/// assert_eq!(rel, PathBuf::from("../lib/Config.ps1"));
/// ```
#[must_use]
pub fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let from = normalize_path(from_dir);
    let to = normalize_path(to);

    let from_components: Vec<Component<'_>> = from.components().collect();
    let to_components: Vec<Component<'_>> = to.components().collect();

    let shared = from_components
        .iter()
        .zip(to_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if shared == 0 && (from.has_root() || to.has_root()) {
        return to;
    }

    let mut result = PathBuf::new();
    for _ in shared..from_components.len() {
        result.push("..");
    }
    for component in &to_components[shared..] {
        result.push(component.as_os_str());
    }
    result
}

/// Deepest directory containing every path in `paths`.
///
/// Paths are compared component-wise after normalization. Returns `None` for an
/// empty slice or when the paths share nothing (not even a root).
#[must_use]
pub fn common_ancestor(paths: &[PathBuf]) -> Option<PathBuf> {
    let mut iter = paths.iter();
    let first = normalize_path(iter.next()?);
    let mut prefix: Vec<Component<'_>> = first.components().collect();

    let rest: Vec<PathBuf> = iter.map(|p| normalize_path(p)).collect();
    for path in &rest {
        let shared = prefix
            .iter()
            .zip(path.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        prefix.truncate(shared);
    }

    if prefix.is_empty() {
        None
    } else {
        Some(prefix.iter().collect())
    }
}
