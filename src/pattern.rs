//! Glob expansion for file groups.
//!
//! File groups select their files with glob patterns evaluated against the project
//! root. Patterns accept either separator style (`lib\*.ps1` and `lib/*.ps1` are the
//! same pattern) and match case-insensitively, which mirrors how PowerShell users
//! expect paths to behave.
//!
//! # Pattern Syntax
//!
//! - `*` matches any sequence of characters within a single path component
//! - `**` matches any sequence of path components (recursive matching)
//! - `?` matches any single character
//! - `[abc]` / `[a-z]` match character sets and ranges
//!
//! Source patterns treat `/` literally, so `lib/*.ps1` does not descend into
//! `lib/sub/`. Exclusion patterns are lenient: they are tested against both the
//! project-relative path and the bare file name, and `*` may cross separators, so
//! `*.Tests.ps1` excludes test scripts anywhere in the tree.
//!
//! # Base Directory
//!
//! The literal leading components of a pattern (those without glob metacharacters)
//! form its base directory. Preserve-mode file groups mirror each match's path
//! relative to that base, and directory walking starts there.
//!
//! ```rust,no_run
//! use pspack::pattern::literal_base;
//! use std::path::PathBuf;
//!
//! assert_eq!(literal_base("src/lib/**/*.ps1"), PathBuf::from("src/lib"));
//! assert_eq!(literal_base("*.ps1"), PathBuf::new());
//! ```

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::utils::fs::to_forward_slashes;

const SOURCE_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

const EXCLUDE_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled source pattern for one file group.
///
/// # Examples
///
/// ```rust,no_run
/// use pspack::pattern::PatternMatcher;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let matcher = PatternMatcher::new("lib\\*.ps1")?;
///
/// assert!(matcher.matches(Path::new("lib/Config.ps1")));
/// assert!(!matcher.matches(Path::new("lib/sub/Deep.ps1")));
///
/// let matches = matcher.find_matches(Path::new("/path/to/project"))?;
/// println!("Found {} matching files", matches.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: Pattern,
    original_pattern: String,
    base: PathBuf,
}

impl PatternMatcher {
    /// Compiles a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern contains invalid glob syntax.
    pub fn new(pattern_str: &str) -> Result<Self> {
        let unified = normalize_pattern(pattern_str);
        let pattern = Pattern::new(&unified)
            .with_context(|| format!("Invalid glob pattern: {pattern_str}"))?;

        Ok(Self {
            pattern,
            original_pattern: pattern_str.to_string(),
            base: literal_base(&unified),
        })
    }

    /// Finds all files under `root` whose root-relative path matches the pattern.
    ///
    /// Returns root-relative paths in sorted order. Symlinks are not followed, and a
    /// base directory that does not exist yields an empty result rather than an error.
    pub fn find_matches(&self, root: &Path) -> Result<Vec<PathBuf>> {
        debug!("Searching for pattern '{}' in {}", self.original_pattern, root.display());

        let walk_root = root.join(&self.base);
        if !walk_root.exists() {
            debug!("Pattern base {} does not exist", walk_root.display());
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for entry in WalkDir::new(&walk_root)
            .follow_links(false)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
        {
            if let Ok(relative_path) = entry.path().strip_prefix(root) {
                trace!("Checking path: {}", relative_path.display());

                if self.matches(relative_path) {
                    matches.push(relative_path.to_path_buf());
                }
            }
        }

        matches.sort();
        debug!("Found {} matches for pattern '{}'", matches.len(), self.original_pattern);
        Ok(matches)
    }

    /// Checks if a root-relative path matches the pattern.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let path_str = to_forward_slashes(&path.to_string_lossy());
        self.pattern.matches_with(&path_str, SOURCE_OPTIONS)
    }

    /// Literal leading directory of the pattern.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The pattern as originally written.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.original_pattern
    }
}

/// Resolves a source pattern with exclusions applied.
///
/// ```rust,no_run
/// use pspack::pattern::PatternResolver;
/// use std::path::Path;
///
/// # fn example() -> anyhow::Result<()> {
/// let mut resolver = PatternResolver::new();
/// resolver.exclude("*.Tests.ps1")?;
///
/// let matches = resolver.resolve("**/*.ps1", Path::new("/project"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct PatternResolver {
    exclude_patterns: Vec<Pattern>,
}

impl PatternResolver {
    /// Creates a resolver with no exclusions.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            exclude_patterns: Vec::new(),
        }
    }

    /// Adds an exclusion pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the exclusion pattern is invalid glob syntax.
    pub fn exclude(&mut self, pattern: &str) -> Result<()> {
        let pattern = Pattern::new(&normalize_pattern(pattern))
            .with_context(|| format!("Invalid exclusion pattern: {pattern}"))?;
        self.exclude_patterns.push(pattern);
        Ok(())
    }

    /// Whether a root-relative path is removed by any exclusion pattern.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = to_forward_slashes(&path.to_string_lossy());
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());

        self.exclude_patterns.iter().any(|exclude| {
            exclude.matches_with(&path_str, EXCLUDE_OPTIONS)
                || file_name.as_deref().is_some_and(|name| exclude.matches_with(name, EXCLUDE_OPTIONS))
        })
    }

    /// Finds files matching `pattern` under `root`, minus exclusions, sorted.
    pub fn resolve(&self, pattern: &str, root: &Path) -> Result<Vec<PathBuf>> {
        let matcher = PatternMatcher::new(pattern)?;
        let mut matches = matcher.find_matches(root)?;

        if !self.exclude_patterns.is_empty() {
            matches.retain(|path| !self.is_excluded(path));
        }

        Ok(matches)
    }
}

/// Literal leading directory components of a pattern.
///
/// The final component is never part of the base, even without metacharacters,
/// because it names files rather than a directory.
#[must_use]
pub fn literal_base(pattern: &str) -> PathBuf {
    let unified = normalize_pattern(pattern);
    let mut components: Vec<&str> = unified.split('/').collect();
    components.pop();

    let mut base = PathBuf::new();
    for component in components {
        if component.is_empty() || component == "." {
            continue;
        }
        if component.contains(['*', '?', '[']) {
            break;
        }
        base.push(component);
    }
    base
}

/// Rejects patterns that could reach outside the project root.
///
/// # Errors
///
/// Returns an error for patterns containing `..` components or absolute roots.
pub fn validate_pattern_safety(pattern: &str) -> Result<()> {
    let unified = normalize_pattern(pattern);

    if unified.split('/').any(|component| component == "..") {
        anyhow::bail!("Pattern contains path traversal (..): {pattern}");
    }

    if unified.starts_with('/') {
        anyhow::bail!("Pattern contains absolute path: {pattern}");
    }

    let bytes = unified.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        anyhow::bail!("Pattern contains absolute path: {pattern}");
    }

    Ok(())
}

fn normalize_pattern(pattern: &str) -> String {
    let unified = to_forward_slashes(pattern.trim());
    unified.strip_prefix("./").map(str::to_string).unwrap_or(unified)
}
