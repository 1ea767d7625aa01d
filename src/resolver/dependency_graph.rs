//! Bounded breadth-first dependency graph over PowerShell scripts.
//!
//! This module owns the traversal, the per-file analysis records, and the
//! `petgraph` view of resolved edges used for cycle reporting and tree rendering.

use anyhow::Result;
use chrono::{DateTime, Utc};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::path_resolver::PathResolver;
use crate::core::PackError;
use crate::script::{ReferenceKind, SourceReference, extract_from_path};
use crate::utils::fs::{absolutize, path_key};

/// Traversal bound used when the caller does not choose one.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Parameters for one analysis run.
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// Directories tried, in order, for references not found next to their script.
    pub search_roots: Vec<PathBuf>,
    /// Files discovered deeper than this are recorded but not analyzed.
    pub max_depth: usize,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            search_roots: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One analyzed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyGraphNode {
    pub file_path: PathBuf,
    pub references: Vec<SourceReference>,
    /// Distance from the nearest starting file; 0 for starting files.
    pub analyzed_depth: usize,
    /// Set when the file could not be read; `references` is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_error: Option<String>,
}

/// Result of one [`build_graph`] run.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyGraphResult {
    /// Every discovered file, analyzed or not, in discovery order.
    pub all_files: Vec<PathBuf>,
    /// Analyzed files in analysis order.
    pub nodes: Vec<DependencyGraphNode>,
    pub starting_files: Vec<PathBuf>,
    pub search_paths: Vec<PathBuf>,
    pub max_depth: usize,
    pub analysis_timestamp: DateTime<Utc>,
    /// Strongly connected groups of files, each sorted, in first-discovery order.
    pub cycles: Vec<Vec<PathBuf>>,
    #[serde(skip)]
    node_index: HashMap<String, usize>,
    #[serde(skip)]
    graph: ReferenceGraph,
}

impl DependencyGraphResult {
    /// Looks up an analyzed node; comparison ignores case and separator style.
    #[must_use]
    pub fn node(&self, path: &Path) -> Option<&DependencyGraphNode> {
        self.node_index.get(&path_key(path)).map(|&index| &self.nodes[index])
    }

    /// Whether `path` was discovered, analyzed or not.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        let key = path_key(path);
        self.all_files.iter().any(|file| path_key(file) == key)
    }

    /// References that did not resolve to a file, in analysis order.
    pub fn unresolved_references(&self) -> impl Iterator<Item = &SourceReference> {
        self.nodes
            .iter()
            .flat_map(|node| node.references.iter())
            .filter(|reference| !reference.is_resolved())
    }

    /// Number of resolved reference edges (parallel references count once).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.graph.edge_count()
    }

    #[must_use]
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Renders an indented dependency tree rooted at each starting file.
    ///
    /// Paths are shown relative to `display_root` when they live under it.
    /// Revisits are marked `(circular reference)` when the file is its own
    /// ancestor and `(already shown)` otherwise; unresolved references are shown
    /// with their status in brackets.
    #[must_use]
    pub fn to_tree_string(&self, display_root: Option<&Path>) -> String {
        let mut result = String::new();
        let mut shown = HashSet::new();

        for start in &self.starting_files {
            let key = path_key(start);
            if !shown.insert(key.clone()) {
                continue;
            }
            result.push_str(&format!("{}\n", display_path(start, display_root)));
            let mut ancestors = vec![key];
            self.build_tree_string(start, &mut result, "", &mut ancestors, &mut shown, display_root);
        }

        result
    }

    fn build_tree_string(
        &self,
        path: &Path,
        result: &mut String,
        prefix: &str,
        ancestors: &mut Vec<String>,
        shown: &mut HashSet<String>,
        display_root: Option<&Path>,
    ) {
        let Some(node) = self.node(path) else {
            return;
        };

        if let Some(error) = &node.read_error {
            result.push_str(&format!("{prefix}└── (unreadable: {error})\n"));
            return;
        }

        for (i, reference) in node.references.iter().enumerate() {
            let is_last = i == node.references.len() - 1;
            let connector = if is_last {
                "└── "
            } else {
                "├── "
            };
            let child_prefix = if is_last {
                format!("{prefix}    ")
            } else {
                format!("{prefix}│   ")
            };

            let Some(target) = &reference.resolved_path else {
                result.push_str(&format!(
                    "{prefix}{connector}{} [{}]\n",
                    reference.raw_text, reference.status
                ));
                continue;
            };

            let key = path_key(target);
            let label = display_path(target, display_root);
            if ancestors.contains(&key) {
                result.push_str(&format!("{prefix}{connector}{label} (circular reference)\n"));
            } else if !shown.insert(key.clone()) {
                result.push_str(&format!("{prefix}{connector}{label} (already shown)\n"));
            } else if self.node(target).is_none() {
                result.push_str(&format!("{prefix}{connector}{label} (depth limit)\n"));
            } else {
                result.push_str(&format!("{prefix}{connector}{label}\n"));
                ancestors.push(key);
                self.build_tree_string(target, result, &child_prefix, ancestors, shown, display_root);
                ancestors.pop();
            }
        }
    }
}

/// Resolved-edge view of the analysis, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
struct ReferenceGraph {
    graph: DiGraph<PathBuf, ReferenceKind>,
    node_map: HashMap<String, NodeIndex>,
}

impl ReferenceGraph {
    fn ensure_node(&mut self, path: &Path) -> NodeIndex {
        let key = path_key(path);
        if let Some(&index) = self.node_map.get(&key) {
            index
        } else {
            let index = self.graph.add_node(path.to_path_buf());
            self.node_map.insert(key, index);
            index
        }
    }

    fn add_reference(&mut self, from: &Path, to: &Path, kind: ReferenceKind) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, kind);
        }
    }

    /// Strongly connected components of size two or more, plus self-references.
    fn cycles(&self) -> Vec<Vec<PathBuf>> {
        let mut cycles: Vec<(usize, Vec<PathBuf>)> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component.first().is_some_and(|&n| self.graph.contains_edge(n, n))
            })
            .map(|component| {
                let first_seen = component.iter().map(|n| n.index()).min().unwrap_or_default();
                let mut files: Vec<PathBuf> =
                    component.iter().map(|&n| self.graph[n].clone()).collect();
                files.sort();
                (first_seen, files)
            })
            .collect();

        cycles.sort_by_key(|(first_seen, _)| *first_seen);
        cycles.into_iter().map(|(_, files)| files).collect()
    }
}

/// Builds the dependency graph reachable from `starting_files`.
///
/// Unreadable files become nodes with no references; unresolved references are
/// recorded on their node. Neither aborts the run.
///
/// # Errors
///
/// Returns [`PackError::EmptyStartingFiles`] when `starting_files` is empty.
pub fn build_graph(starting_files: &[PathBuf], options: &GraphOptions) -> Result<DependencyGraphResult> {
    if starting_files.is_empty() {
        return Err(PackError::EmptyStartingFiles.into());
    }

    let resolver = PathResolver::new(options.search_roots.clone());

    let mut seen_starts = HashSet::new();
    let starts: Vec<PathBuf> = starting_files
        .iter()
        .map(|file| absolutize(file))
        .filter(|file| seen_starts.insert(path_key(file)))
        .collect();

    let mut queue: VecDeque<(PathBuf, usize)> = starts.iter().map(|file| (file.clone(), 0)).collect();
    let mut visited: HashSet<String> = HashSet::new();
    let mut discovered: HashSet<String> = HashSet::new();
    let mut all_files = Vec::new();
    let mut nodes = Vec::new();
    let mut node_index = HashMap::new();
    let mut graph = ReferenceGraph::default();

    while let Some((path, depth)) = queue.pop_front() {
        let key = path_key(&path);
        if visited.contains(&key) {
            continue;
        }
        if discovered.insert(key.clone()) {
            all_files.push(path.clone());
        }
        if depth > options.max_depth {
            trace!("Not analyzing {} beyond depth {}", path.display(), options.max_depth);
            continue;
        }
        visited.insert(key.clone());

        debug!("Analyzing {} at depth {depth}", path.display());
        graph.ensure_node(&path);

        let mut references = extract_from_path(&path);
        let read_error = if references.first().is_some_and(SourceReference::is_read_failure) {
            references.clear();
            Some("file could not be read".to_string())
        } else {
            None
        };

        for reference in &mut references {
            resolver.resolve_in_place(reference);
            trace!(
                "{}:{} {} '{}' -> {}",
                path.display(),
                reference.line_number,
                reference.kind,
                reference.raw_text,
                reference.status
            );

            if let Some(target) = &reference.resolved_path {
                graph.add_reference(&path, target, reference.kind);
                if !visited.contains(&path_key(target)) {
                    queue.push_back((target.clone(), depth + 1));
                }
            }
        }

        node_index.insert(key, nodes.len());
        nodes.push(DependencyGraphNode {
            file_path: path,
            references,
            analyzed_depth: depth,
            read_error,
        });
    }

    let cycles = graph.cycles();
    debug!(
        "Analysis complete: {} files discovered, {} analyzed, {} cycles",
        all_files.len(),
        nodes.len(),
        cycles.len()
    );

    Ok(DependencyGraphResult {
        all_files,
        nodes,
        starting_files: starts,
        search_paths: resolver.search_roots().to_vec(),
        max_depth: options.max_depth,
        analysis_timestamp: Utc::now(),
        cycles,
        node_index,
        graph,
    })
}

fn display_path(path: &Path, display_root: Option<&Path>) -> String {
    let shown = display_root
        .and_then(|root| path.strip_prefix(root).ok())
        .unwrap_or(path);
    shown.display().to_string()
}
