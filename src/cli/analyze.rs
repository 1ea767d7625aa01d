//! Print the dependency graph of one or more starting scripts.
//!
//! # Examples
//!
//! ```bash
//! pspack analyze --starting-files Main.ps1
//! pspack analyze --starting-files Main.ps1 Setup.ps1 --search-paths ./lib ~/Modules
//! pspack analyze --starting-files Main.ps1 --max-depth 3 --format json
//! ```
//!
//! # Output Format
//!
//! ## Tree Format (Default)
//! ```text
//! Main.ps1
//! ├── lib/Config.ps1
//! │   └── Main.ps1 (circular reference)
//! └── .\lib\Missing.ps1 [not found]
//!
//! 2 files analyzed, 1 unresolved reference, 1 cycle
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::{expand_paths, project_root, starting_files};
use crate::core::PackError;
use crate::resolver::{DEFAULT_MAX_DEPTH, DependencyGraphResult, GraphOptions, build_graph};

/// Command to analyze script dependencies.
#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// Scripts to start the analysis from
    #[arg(long, num_args = 1.., value_name = "PATH")]
    starting_files: Vec<String>,

    /// Directories tried, in order, for references not found next to their script
    ///
    /// Defaults to the current directory. `~` and environment variables are
    /// expanded.
    #[arg(long, num_args = 1.., value_name = "PATH")]
    search_paths: Vec<String>,

    /// Files deeper than this are listed but not analyzed
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Output format (tree, json)
    #[arg(short = 'f', long, default_value = "tree", value_parser = ["tree", "json"])]
    format: String,
}

impl AnalyzeCommand {
    /// Runs the analysis and prints it; exits 0 whenever the analysis ran.
    pub fn execute(self, _config: &CliConfig) -> Result<i32> {
        let starting_files = starting_files(&self.starting_files)?;
        let cwd = project_root(None)?;

        let search_roots = if self.search_paths.is_empty() {
            vec![cwd.clone()]
        } else {
            expand_paths(&self.search_paths)?
        };

        let options = GraphOptions {
            search_roots,
            max_depth: self.max_depth,
        };
        let result = build_graph(&starting_files, &options)?;

        match self.format.as_str() {
            "json" => {
                let json = serde_json::to_string_pretty(&result).map_err(PackError::from)?;
                println!("{json}");
            }
            _ => print_tree(&result, &cwd),
        }

        Ok(0)
    }
}

fn print_tree(result: &DependencyGraphResult, display_root: &std::path::Path) {
    for line in result.to_tree_string(Some(display_root)).lines() {
        if line.contains("[not found]") || line.contains("(unreadable") {
            println!("{}", line.red());
        } else if line.contains("[variable]") {
            println!("{}", line.yellow());
        } else if line.contains("(circular reference)") {
            println!("{}", line.magenta());
        } else if line.contains("(already shown)") || line.contains("(depth limit)") {
            println!("{}", line.bright_black());
        } else {
            println!("{line}");
        }
    }

    let unresolved = result.unresolved_references().count();
    println!();
    println!(
        "{} files analyzed, {} unresolved reference{}, {} cycle{}",
        result.nodes.len(),
        unresolved,
        if unresolved == 1 { "" } else { "s" },
        result.cycles.len(),
        if result.cycles.len() == 1 { "" } else { "s" },
    );

    for cycle in &result.cycles {
        let members: Vec<String> = cycle
            .iter()
            .map(|path| path.strip_prefix(display_root).unwrap_or(path).display().to_string())
            .collect();
        println!("  {} {}", "cycle:".magenta(), members.join(" -> "));
    }
}
