//! End-to-end scenarios through the library API.

use pspack::config::{from_json_str, to_json};
use pspack::packager::{
    Outcome, PackageManifest, PackageOptions, RewriteOptions, materialize, project_root_for,
    rewrite_references, synthesize,
};
use pspack::resolver::{GraphOptions, build_graph};
use pspack::script::ResolutionStatus;
use pspack::test_utils::{ScriptProject, init_test_logging};
use pspack::utils::progress::ProgressBar;
use tempfile::TempDir;

fn options(project: &ScriptProject) -> GraphOptions {
    GraphOptions {
        search_roots: vec![project.root().to_path_buf()],
        max_depth: 10,
    }
}

#[test]
fn test_simple_chain() {
    init_test_logging(None);
    let project = ScriptProject::new()
        .script("A.ps1", ". $PSScriptRoot\\B.ps1\n")
        .script("B.ps1", ". $PSScriptRoot\\C.ps1\n")
        .script("C.ps1", "'leaf'\n");

    let result = build_graph(&[project.path("A.ps1")], &options(&project)).unwrap();

    assert_eq!(
        result.all_files,
        vec![project.path("A.ps1"), project.path("B.ps1"), project.path("C.ps1")]
    );
    assert_eq!(result.edge_count(), 2);
    assert!(!result.has_cycles());
    assert_eq!(result.unresolved_references().count(), 0);
}

#[test]
fn test_unresolved_and_variable_references_survive_synthesis() {
    init_test_logging(None);
    let project = ScriptProject::new()
        .script("Main.ps1", "# setup\n. .\\Missing.ps1\n. \"$env:TEMP\\x.ps1\"\n")
        .script("Other.ps1", "");

    let result = build_graph(&[project.path("Main.ps1")], &options(&project)).unwrap();
    let statuses: Vec<ResolutionStatus> =
        result.unresolved_references().map(|reference| reference.status).collect();
    assert_eq!(statuses, vec![ResolutionStatus::NotFound, ResolutionStatus::Variable]);

    let config = synthesize(&result, "main");
    config.validate().unwrap();
    let metadata = config.dependency_metadata.as_ref().unwrap();
    assert_eq!(metadata.total_files_analyzed, 1);
    let lines: Vec<usize> = metadata.unresolved_dependencies.iter().map(|u| u.line).collect();
    assert_eq!(lines, vec![2, 3]);

    let reloaded = from_json_str(&to_json(&config).unwrap(), "synthesized").unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn test_analyze_synthesize_package_rewrite() {
    init_test_logging(None);
    let project = ScriptProject::new()
        .script("app/Main.ps1", ". $PSScriptRoot\\lib\\Config.ps1\n")
        .script("app/lib/Config.ps1", ". $PSScriptRoot\\..\\shared\\Log.ps1\n")
        .script("app/shared/Log.ps1", "function Write-Log {}\n");

    let result = build_graph(&[project.path("app/Main.ps1")], &options(&project)).unwrap();
    assert_eq!(result.all_files.len(), 3);

    let config = synthesize(&result, "app");
    let root = project_root_for(&result);
    assert_eq!(root, project.path("app"));

    let out = TempDir::new().unwrap();
    let package_options = PackageOptions::new(&root);
    let manifest = materialize(&config, out.path(), &package_options, &ProgressBar::hidden()).unwrap();
    assert_eq!(manifest.count(Outcome::Success), 3);
    assert!(out.path().join("shared/Log.ps1").is_file());

    let reloaded = PackageManifest::load(out.path()).unwrap();
    assert_eq!(reloaded.files, manifest.files);

    // Structure was preserved, so every reference is already correct.
    let rewrite = rewrite_references(&config, out.path(), &RewriteOptions::new(&root)).unwrap();
    assert!(rewrite.success);
    assert_eq!(rewrite.paths_updated, 0);
    assert_eq!(
        std::fs::read_to_string(out.path().join("lib/Config.ps1")).unwrap(),
        ". $PSScriptRoot\\..\\shared\\Log.ps1\n"
    );
}

#[test]
fn test_cycle_is_packaged_once() {
    init_test_logging(None);
    let project = ScriptProject::new()
        .script("A.ps1", ". $PSScriptRoot\\B.ps1\n")
        .script("B.ps1", ". $PSScriptRoot\\A.ps1\n");

    let result = build_graph(&[project.path("A.ps1")], &options(&project)).unwrap();
    assert_eq!(result.cycles.len(), 1);

    let config = synthesize(&result, "cycle");
    let out = TempDir::new().unwrap();
    let manifest = materialize(
        &config,
        out.path(),
        &PackageOptions::new(project_root_for(&result)),
        &ProgressBar::hidden(),
    )
    .unwrap();

    let destinations: Vec<&str> = manifest.files.iter().map(|f| f.destination.as_str()).collect();
    assert_eq!(destinations, vec!["A.ps1", "B.ps1"]);
}
