//! Integration tests for `pspack auto-package`.

use crate::common::{DirAssert, FileAssert, TestProject};

fn app_project() -> TestProject {
    let project = TestProject::new().unwrap();
    project
        .write("Main.ps1", ". $PSScriptRoot\\lib\\Config.ps1\n. .\\lib\\Absent.ps1\n")
        .unwrap();
    project.write("lib/Config.ps1", ". $PSScriptRoot\\util\\Log.ps1\n").unwrap();
    project.write("lib/util/Log.ps1", "function Write-Log {}\n").unwrap();
    project.write("Unused.ps1", "'not referenced'\n").unwrap();
    project
}

#[test]
fn test_auto_package_copies_the_dependency_closure() {
    let project = app_project();
    let output = project.output_path("dist");

    let result = project
        .run_pspack(&["auto-package", "--starting-files", "Main.ps1", "--output", output.to_str().unwrap()])
        .unwrap();
    result.assert_success().assert_stdout_contains("Configuration written to");

    FileAssert::exists(output.join("Main.ps1"));
    FileAssert::exists(output.join("lib/Config.ps1"));
    FileAssert::exists(output.join("lib/util/Log.ps1"));
    FileAssert::not_exists(output.join("Unused.ps1"));
    FileAssert::exists(output.join("package-manifest.json"));

    let config: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output.join("package-config.json")).unwrap()).unwrap();
    assert_eq!(config["package"]["name"], "Main");
    assert_eq!(config["package"]["version"], "1.0.0");
    assert_eq!(config["package"]["auto_generated"], true);

    let groups: Vec<&str> = config["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|group| group["name"].as_str().unwrap())
        .collect();
    assert_eq!(groups, vec!["root", "lib", "lib-util"]);

    let metadata = &config["dependency_metadata"];
    assert_eq!(metadata["total_files_analyzed"], 3);
    let unresolved = metadata["unresolved_dependencies"].as_array().unwrap();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0]["line"], 2);
}

#[test]
fn test_synthesized_configuration_repackages() {
    let project = app_project();
    let first = project.output_path("first");
    let second = project.output_path("second");

    project
        .run_pspack(&[
            "auto-package",
            "--starting-files",
            "Main.ps1",
            "--output",
            first.to_str().unwrap(),
            "--name",
            "app",
        ])
        .unwrap()
        .assert_success();

    let config = first.join("package-config.json");
    project
        .run_pspack(&["package", "--config", config.to_str().unwrap(), "--output", second.to_str().unwrap()])
        .unwrap()
        .assert_success();

    FileAssert::equals(second.join("lib/util/Log.ps1"), "function Write-Log {}\n");
}

#[test]
fn test_dry_run_prints_configuration() {
    let project = app_project();
    let output = project.output_path("dist");

    let result = project
        .run_pspack(&[
            "auto-package",
            "--starting-files",
            "Main.ps1",
            "--output",
            output.to_str().unwrap(),
            "--name",
            "preview",
            "--dry-run",
        ])
        .unwrap();
    result
        .assert_success()
        .assert_stdout_contains("Would package 3 file(s)")
        .assert_stdout_contains("Synthesized configuration:")
        .assert_stdout_contains("\"name\": \"preview\"");

    DirAssert::not_exists(&output);
}

#[test]
fn test_missing_starting_files_is_input_error() {
    let project = app_project();
    let output = project.output_path("dist");

    project
        .run_pspack(&["auto-package", "--output", output.to_str().unwrap()])
        .unwrap()
        .assert_code(2);
    DirAssert::not_exists(&output);
}
