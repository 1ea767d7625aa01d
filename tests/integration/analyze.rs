//! Integration tests for `pspack analyze`.

use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::TestProject;

fn pspack(project: &TestProject) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pspack"));
    cmd.current_dir(project.project_path())
        .env("NO_COLOR", "1")
        .env("PSPACK_NO_PROGRESS", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn chain_project() -> TestProject {
    let project = TestProject::new().unwrap();
    project.write("Main.ps1", ". $PSScriptRoot\\lib\\Config.ps1\nImport-Module .\\lib\\Missing.psm1\n").unwrap();
    project.write("lib/Config.ps1", ". $PSScriptRoot\\Util.ps1\n").unwrap();
    project.write("lib/Util.ps1", "function Get-Thing { 42 }\n").unwrap();
    project
}

#[test]
fn test_tree_output() {
    let project = chain_project();

    pspack(&project)
        .args(["analyze", "--starting-files", "Main.ps1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Main.ps1"))
        .stdout(predicate::str::contains("Config.ps1"))
        .stdout(predicate::str::contains("Util.ps1"))
        .stdout(predicate::str::contains(".\\lib\\Missing.psm1 [not found]"))
        .stdout(predicate::str::contains("3 files analyzed, 1 unresolved reference, 0 cycles"));
}

#[test]
fn test_json_output() {
    let project = chain_project();

    let output = pspack(&project)
        .args(["analyze", "--starting-files", "Main.ps1", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["all_files"].as_array().unwrap().len(), 3);
    assert_eq!(json["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(json["max_depth"], 10);
    assert!(json["cycles"].as_array().unwrap().is_empty());

    let main_refs = json["nodes"][0]["references"].as_array().unwrap();
    assert_eq!(main_refs.len(), 2);
    assert_eq!(main_refs[0]["resolution_status"], "resolved");
    assert_eq!(main_refs[1]["resolution_status"], "not_found");
    assert_eq!(main_refs[1]["line_number"], 2);
}

#[test]
fn test_cycle_is_reported() {
    let project = TestProject::new().unwrap();
    project.write("A.ps1", ". $PSScriptRoot\\B.ps1\n").unwrap();
    project.write("B.ps1", ". $PSScriptRoot\\A.ps1\n").unwrap();

    pspack(&project)
        .args(["analyze", "--starting-files", "A.ps1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(circular reference)"))
        .stdout(predicate::str::contains("2 files analyzed, 0 unresolved references, 1 cycle"))
        .stdout(predicate::str::contains("cycle:"));
}

#[test]
fn test_variable_reference_is_not_resolved() {
    let project = TestProject::new().unwrap();
    project.write("Main.ps1", ". \"$Home\\Profile.ps1\"\n").unwrap();

    pspack(&project)
        .args(["analyze", "--starting-files", "Main.ps1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[variable]"))
        .stdout(predicate::str::contains("1 files analyzed, 1 unresolved reference"));
}

#[test]
fn test_max_depth_limits_analysis() {
    let project = chain_project();

    let output = project
        .run_pspack(&["analyze", "--starting-files", "Main.ps1", "--max-depth", "0", "--format", "json"])
        .unwrap();
    output.assert_success();

    let json: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(json["nodes"].as_array().unwrap().len(), 1);
    assert_eq!(json["all_files"].as_array().unwrap().len(), 2);
}

#[test]
fn test_missing_starting_files_is_input_error() {
    let project = TestProject::new().unwrap();

    pspack(&project)
        .arg("analyze")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No starting files were given"));
}

#[test]
fn test_unknown_format_is_rejected() {
    let project = chain_project();

    pspack(&project)
        .args(["analyze", "--starting-files", "Main.ps1", "--format", "xml"])
        .assert()
        .failure();
}
