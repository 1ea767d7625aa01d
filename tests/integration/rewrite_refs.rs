//! Integration tests for `pspack rewrite-refs`.

use crate::common::{CommandOutput, FileAssert, TestProject};
use std::path::{Path, PathBuf};

const MIXED_CONFIG: &str = r#"
{
  "package": { "name": "mixed", "version": "1.0.0" },
  "files": [
    { "name": "entry", "source": "Main.ps1", "destination": "" },
    { "name": "modules", "source": "lib/**/*.ps1", "destination": "modules", "flatten": true }
  ]
}
"#;

fn packaged_project() -> (TestProject, PathBuf, PathBuf) {
    let project = TestProject::new().unwrap();
    project.write("Main.ps1", ". $PSScriptRoot\\lib\\Config.ps1\nWrite-Host 'ready'\n").unwrap();
    project.write("lib/Config.ps1", "$Config = @{}\n").unwrap();
    project.write("lib/net/Http.ps1", ". $PSScriptRoot\\..\\Config.ps1\n").unwrap();
    let config = project.write_config(MIXED_CONFIG).unwrap();
    let output = project.output_path("pkg");

    project
        .run_pspack(&["package", "--config", config.to_str().unwrap(), "--output", output.to_str().unwrap()])
        .unwrap()
        .assert_success();

    (project, config, output)
}

fn rewrite(project: &TestProject, config: &Path, output: &Path, extra: &[&str]) -> CommandOutput {
    let mut args = vec![
        "rewrite-refs",
        "--config",
        config.to_str().unwrap(),
        "--package-path",
        output.to_str().unwrap(),
    ];
    args.extend_from_slice(extra);
    project.run_pspack(&args).unwrap()
}

#[test]
fn test_rewrite_after_flatten() {
    let (project, config, output) = packaged_project();

    rewrite(&project, &config, &output, &[])
        .assert_success()
        .assert_stdout_contains("Updated 2 reference(s) in 2 script(s)");

    FileAssert::equals(output.join("Main.ps1"), ". $PSScriptRoot\\modules\\Config.ps1\nWrite-Host 'ready'\n");
    FileAssert::equals(output.join("modules/Http.ps1"), ". $PSScriptRoot\\Config.ps1\n");

    // Sources keep their original references.
    FileAssert::contains(project.project_path().join("Main.ps1"), "lib\\Config.ps1");

    rewrite(&project, &config, &output, &[])
        .assert_success()
        .assert_stdout_contains("Updated 0 reference(s) in 0 script(s)");
}

#[test]
fn test_dry_run_leaves_package_untouched() {
    let (project, config, output) = packaged_project();

    rewrite(&project, &config, &output, &["--dry-run"])
        .assert_success()
        .assert_stdout_contains("Would update 2 reference(s)");

    FileAssert::equals(output.join("Main.ps1"), ". $PSScriptRoot\\lib\\Config.ps1\nWrite-Host 'ready'\n");
    FileAssert::not_exists(output.join("Main.ps1.bak"));
}

#[test]
fn test_backups_keep_original_text() {
    let (project, config, output) = packaged_project();

    rewrite(&project, &config, &output, &["--backup"]).assert_success();

    FileAssert::equals(output.join("Main.ps1.bak"), ". $PSScriptRoot\\lib\\Config.ps1\nWrite-Host 'ready'\n");
    FileAssert::equals(output.join("modules/Http.ps1.bak"), ". $PSScriptRoot\\..\\Config.ps1\n");
    FileAssert::contains(output.join("Main.ps1"), "modules\\Config.ps1");
}

#[test]
fn test_missing_packaged_script_exits_one() {
    let (project, config, output) = packaged_project();
    std::fs::remove_file(output.join("Main.ps1")).unwrap();

    rewrite(&project, &config, &output, &[])
        .assert_code(1)
        .assert_stdout_contains("failed");
    FileAssert::equals(output.join("modules/Http.ps1"), ". $PSScriptRoot\\Config.ps1\n");
}

#[test]
fn test_rewrite_uses_recorded_search_paths() {
    let project = TestProject::new().unwrap();
    project.write("app/Main.ps1", ". Common.ps1\n").unwrap();
    project.write("shared/Common.ps1", "function Get-Common {}\n").unwrap();
    let output = project.output_path("dist");

    project
        .run_pspack(&[
            "auto-package",
            "--starting-files",
            "app/Main.ps1",
            "--search-paths",
            "shared",
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap()
        .assert_success();
    FileAssert::exists(output.join("shared/Common.ps1"));

    let config = output.join("package-config.json");
    FileAssert::contains(&config, "\"search_paths\"");

    rewrite(&project, &config, &output, &[])
        .assert_success()
        .assert_stdout_contains("Updated 1 reference(s) in 1 script(s)");
    FileAssert::equals(output.join("app/Main.ps1"), ". ..\\shared\\Common.ps1\n");
}
