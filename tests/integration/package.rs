//! Integration tests for `pspack package`.

use crate::common::{DirAssert, FileAssert, TestProject};

const PRESERVE_CONFIG: &str = r#"
{
  "package": { "name": "tools", "version": "2.1.0" },
  "directories": ["logs"],
  "files": [
    { "name": "root-scripts", "source": "*.ps1", "destination": "", "exclude": ["*.Tests.ps1"] },
    { "name": "library", "source": "lib/**/*.ps1", "destination": "modules", "preserve_structure": true }
  ],
  "post_package": [
    { "type": "create_file", "path": "VERSION.txt", "content": "2.1.0" }
  ]
}
"#;

fn tools_project() -> TestProject {
    let project = TestProject::new().unwrap();
    project.write("Main.ps1", ". $PSScriptRoot\\lib\\Config.ps1\n").unwrap();
    project.write("Main.Tests.ps1", "Describe 'Main' {}\n").unwrap();
    project.write("lib/Config.ps1", "$Config = @{}\n").unwrap();
    project.write("lib/net/Http.ps1", "function Invoke-Thing {}\n").unwrap();
    project
}

#[test]
fn test_package_preserves_structure() {
    let project = tools_project();
    let config = project.write_config(PRESERVE_CONFIG).unwrap();
    let output = project.output_path("pkg");

    let result = project
        .run_pspack(&["package", "--config", config.to_str().unwrap(), "--output", output.to_str().unwrap()])
        .unwrap();
    result.assert_success().assert_stdout_contains("Packaged 3 file(s)");

    FileAssert::equals(output.join("Main.ps1"), ". $PSScriptRoot\\lib\\Config.ps1\n");
    FileAssert::exists(output.join("modules/Config.ps1"));
    FileAssert::exists(output.join("modules/net/Http.ps1"));
    FileAssert::not_exists(output.join("Main.Tests.ps1"));
    FileAssert::equals(output.join("VERSION.txt"), "2.1.0");
    FileAssert::exists(output.join("package-manifest.json"));
    DirAssert::exists(output.join("logs"));

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output.join("package-manifest.json")).unwrap())
            .unwrap();
    let files = manifest["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|file| file["outcome"] == "success"));
    assert!(files[0]["checksum"].as_str().unwrap().starts_with("sha256:"));
    assert_eq!(manifest["post_package"][0]["outcome"], "success");
}

#[test]
fn test_dry_run_writes_nothing() {
    let project = tools_project();
    let config = project.write_config(PRESERVE_CONFIG).unwrap();
    let output = project.output_path("pkg");

    let result = project
        .run_pspack(&[
            "package",
            "--config",
            config.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--dry-run",
        ])
        .unwrap();
    result.assert_success().assert_stdout_contains("Would package 3 file(s)");

    DirAssert::not_exists(&output);
}

#[test]
fn test_flatten_collision_is_partial_failure() {
    let project = TestProject::new().unwrap();
    project.write("a/Common.ps1", "'a'\n").unwrap();
    project.write("b/Common.ps1", "'b'\n").unwrap();
    let config = project
        .write_config(
            r#"{
  "package": { "name": "flat", "version": "1.0.0" },
  "files": [ { "name": "all", "source": "**/*.ps1", "destination": "scripts", "flatten": true } ]
}"#,
        )
        .unwrap();
    let output = project.output_path("pkg");

    let result = project
        .run_pspack(&["package", "--config", config.to_str().unwrap(), "--output", output.to_str().unwrap()])
        .unwrap();
    result.assert_code(1).assert_stdout_contains("1 failed");

    FileAssert::equals(output.join("scripts/Common.ps1"), "'a'\n");
}

#[test]
fn test_non_empty_output_is_conflict() {
    let project = tools_project();
    let config = project.write_config(PRESERVE_CONFIG).unwrap();
    let output = project.output_path("pkg");
    std::fs::create_dir_all(&output).unwrap();
    std::fs::write(output.join("keep.txt"), "keep").unwrap();

    let args = ["package", "--config", config.to_str().unwrap(), "--output", output.to_str().unwrap()];
    let result = project.run_pspack(&args).unwrap();
    result.assert_code(2).assert_stderr_contains("Output directory is not empty");
    FileAssert::not_exists(output.join("Main.ps1"));

    let mut forced = args.to_vec();
    forced.push("--force");
    project.run_pspack(&forced).unwrap().assert_success();
    FileAssert::exists(output.join("Main.ps1"));
    FileAssert::equals(output.join("keep.txt"), "keep");
}

#[test]
fn test_invalid_configurations_exit_two() {
    let project = tools_project();
    let output = project.output_path("pkg");

    let cases = [
        r#"{ "package": { "name": "broken", "version": "1.0.0" }, "files": [ "#,
        r#"{ "package": { "name": "empty", "version": "1.0.0" }, "files": [] }"#,
        r#"{ "package": { "name": "escape", "version": "1.0.0" },
             "files": [ { "name": "x", "source": "*.ps1", "destination": "../outside" } ] }"#,
        r#"{ "package": { "name": "dup", "version": "1.0.0" },
             "files": [ { "name": "x", "source": "*.ps1", "destination": "a" },
                        { "name": "x", "source": "lib/*.ps1", "destination": "b" } ] }"#,
    ];

    for content in cases {
        let config = project.write_config(content).unwrap();
        let result = project
            .run_pspack(&["package", "--config", config.to_str().unwrap(), "--output", output.to_str().unwrap()])
            .unwrap();
        result.assert_code(2);
        DirAssert::not_exists(&output);
    }

    let missing = project.project_path().join("nope.json");
    project
        .run_pspack(&["package", "--config", missing.to_str().unwrap(), "--output", output.to_str().unwrap()])
        .unwrap()
        .assert_code(2)
        .assert_stderr_contains("Configuration file not found");
}
