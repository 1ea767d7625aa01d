//! File actions and post-package actions.
//!
//! Both kinds of action report failures as data: a failed copy or a script that
//! exits non-zero becomes a record with [`Outcome::Failed`] and a reason, and the
//! run carries on.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

use super::manifest::{ActionRecord, Outcome};
use crate::config::{FileAction, PostPackageAction};
use crate::script::is_script_file;
use crate::utils::fs::{atomic_write, ensure_parent_dir, safe_write};

/// PowerShell hosts tried, in order, for `.ps1` post-package scripts.
const POWERSHELL_HOSTS: &[&str] = &["pwsh", "powershell"];

/// Places `source` at `destination` using `action`.
///
/// Parent directories of `destination` are created as needed.
pub fn perform_file_action(action: FileAction, source: &Path, destination: &Path) -> Result<()> {
    ensure_parent_dir(destination)?;

    match action {
        FileAction::Copy => {
            fs::copy(source, destination).with_context(|| {
                format!("Failed to copy {} to {}", source.display(), destination.display())
            })?;
        }
        FileAction::Move => {
            if let Err(e) = fs::rename(source, destination) {
                // Cross-device moves cannot be renamed.
                debug!("Rename failed ({e}), falling back to copy and delete");
                fs::copy(source, destination).with_context(|| {
                    format!("Failed to move {} to {}", source.display(), destination.display())
                })?;
                fs::remove_file(source)
                    .with_context(|| format!("Failed to remove moved source {}", source.display()))?;
            }
        }
        FileAction::Write => {
            let content = fs::read(source)
                .with_context(|| format!("Failed to read {}", source.display()))?;
            atomic_write(destination, &content)?;
        }
    }

    Ok(())
}

/// Runs one post-package action against the package root.
///
/// In a dry run `create_file` is projected as successful and `run_script` is
/// skipped; nothing is written or executed.
#[must_use]
pub fn run_post_action(action: &PostPackageAction, output_root: &Path, dry_run: bool) -> ActionRecord {
    let mut record = ActionRecord {
        kind: action.kind().to_string(),
        path: action.path().to_string(),
        outcome: Outcome::Success,
        reason: None,
        exit_code: None,
    };

    match action {
        PostPackageAction::CreateFile { path, content } => {
            if dry_run {
                return record;
            }
            let target = output_root.join(path);
            let text = match content {
                serde_json::Value::String(text) => Ok(text.clone()),
                other => serde_json::to_string_pretty(other).map(|mut json| {
                    json.push('\n');
                    json
                }),
            };
            let written = text
                .map_err(anyhow::Error::from)
                .and_then(|text| safe_write(&target, &text));
            if let Err(e) = written {
                warn!("create_file {path} failed: {e:#}");
                record.outcome = Outcome::Failed;
                record.reason = Some(format!("{e:#}"));
            }
        }
        PostPackageAction::RunScript { path, args } => {
            if dry_run {
                record.outcome = Outcome::Skipped;
                record.reason = Some("dry run".to_string());
                return record;
            }
            match run_script(&output_root.join(path), args, output_root) {
                Ok(0) => record.exit_code = Some(0),
                Ok(code) => {
                    record.outcome = Outcome::Failed;
                    record.exit_code = Some(code);
                    record.reason = Some(format!("script exited with status {code}"));
                }
                Err(e) => {
                    warn!("run_script {path} failed: {e:#}");
                    record.outcome = Outcome::Failed;
                    record.reason = Some(format!("{e:#}"));
                }
            }
        }
    }

    record
}

/// Runs a script and returns its exit code (`-1` when killed by a signal).
fn run_script(script: &Path, args: &[String], working_dir: &Path) -> Result<i32> {
    if !script.is_file() {
        anyhow::bail!("script not found: {}", script.display());
    }

    let mut command = if is_script_file(script) {
        let host = find_powershell()
            .context("No PowerShell host (pwsh or powershell) found on PATH")?;
        let mut command = Command::new(host);
        command.args(["-NoProfile", "-NonInteractive"]);
        if cfg!(windows) {
            command.args(["-ExecutionPolicy", "Bypass"]);
        }
        command.arg("-File").arg(script);
        command
    } else {
        Command::new(script)
    };

    debug!("Running {:?} in {}", command, working_dir.display());
    let output = command
        .args(args)
        .current_dir(working_dir)
        .output()
        .with_context(|| format!("Failed to start {}", script.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if let Some(last) = stderr.lines().rev().find(|line| !line.trim().is_empty()) {
            warn!("{}: {}", script.display(), last.trim());
        }
    }

    Ok(output.status.code().unwrap_or(-1))
}

fn find_powershell() -> Option<PathBuf> {
    POWERSHELL_HOSTS.iter().find_map(|host| which::which(host).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_file_actions() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.ps1");
        fs::write(&src, "content").unwrap();

        let copied = temp.path().join("out/copy/a.ps1");
        perform_file_action(FileAction::Copy, &src, &copied).unwrap();
        assert_eq!(fs::read_to_string(&copied).unwrap(), "content");
        assert!(src.exists());

        let written = temp.path().join("out/write/a.ps1");
        perform_file_action(FileAction::Write, &src, &written).unwrap();
        assert_eq!(fs::read_to_string(&written).unwrap(), "content");

        let moved = temp.path().join("out/move/a.ps1");
        perform_file_action(FileAction::Move, &src, &moved).unwrap();
        assert_eq!(fs::read_to_string(&moved).unwrap(), "content");
        assert!(!src.exists());

        assert!(perform_file_action(FileAction::Copy, &src, &copied).is_err());
    }

    #[test]
    fn test_create_file_string_and_json() {
        let temp = TempDir::new().unwrap();
        let text = PostPackageAction::CreateFile {
            path: "VERSION.txt".to_string(),
            content: json!("1.2.3"),
        };
        let structured = PostPackageAction::CreateFile {
            path: "conf/settings.json".to_string(),
            content: json!({ "level": "info" }),
        };

        assert_eq!(run_post_action(&text, temp.path(), false).outcome, Outcome::Success);
        assert_eq!(run_post_action(&structured, temp.path(), false).outcome, Outcome::Success);

        assert_eq!(fs::read_to_string(temp.path().join("VERSION.txt")).unwrap(), "1.2.3");
        let settings: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(temp.path().join("conf/settings.json")).unwrap())
                .unwrap();
        assert_eq!(settings["level"], "info");
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let create = PostPackageAction::CreateFile {
            path: "x.txt".to_string(),
            content: json!("x"),
        };
        let run = PostPackageAction::RunScript {
            path: "Setup.ps1".to_string(),
            args: vec![],
        };

        assert_eq!(run_post_action(&create, temp.path(), true).outcome, Outcome::Success);
        assert_eq!(run_post_action(&run, temp.path(), true).outcome, Outcome::Skipped);
        assert!(!temp.path().join("x.txt").exists());
    }

    #[test]
    fn test_missing_script_is_recorded_not_fatal() {
        let temp = TempDir::new().unwrap();
        let run = PostPackageAction::RunScript {
            path: "missing.ps1".to_string(),
            args: vec![],
        };
        let record = run_post_action(&run, temp.path(), false);
        assert_eq!(record.outcome, Outcome::Failed);
        assert!(record.reason.unwrap().contains("script not found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_executable_script() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let script = temp.path().join("setup.sh");
        fs::write(&script, "#!/bin/sh\ntouch ran.txt\nexit 3\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let run = PostPackageAction::RunScript {
            path: "setup.sh".to_string(),
            args: vec![],
        };
        let record = run_post_action(&run, temp.path(), false);
        assert_eq!(record.outcome, Outcome::Failed);
        assert_eq!(record.exit_code, Some(3));
        assert!(temp.path().join("ran.txt").exists());
    }
}
