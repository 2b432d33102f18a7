//! CLI integration tests.
//!
//! Every test points the binary at a private config file and clears the
//! environment overrides so the developer's own setup never leaks in. None
//! of these commands reach the network.
//!
//! ## Exit Codes
//! - 0: Success
//! - 3: Not found (project, library entry, path)
//! - 4: Invalid argument / unsupported format
//! - 7: Configuration (token, URL, reachability)

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A dradismd command with an isolated home and config file.
fn dradismd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dradismd").unwrap();
    cmd.env("HOME", home)
        .env("DRADISMD_CONFIG", home.join("config.json"))
        .env_remove("DRADIS_API_TOKEN")
        .env_remove("DRADIS_URL")
        .env_remove("RUST_LOG")
        .arg("--no-color");
    cmd
}

fn write_config(home: &Path, config: &Value) {
    fs::write(home.join("config.json"), config.to_string()).unwrap();
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn version_prints_crate_version() {
    let home = TempDir::new().unwrap();
    let output = dradismd(home.path()).arg("version").output().unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).contains(&format!("dradismd version {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn version_ignores_broken_config() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join("config.json"), "{broken").unwrap();

    dradismd(home.path()).arg("version").assert().success();
}

#[test]
fn remote_command_without_token_exits_with_config_code() {
    let home = TempDir::new().unwrap();
    let output = dradismd(home.path()).arg("list-projects").output().unwrap();

    assert_eq!(output.status.code(), Some(7));
    assert!(stderr(&output).contains("Invalid or missing Dradis API token"));
}

#[test]
fn short_token_is_rejected_before_any_request() {
    let home = TempDir::new().unwrap();
    write_config(
        home.path(),
        &serde_json::json!({"api_token": "tooshort", "instance_url": "https://dradis.invalid"}),
    );

    let output = dradismd(home.path())
        .args(["--json", "get", "47"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(7));
    let last = stderr(&output).lines().last().unwrap_or_default().to_string();
    let error: Value = serde_json::from_str(&last).unwrap();
    assert_eq!(error["error"]["code"], "INVALID_TOKEN");
    assert_eq!(error["error"]["exit_code"], 7);
}

#[test]
fn convert_missing_path_is_not_found() {
    let home = TempDir::new().unwrap();
    let output = dradismd(home.path())
        .args(["convert"])
        .arg(home.path().join("nowhere"))
        .arg("markdown")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn convert_unknown_format_is_invalid() {
    let home = TempDir::new().unwrap();
    let output = dradismd(home.path())
        .args(["convert", ".", "rtf"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("textile, markdown, pdf, word"));
}

#[test]
fn add_issue_from_template_works_offline() {
    let home = TempDir::new().unwrap();
    let project = home.path().join("ACME");
    fs::create_dir(&project).unwrap();

    let output = dradismd(home.path())
        .args(["--json", "add-issue"])
        .arg(&project)
        .args(["--title", "Weak TLS", "--node", "web01"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    let issue = fs::read_to_string(project.join("Issues/Weak TLS.textile")).unwrap();
    assert!(issue.starts_with("#[Title]#\nWeak TLS\n"));
    assert!(project
        .join("Nodes/web01/Evidences/Weak TLS/Evidence.textile")
        .is_file());

    let done: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(done["issue_created"], true);
}

#[test]
fn rename_needs_a_renaming_format() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("notes.md");
    fs::write(&file, "![a](a.png)").unwrap();

    let output = dradismd(home.path()).arg("rename").arg(&file).output().unwrap();

    assert_eq!(output.status.code(), Some(7));
    assert!(stderr(&output).contains("renaming_format"));
}

#[test]
fn rename_uses_configured_format() {
    let home = TempDir::new().unwrap();
    write_config(
        home.path(),
        &serde_json::json!({"renaming_format": "[section_initials]_[count]"}),
    );
    fs::write(home.path().join("shot.png"), "png").unwrap();
    let file = home.path().join("notes.md");
    fs::write(&file, "#[Title]#\nWeb App\n\n![a](shot.png)\n").unwrap();

    dradismd(home.path()).arg("rename").arg(&file).assert().success();

    assert!(home.path().join("WA_001.png").is_file());
    assert!(fs::read_to_string(&file).unwrap().contains("![a](WA_001.png)"));
}

#[test]
fn completions_mention_binary() {
    let home = TempDir::new().unwrap();
    let output = dradismd(home.path())
        .args(["completions", "bash"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).contains("dradismd"));
}
