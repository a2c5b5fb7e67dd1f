//! End-to-end tests for the skillsnap binary.

use assert_cmd::Command;
use fs_err as fs;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

struct Env {
    temp: TempDir,
}

impl Env {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("skills")).unwrap();
        Self { temp }
    }

    fn skills(&self) -> PathBuf {
        self.temp.path().join("skills")
    }

    fn repo(&self) -> PathBuf {
        self.temp.path().join("repo")
    }

    fn add_skill(&self, name: &str, contents: &str) {
        let dir = self.skills().join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("SKILL.md"), contents).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("skillsnap").unwrap();
        cmd.env("SKILLSNAP_SKILLS_DIR", self.skills())
            .env("SKILLSNAP_REPO", self.repo())
            .env_remove("SKILLSNAP_REMOTE")
            .arg("--config")
            .arg(self.temp.path().join("missing.toml"));
        cmd
    }
}

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("skillsnap")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("backup-all"))
        .stdout(predicate::str::contains("rebuild-cache"));
}

#[test]
fn test_scan_json() {
    let env = Env::new();
    env.add_skill("alpha", "v1");
    env.add_skill("skill-snapshot", "self");
    fs::create_dir_all(env.skills().join("notes")).unwrap();

    let out = env.cmd().args(["--json", "scan"]).assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    let entries: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let entries = entries.as_array().unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["name"], "alpha");
    assert!(entries[0]["skipped"].is_null());
    assert_eq!(entries[1]["name"], "skill-snapshot");
    assert_eq!(entries[1]["skipped"], "self_tree");
}

#[test]
fn test_scan_human_table() {
    let env = Env::new();
    env.add_skill("alpha", "v1");

    env.cmd()
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha"))
        .stdout(predicate::str::contains("ready"));
}

#[test]
fn test_save_without_repository_fails() {
    let env = Env::new();
    env.add_skill("alpha", "v1");

    env.cmd()
        .args(["--json", "save", "alpha", "--no-sync"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("\"error_type\":\"not_initialized\""));
}

#[test]
fn test_save_self_is_forbidden() {
    let env = Env::new();
    env.add_skill("skill-snapshot", "self");

    env.cmd()
        .args(["--json", "save", "skill-snapshot"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("\"error_type\":\"forbidden\""));
}

#[test]
fn test_status_uninitialized() {
    let env = Env::new();
    env.add_skill("alpha", "v1");

    let out = env.cmd().args(["--json", "status"]).assert().success();
    let report: serde_json::Value = serde_json::from_slice(&out.get_output().stdout).unwrap();
    assert_eq!(report["repo"]["initialized"], false);
    assert_eq!(report["trees"]["total"], 1);
    assert_eq!(report["trees"]["changed"][0], "alpha");
}

#[test]
fn test_delete_rejects_bad_version() {
    let env = Env::new();
    env.add_skill("alpha", "v1");

    env.cmd()
        .args(["--json", "delete", "alpha", "vx"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid_input"));
}

#[test]
fn test_completions() {
    Command::cargo_bin("skillsnap")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skillsnap"));
}

#[test]
fn test_git_save_list_restore() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let env = Env::new();
    env.add_skill("alpha", "v1\n");

    env.cmd().arg("init").assert().success();
    assert!(env.repo().join(".gitignore").exists());

    env.cmd()
        .args(["save", "alpha", "-m", "first"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha/v1"));

    env.cmd()
        .args(["save", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes"));

    fs::write(env.skills().join("alpha/SKILL.md"), "v2\n").unwrap();
    env.cmd()
        .args(["diff", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[~] Modified: SKILL.md"));

    env.cmd()
        .args(["list", "alpha"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha/v1"))
        .stdout(predicate::str::contains("first"));

    env.cmd().args(["restore", "alpha", "1"]).assert().success();
    assert_eq!(
        fs::read_to_string(env.skills().join("alpha/SKILL.md")).unwrap(),
        "v1\n"
    );

    env.cmd()
        .args(["delete", "alpha", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted snapshot alpha/v1"));
}
