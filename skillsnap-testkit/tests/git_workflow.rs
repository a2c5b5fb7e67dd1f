//! Engine workflows against a real git repository and bare remote.

use skillsnap_core::{InitAction, SaveOptions, VersionTag};
use skillsnap_testkit::{git_available, CaptureDiff, TestWorkspace, TreeCapture};

#[test]
fn test_git_snapshot_lifecycle() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let tw = TestWorkspace::git_with_remote().unwrap();
    let ws = tw.workspace();
    tw.add_skill("alpha", "v1\n").unwrap();
    tw.write_file("alpha", "__pycache__/mod.pyc", b"bytecode").unwrap();

    let init = skillsnap_core::init(ws).unwrap();
    assert_eq!(init.action, InitAction::Cloned);
    assert!(init.gitignore_updated);
    let again = skillsnap_core::init(ws).unwrap();
    assert_eq!(again.action, InitAction::Existing);

    let first = skillsnap_core::save(ws, "alpha", &SaveOptions::with_message("first")).unwrap();
    assert_eq!(first.tag, Some(VersionTag::new("alpha", 1)));
    assert!(!tw.repo_dir().join("alpha/__pycache__").exists());
    assert_eq!(tw.remote_tag_names().unwrap(), vec!["alpha/v1"]);
    let saved = TreeCapture::capture(&tw.tree_dir("alpha")).unwrap();

    let unchanged = skillsnap_core::save(ws, "alpha", &SaveOptions::default()).unwrap();
    assert!(!unchanged.created);

    tw.add_skill("alpha", "v2\n").unwrap();
    let second = skillsnap_core::save(ws, "alpha", &SaveOptions::default()).unwrap();
    assert_eq!(second.tag, Some(VersionTag::new("alpha", 2)));

    let listed = skillsnap_core::list(ws, Some("alpha")).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[1].message, "first");

    let diff = skillsnap_core::diff(ws, "alpha", Some("1")).unwrap();
    assert_eq!(diff.entries.len(), 1);
    assert_eq!(diff.entries[0].path(), "SKILL.md");

    skillsnap_core::restore(ws, "alpha", "v1").unwrap();
    let restored = TreeCapture::capture(&tw.tree_dir("alpha")).unwrap();
    CaptureDiff::compare(&saved, &restored).assert_empty();

    let deleted = skillsnap_core::delete(ws, "alpha", "v1").unwrap();
    assert!(deleted.remote_deleted);
    assert_eq!(tw.remote_tag_names().unwrap(), vec!["alpha/v2"]);

    let status = skillsnap_core::status(ws).unwrap();
    assert!(status.repo.initialized);
    let state = status.repo.state.unwrap();
    assert_eq!(state.branch.as_deref(), Some("main"));
    assert!(!state.is_detached);
}

#[test]
fn test_git_fresh_repository_without_remote() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let tw = TestWorkspace::git().unwrap();
    tw.add_skill("alpha", "v1").unwrap();
    tw.add_skill("beta", "b1").unwrap();

    let init = skillsnap_core::init(tw.workspace()).unwrap();
    assert_eq!(init.action, InitAction::Created);
    assert!(tw.repo_dir().join(".gitignore").exists());

    let report = skillsnap_core::backup_all(tw.workspace(), Some("batch"), |_| {}).unwrap();
    assert!(report.is_success());
    assert_eq!(
        report.created,
        vec![VersionTag::new("alpha", 1), VersionTag::new("beta", 1)]
    );

    let report = skillsnap_core::backup_all(tw.workspace(), None, |_| {}).unwrap();
    assert!(report.created.is_empty());
    assert_eq!(report.unchanged, vec!["alpha", "beta"]);
}
