//! Save a snapshot of one tree.

use crate::helpers::copy::dir_size;
use crate::ops::change::{has_changes, refresh_cache};
use crate::ops::version::next_version;
use crate::ops::workspace::{ensure_mutable, Workspace};
use crate::types::{NoSnapshotReason, SaveOutcome, VersionTag};
use crate::SnapError;

/// Options for [`save`].
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Snapshot message. Defaults to `Snapshot at <local time>`.
    pub message: Option<String>,
    /// Pull from the remote before saving.
    pub sync_remote: bool,
    /// Skip the cache-based change check and always stage.
    pub skip_fast_check: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            message: None,
            sync_remote: true,
            skip_fast_check: false,
        }
    }
}

impl SaveOptions {
    /// Options with a message.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Save a snapshot of `name`.
///
/// # Errors
///
/// * `Forbidden` - `name` is the reserved self-name
/// * `Conflict` - another operation holds the lock
/// * `NotFound` - the live tree does not exist
/// * `NotInitialized` - the snapshot repository does not exist
/// * `TooLarge` - the tree exceeds the size cap
/// * `Backend` / `Unavailable` - a backend command failed
pub fn save(ws: &Workspace, name: &str, options: &SaveOptions) -> Result<SaveOutcome, SnapError> {
    ensure_mutable(ws.config(), name)?;
    let guard = ws.lock().acquire()?;
    let outcome = save_locked(ws, name, options);
    guard.release();
    outcome
}

/// Body of [`save`]; the caller holds the lock.
pub(crate) fn save_locked(
    ws: &Workspace,
    name: &str,
    options: &SaveOptions,
) -> Result<SaveOutcome, SnapError> {
    ensure_mutable(ws.config(), name)?;
    ws.require_tree(name)?;
    ws.require_initialized()?;

    let tree_dir = ws.layout().tree_dir(name);
    let size = dir_size(&tree_dir);
    if size > ws.config().max_tree_bytes {
        return Err(SnapError::too_large(name, size, ws.config().max_tree_bytes));
    }

    let backend = ws.backend();
    if options.sync_remote {
        backend.sync()?;
    }

    if !options.skip_fast_check && !has_changes(ws, name)? {
        log::info!("{}: no changes since last snapshot", name);
        return Ok(SaveOutcome::skipped(name, NoSnapshotReason::Unchanged));
    }

    let tag = VersionTag::new(name, next_version(backend, name)?);
    backend.stage_tree(name, &tree_dir, &ws.config().ignore)?;

    if !backend.has_staged_changes()? {
        log::info!("{}: staged content identical to last snapshot", name);
        refresh_cache(ws, name);
        return Ok(SaveOutcome::skipped(name, NoSnapshotReason::IdenticalStaged));
    }

    let message = options.message.clone().unwrap_or_else(default_message);
    let subject = format!("[{}] {}: {}", name, tag.label(), message);
    backend.commit(&subject)?;
    if let Err(e) = backend.create_tag(&tag, &message) {
        log::warn!("commit '{}' is left untagged; tag it as {} by hand", subject, tag);
        return Err(e);
    }
    backend.push_branch()?;
    backend.push_tag(&tag)?;
    refresh_cache(ws, name);

    log::info!("created snapshot {}", tag);
    Ok(SaveOutcome::created(tag))
}

fn default_message() -> String {
    format!("Snapshot at {}", chrono::Local::now().format("%Y-%m-%d %H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::memory::MemoryBackend;
    use crate::ops::fixture::Fixture;

    fn write(fx: &Fixture, rel: &str, contents: &str) {
        fx.write("alpha", rel, contents);
    }

    #[test]
    fn test_first_save_creates_v1() {
        let fx = Fixture::new();
        let outcome = save(&fx.ws, "alpha", &SaveOptions::with_message("first")).unwrap();

        assert!(outcome.created);
        assert_eq!(outcome.tag, Some(VersionTag::new("alpha", 1)));
        assert_eq!(fx.backend.tag_names(), vec!["alpha/v1"]);
        assert_eq!(fx.backend.last_commit_message().unwrap(), "[alpha] v1: first");
        assert_eq!(fx.backend.remote_tags(), vec!["alpha/v1"]);

        let cache = fx.ws.cache().load("alpha").unwrap();
        assert_eq!(cache.record.files.len(), 1);
        assert!(cache.record.files.contains_key("SKILL.md"));
        assert!(!fx.ws.lock().is_held());
    }

    #[test]
    fn test_second_save_without_changes_is_skipped() {
        let fx = Fixture::new();
        save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();
        let outcome = save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();

        assert!(!outcome.created);
        assert_eq!(outcome.reason, Some(NoSnapshotReason::Unchanged));
        assert_eq!(fx.backend.commit_count(), 1);
        assert_eq!(fx.backend.call_count("stage_tree"), 1);
    }

    #[test]
    fn test_edit_creates_next_version() {
        let fx = Fixture::new();
        save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();
        write(&fx, "SKILL.md", "v2 longer");
        let outcome = save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();
        assert_eq!(outcome.tag, Some(VersionTag::new("alpha", 2)));
    }

    #[test]
    fn test_identical_staged_content_allocates_nothing() {
        let fx = Fixture::new();
        save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();

        // Only ignored content changes; forced past the fast check.
        write(&fx, "cache.pyc", "bytecode");
        let options = SaveOptions {
            skip_fast_check: true,
            ..SaveOptions::default()
        };
        let outcome = save(&fx.ws, "alpha", &options).unwrap();

        assert_eq!(outcome.reason, Some(NoSnapshotReason::IdenticalStaged));
        assert_eq!(fx.backend.tag_names(), vec!["alpha/v1"]);
        assert_eq!(fx.backend.commit_count(), 1);
    }

    #[test]
    fn test_self_name_is_forbidden_before_any_work() {
        let fx = Fixture::new();
        let err = save(&fx.ws, crate::SELF_NAME, &SaveOptions::default()).unwrap_err();
        assert!(err.is_forbidden());
        assert!(fx.backend.calls().is_empty());
        assert!(!fx.ws.lock().path().exists());
    }

    #[test]
    fn test_lock_held_is_conflict() {
        let fx = Fixture::new();
        let _guard = fx.ws.lock().acquire().unwrap();
        let err = save(&fx.ws, "alpha", &SaveOptions::default()).unwrap_err();
        assert!(err.is_conflict());
        assert!(fx.backend.calls().is_empty());
    }

    #[test]
    fn test_missing_tree_and_uninitialized_repo() {
        let fx = Fixture::new();
        assert!(save(&fx.ws, "ghost", &SaveOptions::default())
            .unwrap_err()
            .is_not_found());

        let fx = Fixture::with_backend(MemoryBackend::uninitialized());
        let err = save(&fx.ws, "alpha", &SaveOptions::default()).unwrap_err();
        assert!(err.is_not_initialized());
        assert!(!fx.ws.lock().is_held());
    }

    #[test]
    fn test_oversized_tree_rejected() {
        let fx = Fixture::new();
        let ws = fx.reconfigure(|c| c.with_max_tree_bytes(4));
        write(&fx, "big.txt", "0123456789");

        let err = save(&ws, "alpha", &SaveOptions::default()).unwrap_err();
        assert!(err.is_too_large());
        assert_eq!(fx.backend.call_count("stage_tree"), 0);
    }

    #[test]
    fn test_sync_skipped_on_request() {
        let fx = Fixture::new();
        let options = SaveOptions {
            sync_remote: false,
            ..SaveOptions::default()
        };
        save(&fx.ws, "alpha", &options).unwrap();
        assert_eq!(fx.backend.call_count("sync"), 0);

        write(&fx, "SKILL.md", "v2 longer");
        save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();
        assert_eq!(fx.backend.call_count("sync"), 1);
    }

    #[test]
    fn test_commit_failure_propagates_and_releases_lock() {
        let fx = Fixture::new();
        fx.backend.fail_on("commit");
        let err = save(&fx.ws, "alpha", &SaveOptions::default()).unwrap_err();
        assert!(err.is_backend());
        assert!(!fx.ws.lock().is_held());
        assert!(fx.backend.tag_names().is_empty());
    }

    #[test]
    fn test_tag_failure_after_commit_propagates() {
        let fx = Fixture::new();
        fx.backend.fail_on("create_tag");
        let err = save(&fx.ws, "alpha", &SaveOptions::default()).unwrap_err();
        assert!(err.is_backend());
        assert_eq!(fx.backend.commit_count(), 1);
        assert!(fx.backend.tag_names().is_empty());
        assert!(fx.backend.remote_tags().is_empty());
        assert!(!fx.ws.lock().is_held());
    }

    #[test]
    fn test_default_message_format() {
        let message = default_message();
        assert!(message.starts_with("Snapshot at "));
        assert_eq!(message.len(), "Snapshot at 2024-01-01 12:00".len());
    }
}
