//! Snapshot every changed tree under one lock.

use crate::ops::change::has_changes;
use crate::ops::save::{save_locked, SaveOptions};
use crate::ops::scan::discover_trees;
use crate::ops::workspace::Workspace;
use crate::types::{BatchFailure, BatchReport, SaveOutcome};
use crate::SnapError;

/// Progress of a [`backup_all`] run.
#[derive(Debug, Clone)]
pub enum BackupEvent<'a> {
    /// Change detection finished; `changed` trees will be saved.
    Planned { scanned: usize, changed: usize },
    /// About to save the `index`-th changed tree (1-based).
    Saving { index: usize, name: &'a str },
    /// A tree was saved or skipped.
    Saved { name: &'a str, outcome: &'a SaveOutcome },
    /// Saving a tree failed; the batch continues.
    Failed { name: &'a str, error: &'a SnapError },
}

/// Save every discovered tree that changed since its last snapshot.
///
/// The lock is held and the remote synced once for the whole batch. A
/// failure on one tree is recorded in the report and the next tree
/// proceeds; only lock, initialization, sync and discovery failures abort.
pub fn backup_all(
    ws: &Workspace,
    message: Option<&str>,
    mut progress: impl FnMut(BackupEvent<'_>),
) -> Result<BatchReport, SnapError> {
    let guard = ws.lock().acquire()?;
    let report = backup_locked(ws, message, &mut progress);
    guard.release();
    report
}

fn backup_locked(
    ws: &Workspace,
    message: Option<&str>,
    progress: &mut impl FnMut(BackupEvent<'_>),
) -> Result<BatchReport, SnapError> {
    ws.require_initialized()?;
    ws.backend().sync()?;

    let trees = discover_trees(ws)?;
    let mut report = BatchReport {
        scanned: trees.len(),
        ..BatchReport::default()
    };

    let mut changed = Vec::new();
    for name in &trees {
        match has_changes(ws, name) {
            Ok(true) => changed.push(name.as_str()),
            Ok(false) => report.unchanged.push(name.clone()),
            Err(e) => {
                progress(BackupEvent::Failed { name, error: &e });
                report.failed.push(failure(name, &e));
            }
        }
    }
    report.changed = changed.len();
    progress(BackupEvent::Planned {
        scanned: report.scanned,
        changed: report.changed,
    });

    let options = SaveOptions {
        message: message.map(str::to_string),
        sync_remote: false,
        skip_fast_check: true,
    };

    for (i, name) in changed.into_iter().enumerate() {
        progress(BackupEvent::Saving { index: i + 1, name });
        match save_locked(ws, name, &options) {
            Ok(outcome) => {
                progress(BackupEvent::Saved {
                    name,
                    outcome: &outcome,
                });
                match outcome.tag {
                    Some(tag) => report.created.push(tag),
                    None => report.unchanged.push(name.to_string()),
                }
            }
            Err(e) => {
                log::warn!("failed to back up '{}': {}", name, e);
                progress(BackupEvent::Failed { name, error: &e });
                report.failed.push(failure(name, &e));
            }
        }
    }

    report.unchanged.sort();
    log::info!(
        "backup complete: {} scanned, {} changed, {} created, {} failed",
        report.scanned,
        report.changed,
        report.created.len(),
        report.failed.len()
    );
    Ok(report)
}

fn failure(name: &str, error: &SnapError) -> BatchFailure {
    BatchFailure {
        tree: name.to_string(),
        error_type: error.error_type().to_string(),
        message: error.to_string(),
    }
}
