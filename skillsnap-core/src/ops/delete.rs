//! Delete one snapshot version.

use crate::ops::workspace::{ensure_mutable, Workspace};
use crate::types::VersionTag;
use crate::SnapError;

/// Result of [`delete`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DeleteResult {
    /// The deleted version.
    pub tag: VersionTag,
    /// Whether the remote tag was removed too.
    pub remote_deleted: bool,
}

/// Delete version `version` of `name` locally and on the remote.
///
/// The local tag must exist and be deleted. Failing to delete the remote
/// tag is logged and reported in the result.
pub fn delete(ws: &Workspace, name: &str, version: &str) -> Result<DeleteResult, SnapError> {
    ensure_mutable(ws.config(), name)?;
    let tag = VersionTag::resolve(name, version)?;

    let guard = ws.lock().acquire()?;
    let result = delete_locked(ws, tag);
    guard.release();
    result
}

fn delete_locked(ws: &Workspace, tag: VersionTag) -> Result<DeleteResult, SnapError> {
    ws.require_initialized()?;
    let backend = ws.backend();

    if !backend.tag_exists(&tag)? {
        return Err(SnapError::not_found(format!("Version {} not found", tag)));
    }

    backend.delete_tag(&tag)?;
    log::info!("deleted local tag {}", tag);

    let remote_deleted = match backend.delete_remote_tag(&tag) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("failed to delete remote tag {}: {}", tag, e);
            false
        }
    };

    Ok(DeleteResult {
        tag,
        remote_deleted,
    })
}
