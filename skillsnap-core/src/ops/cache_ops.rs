//! Hash cache maintenance.

use serde::Serialize;

use crate::ops::change::update_cache_after_save;
use crate::ops::scan::discover_trees;
use crate::ops::workspace::{validate_name, Workspace};
use crate::SnapError;

/// Result of [`clear_cache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClearResult {
    /// Cache files removed.
    pub removed: usize,
}

/// Recompute the cache of `name`, or of every discovered tree.
///
/// Returns the names whose cache was rebuilt.
pub fn rebuild_cache(ws: &Workspace, name: Option<&str>) -> Result<Vec<String>, SnapError> {
    let names = match name {
        Some(name) => {
            validate_name(name)?;
            ws.require_tree(name)?;
            vec![name.to_string()]
        }
        None => discover_trees(ws)?,
    };

    for name in &names {
        let record = update_cache_after_save(ws, name)?;
        log::info!("rebuilt cache for '{}' ({} files)", name, record.files.len());
    }
    Ok(names)
}

/// Delete the cache of `name`, or the whole cache directory.
pub fn clear_cache(ws: &Workspace, name: Option<&str>) -> Result<ClearResult, SnapError> {
    let removed = match name {
        Some(name) => {
            validate_name(name)?;
            usize::from(ws.cache().remove(name)?)
        }
        None => ws.cache().clear()?,
    };
    log::debug!("cleared {} cache files", removed);
    Ok(ClearResult { removed })
}
