//! High-level snapshot operations.

mod workspace;
mod change;
mod version;
mod save;
mod backup;
mod restore;
mod delete;
mod diff;
mod scan;
mod list;
mod status;
mod init;
mod cache_ops;

#[cfg(test)]
mod fixture;

pub use workspace::{ensure_mutable, validate_name, Workspace};
pub use change::{fingerprint_tree, has_changes, update_cache_after_save};
pub use version::{latest_version, next_version, versions};
pub use save::{save, SaveOptions};
pub use backup::{backup_all, BackupEvent};
pub use restore::{restore, restore_with, swap_tree, CopyFn, RestoreResult, SwapReport};
pub use delete::{delete, DeleteResult};
pub use diff::{compare_trees, diff, DiffEntry, DiffReport, CONTEXT_LINES};
pub use scan::{discover_trees, scan, ScanEntry, SkipReason};
pub use list::{list, SnapshotEntry};
pub use status::{status, CacheStatus, RepoStatus, StatusReport, TreeStatus};
pub use init::{ensure_gitignore, init, InitResult};
pub use cache_ops::{clear_cache, rebuild_cache, ClearResult};
