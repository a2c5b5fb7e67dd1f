//! Core type definitions for skillsnap.

mod config;
mod error;
mod fingerprint;
mod outcome;
mod tag;

pub use config::{
    EngineConfig, SnapConfig, CACHE_VERSION, COMMAND_TIMEOUT, DEFAULT_BRANCH, ENV_REMOTE,
    ENV_REPO_DIR, ENV_SKILLS_DIR, LOCK_STALE_AFTER, MAX_TREE_BYTES, SELF_NAME,
};
pub use error::{ErrorKind, SnapError};
pub use fingerprint::{content_map, CacheRecord, FileFingerprint, FingerprintSet};
pub use outcome::{BatchFailure, BatchReport, NoSnapshotReason, SaveOutcome};
pub use tag::{TagEntry, VersionTag};
