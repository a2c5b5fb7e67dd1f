//! skillsnap test kit.
//!
//! Helpers for driving the snapshot engines end to end against real
//! directories.
//!
//! # Key Types
//!
//! - [`TestWorkspace`]: temp skills and repository directories wired to a
//!   [`MemoryBackend`](skillsnap_core::MemoryBackend) or a real git repository
//! - [`TreeCapture`]: relative path to hash and size for every file of a tree
//! - [`CaptureDiff`]: mismatches between two captures
//!
//! # Example
//!
//! ```no_run
//! use skillsnap_testkit::{TestWorkspace, TreeCapture};
//!
//! let tw = TestWorkspace::memory().unwrap();
//! tw.add_skill("alpha", "v1").unwrap();
//!
//! skillsnap_core::save(tw.workspace(), "alpha", &Default::default()).unwrap();
//! let capture = TreeCapture::capture(&tw.tree_dir("alpha")).unwrap();
//! ```

mod workspace;
mod capture;
mod diff;

pub use workspace::{git_available, TestWorkspace, TestWorkspaceError};
pub use capture::{FileCapture, TreeCapture};
pub use diff::{CaptureDiff, Mismatch};

/// Re-export skillsnap_core for convenience in tests.
pub use skillsnap_core;
