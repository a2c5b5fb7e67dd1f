//! Outcome types for save and batch operations.

use serde::Serialize;

use super::tag::VersionTag;

/// Why a save produced no snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoSnapshotReason {
    /// The change detector found the tree identical to its cache.
    Unchanged,
    /// The staged copy matched the last commit byte for byte.
    IdenticalStaged,
}

/// Result of saving one tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    /// Tree name.
    pub tree: String,
    /// Whether a snapshot (commit and tag) was created.
    pub created: bool,
    /// The new tag, when created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<VersionTag>,
    /// Why nothing was created, when not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<NoSnapshotReason>,
}

impl SaveOutcome {
    /// A save that created `tag`.
    pub fn created(tag: VersionTag) -> Self {
        Self {
            tree: tag.tree.clone(),
            created: true,
            tag: Some(tag),
            reason: None,
        }
    }

    /// A save that created nothing.
    pub fn skipped(tree: impl Into<String>, reason: NoSnapshotReason) -> Self {
        Self {
            tree: tree.into(),
            created: false,
            tag: None,
            reason: Some(reason),
        }
    }
}

/// A tree that failed inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// Tree name.
    pub tree: String,
    /// Stable error type string.
    pub error_type: String,
    /// Human-readable message.
    pub message: String,
}

/// Result of `backup-all`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Trees discovered.
    pub scanned: usize,
    /// Trees the change detector flagged.
    pub changed: usize,
    /// Tags created.
    pub created: Vec<VersionTag>,
    /// Trees left untouched, including staged no-ops.
    pub unchanged: Vec<String>,
    /// Trees whose save failed.
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    /// Whether every attempted save succeeded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_constructors() {
        let created = SaveOutcome::created(VersionTag::new("alpha", 1));
        assert!(created.created);
        assert_eq!(created.tree, "alpha");

        let skipped = SaveOutcome::skipped("alpha", NoSnapshotReason::Unchanged);
        assert!(!skipped.created);
        assert!(skipped.tag.is_none());
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["reason"], "unchanged");
    }
}
