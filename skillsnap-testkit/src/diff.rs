//! Capture diffing utilities.

use std::collections::BTreeSet;

use crate::capture::TreeCapture;

/// Difference between two tree captures.
#[derive(Debug, Clone, Default)]
pub struct CaptureDiff {
    /// List of mismatches found, sorted by path.
    pub mismatches: Vec<Mismatch>,
}

/// A mismatch between expected and actual trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// File in expected but not actual.
    MissingFile { path: String },

    /// File in actual but not expected.
    ExtraFile { path: String },

    /// Same path, different content.
    ContentMismatch {
        path: String,
        expected: String,
        actual: String,
    },
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mismatch::MissingFile { path } => write!(f, "Missing file: {}", path),
            Mismatch::ExtraFile { path } => write!(f, "Extra file: {}", path),
            Mismatch::ContentMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "Content mismatch for {}: expected {}, got {}",
                path, expected, actual
            ),
        }
    }
}

impl CaptureDiff {
    /// Compare two captures.
    pub fn compare(expected: &TreeCapture, actual: &TreeCapture) -> Self {
        let paths: BTreeSet<&String> = expected.files.keys().chain(actual.files.keys()).collect();

        let mismatches = paths
            .into_iter()
            .filter_map(|path| match (expected.files.get(path), actual.files.get(path)) {
                (Some(_), None) => Some(Mismatch::MissingFile { path: path.clone() }),
                (None, Some(_)) => Some(Mismatch::ExtraFile { path: path.clone() }),
                (Some(e), Some(a)) if e.hash != a.hash => Some(Mismatch::ContentMismatch {
                    path: path.clone(),
                    expected: e.hash.clone(),
                    actual: a.hash.clone(),
                }),
                _ => None,
            })
            .collect();

        Self { mismatches }
    }

    /// Check if the captures match.
    pub fn is_empty(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Panic with every mismatch listed unless the captures match.
    pub fn assert_empty(&self) {
        if !self.is_empty() {
            let lines: Vec<String> = self.mismatches.iter().map(|m| format!("  {}", m)).collect();
            panic!("trees differ:\n{}", lines.join("\n"));
        }
    }
}
