//! Namespaced version tags: `<tree>/v<N>`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SnapError;

/// A tree's version tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionTag {
    /// Tree name.
    pub tree: String,
    /// Version number, starting at 1.
    pub version: u64,
}

impl VersionTag {
    /// Create a tag for `tree` at `version`.
    pub fn new(tree: impl Into<String>, version: u64) -> Self {
        Self {
            tree: tree.into(),
            version,
        }
    }

    /// Parse `<tree>/v<digits>` exactly, for the given tree.
    ///
    /// Tags for other trees, trailing characters, signs and empty digit runs
    /// all yield `None`.
    pub fn parse_for(tree: &str, tag: &str) -> Option<u64> {
        let rest = tag.strip_prefix(tree)?.strip_prefix("/v")?;
        parse_digits(rest)
    }

    /// Parse any `<tree>/v<digits>` tag.
    pub fn parse(tag: &str) -> Option<Self> {
        let (tree, rest) = tag.split_once('/')?;
        if tree.is_empty() {
            return None;
        }
        let version = parse_digits(rest.strip_prefix('v')?)?;
        Some(Self::new(tree, version))
    }

    /// Resolve user input for `tree`: `N`, `vN` or `<tree>/vN`.
    ///
    /// A fully qualified tag naming another tree is rejected.
    pub fn resolve(tree: &str, input: &str) -> Result<Self, SnapError> {
        let input = input.trim();
        if let Some((owner, _)) = input.split_once('/') {
            if owner != tree {
                return Err(SnapError::invalid_input(format!(
                    "version '{}' belongs to '{}', not '{}'",
                    input, owner, tree
                )));
            }
            return Self::parse_for(tree, input)
                .map(|v| Self::new(tree, v))
                .ok_or_else(|| bad_version(input));
        }

        let digits = input.strip_prefix('v').unwrap_or(input);
        parse_digits(digits)
            .map(|v| Self::new(tree, v))
            .ok_or_else(|| bad_version(input))
    }

    /// Short label, e.g. `v3`.
    pub fn label(&self) -> String {
        format!("v{}", self.version)
    }

    /// Glob pattern selecting every tag of `tree`.
    pub fn pattern_for(tree: &str) -> String {
        format!("{}/v*", tree)
    }

    /// Glob pattern selecting tags of every tree.
    pub fn pattern_all() -> &'static str {
        "*/v*"
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/v{}", self.tree, self.version)
    }
}

/// A tag as listed by the backend, with the first line of its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    /// Full tag name.
    pub name: String,
    /// First line of the annotation.
    pub message: String,
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn bad_version(input: &str) -> SnapError {
    SnapError::invalid_input(format!("'{}' is not a version (expected N, vN or <name>/vN)", input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(VersionTag::new("alpha", 3).to_string(), "alpha/v3");
        assert_eq!(VersionTag::new("alpha", 3).label(), "v3");
    }

    #[test]
    fn test_parse_for_is_anchored() {
        assert_eq!(VersionTag::parse_for("alpha", "alpha/v12"), Some(12));
        assert_eq!(VersionTag::parse_for("alpha", "alpha/v"), None);
        assert_eq!(VersionTag::parse_for("alpha", "alpha/v1-rc"), None);
        assert_eq!(VersionTag::parse_for("alpha", "alpha/v+1"), None);
        assert_eq!(VersionTag::parse_for("alpha", "alphabet/v1"), None);
        assert_eq!(VersionTag::parse_for("alpha", "beta/v1"), None);
        assert_eq!(VersionTag::parse_for("alpha", "xalpha/v1"), None);
    }

    #[test]
    fn test_parse_any() {
        assert_eq!(VersionTag::parse("beta/v2"), Some(VersionTag::new("beta", 2)));
        assert_eq!(VersionTag::parse("/v2"), None);
        assert_eq!(VersionTag::parse("beta/2"), None);
    }

    #[test]
    fn test_resolve_forms() {
        let expected = VersionTag::new("alpha", 4);
        assert_eq!(VersionTag::resolve("alpha", "4").unwrap(), expected);
        assert_eq!(VersionTag::resolve("alpha", "v4").unwrap(), expected);
        assert_eq!(VersionTag::resolve("alpha", "alpha/v4").unwrap(), expected);
    }

    #[test]
    fn test_resolve_rejects_other_tree() {
        let err = VersionTag::resolve("alpha", "beta/v1").unwrap_err();
        assert!(err.is_invalid_input());
        assert!(VersionTag::resolve("alpha", "latest").is_err());
    }
}
