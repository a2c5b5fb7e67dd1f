//! List snapshot versions.

use serde::Serialize;

use crate::ops::workspace::{validate_name, Workspace};
use crate::types::VersionTag;
use crate::SnapError;

/// A listed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotEntry {
    /// The version tag.
    pub tag: VersionTag,
    /// First line of the snapshot message.
    pub message: String,
}

/// List the snapshots of `name`, or of every tree, newest first.
///
/// Tags are fetched from the remote first when possible. Tags that do not
/// follow the `<tree>/v<N>` scheme are left out.
pub fn list(ws: &Workspace, name: Option<&str>) -> Result<Vec<SnapshotEntry>, SnapError> {
    if let Some(name) = name {
        validate_name(name)?;
    }
    ws.require_initialized()?;

    let backend = ws.backend();
    if let Err(e) = backend.fetch_tags() {
        log::warn!("could not fetch tags, listing local tags: {}", e);
    }

    let pattern = match name {
        Some(name) => VersionTag::pattern_for(name),
        None => VersionTag::pattern_all().to_string(),
    };

    let mut entries: Vec<SnapshotEntry> = backend
        .list_tags(&pattern)?
        .into_iter()
        .filter_map(|entry| {
            let tag = match name {
                Some(name) => VersionTag::parse_for(name, &entry.name).map(|v| VersionTag::new(name, v)),
                None => VersionTag::parse(&entry.name),
            }?;
            Some(SnapshotEntry {
                tag,
                message: entry.message,
            })
        })
        .collect();

    if name.is_some() {
        entries.sort_by(|a, b| b.tag.version.cmp(&a.tag.version));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::fixture::Fixture;
    use crate::ops::save::{save, SaveOptions};

    #[test]
    fn test_list_one_tree_newest_first() {
        let fx = Fixture::new();
        fx.add_tree("beta", "b");
        save(&fx.ws, "alpha", &SaveOptions::with_message("first")).unwrap();
        fx.write("alpha", "SKILL.md", "second version");
        save(&fx.ws, "alpha", &SaveOptions::with_message("second")).unwrap();
        save(&fx.ws, "beta", &SaveOptions::default()).unwrap();

        let entries = list(&fx.ws, Some("alpha")).unwrap();
        let versions: Vec<_> = entries.iter().map(|e| e.tag.version).collect();
        assert_eq!(versions, vec![2, 1]);
        assert_eq!(entries[0].message, "second");

        let all = list(&fx.ws, None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].tag, VersionTag::new("beta", 1));
    }

    #[test]
    fn test_list_empty_and_uninitialized() {
        let fx = Fixture::new();
        assert!(list(&fx.ws, Some("alpha")).unwrap().is_empty());

        let fx = Fixture::with_backend(crate::helpers::memory::MemoryBackend::uninitialized());
        assert!(list(&fx.ws, None).unwrap_err().is_not_initialized());
    }

    #[test]
    fn test_fetch_failure_falls_back_to_local() {
        let fx = Fixture::new();
        save(&fx.ws, "alpha", &SaveOptions::default()).unwrap();
        fx.backend.fail_on("fetch_tags");
        assert_eq!(list(&fx.ws, Some("alpha")).unwrap().len(), 1);
    }
}
