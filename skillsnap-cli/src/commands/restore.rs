//! skillsnap restore command.

use serde::Serialize;

use super::Result;
use crate::output::Output;
use skillsnap_core::{SnapshotEntry, Workspace};

/// JSON output when no version is given.
#[derive(Serialize)]
struct AvailableOutput<'a> {
    name: &'a str,
    versions: &'a [SnapshotEntry],
}

/// Run the restore command.
///
/// Without a version, lists the available versions instead.
pub fn run(output: &Output, ws: &Workspace, name: &str, version: Option<&str>) -> Result<()> {
    let Some(version) = version else {
        return show_available(output, ws, name);
    };

    let result = skillsnap_core::restore(ws, name, version)?;

    if output.is_json() {
        output.json(&result);
        return Ok(());
    }

    output.success(&format!(
        "Restored {} ({} files) to {}",
        result.tag,
        result.files,
        result.path.display()
    ));
    Ok(())
}

fn show_available(output: &Output, ws: &Workspace, name: &str) -> Result<()> {
    skillsnap_core::ops::validate_name(name)?;
    let entries = skillsnap_core::list(ws, Some(name))?;

    if output.is_json() {
        output.json(&AvailableOutput {
            name,
            versions: &entries,
        });
        return Ok(());
    }

    if entries.is_empty() {
        output.info(&format!("No snapshots found for '{}'", name));
        return Ok(());
    }

    output.println(&format!("Available versions for '{}':", name));
    for entry in &entries {
        output.println(&format!("  {}  {}", entry.tag.label(), entry.message));
    }
    output.println("");
    output.println("Usage: skillsnap restore <name> <version>");
    Ok(())
}
