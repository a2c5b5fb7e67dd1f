//! skillsnap rebuild-cache and clear-cache commands.

use serde::Serialize;

use super::Result;
use crate::output::Output;
use skillsnap_core::Workspace;

#[derive(Serialize)]
struct RebuildOutput {
    rebuilt: Vec<String>,
}

/// Run the rebuild-cache command.
pub fn rebuild(output: &Output, ws: &Workspace, name: Option<&str>) -> Result<()> {
    let rebuilt = skillsnap_core::rebuild_cache(ws, name)?;

    if output.is_json() {
        output.json(&RebuildOutput { rebuilt });
        return Ok(());
    }

    if rebuilt.is_empty() {
        output.info("No skills to cache");
    } else {
        for tree in &rebuilt {
            output.println(&format!("  {}", tree));
        }
        output.success(&format!("Rebuilt cache for {} skill(s)", rebuilt.len()));
    }
    Ok(())
}

/// Run the clear-cache command.
pub fn clear(output: &Output, ws: &Workspace, name: Option<&str>) -> Result<()> {
    let result = skillsnap_core::clear_cache(ws, name)?;

    if output.is_json() {
        output.json(&result);
        return Ok(());
    }

    match (name, result.removed) {
        (_, 0) => output.info("Cache already empty"),
        (Some(name), _) => output.success(&format!("Cleared cache for '{}'", name)),
        (None, n) => output.success(&format!("Cleared cache ({} entries)", n)),
    }
    Ok(())
}
