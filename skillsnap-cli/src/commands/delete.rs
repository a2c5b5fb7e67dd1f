//! skillsnap delete command.

use super::Result;
use crate::output::Output;
use skillsnap_core::Workspace;

/// Run the delete command.
pub fn run(output: &Output, ws: &Workspace, name: &str, version: &str) -> Result<()> {
    let result = skillsnap_core::delete(ws, name, version)?;

    if output.is_json() {
        output.json(&result);
        return Ok(());
    }

    output.success(&format!("Deleted snapshot {}", result.tag));
    if !result.remote_deleted && ws.config().remote_url.is_some() {
        output.warn("Remote tag was not deleted; delete it manually or retry");
    }
    Ok(())
}
