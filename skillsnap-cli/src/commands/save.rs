//! skillsnap save command.

use super::Result;
use crate::output::Output;
use skillsnap_core::{NoSnapshotReason, SaveOptions, Workspace};

/// Run the save command.
pub fn run(
    output: &Output,
    ws: &Workspace,
    name: &str,
    message: Option<String>,
    sync: bool,
    force: bool,
) -> Result<()> {
    let options = SaveOptions {
        message,
        sync_remote: sync,
        skip_fast_check: force,
    };
    let outcome = skillsnap_core::save(ws, name, &options)?;

    if output.is_json() {
        output.json(&outcome);
        return Ok(());
    }

    match (&outcome.tag, outcome.reason) {
        (Some(tag), _) => output.success(&format!("Created snapshot {}", tag)),
        (None, Some(NoSnapshotReason::IdenticalStaged)) => output.info(&format!(
            "No changes to snapshot for '{}' (content matches the last snapshot)",
            name
        )),
        (None, _) => output.info(&format!("No changes detected for '{}'", name)),
    }

    Ok(())
}
