//! skillsnap list command.

use tabled::Tabled;

use super::Result;
use crate::output::Output;
use skillsnap_core::Workspace;

/// Table row for list output.
#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "Tag")]
    tag: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Run the list command.
pub fn run(output: &Output, ws: &Workspace, name: Option<&str>) -> Result<()> {
    let entries = skillsnap_core::list(ws, name)?;

    if output.is_json() {
        output.json(&entries);
        return Ok(());
    }

    if entries.is_empty() {
        match name {
            Some(name) => output.info(&format!("No snapshots found for '{}'", name)),
            None => output.info("No snapshots found"),
        }
        return Ok(());
    }

    let rows: Vec<ListRow> = entries
        .iter()
        .map(|e| ListRow {
            tag: e.tag.to_string(),
            message: e.message.clone(),
        })
        .collect();
    output.table(&rows);

    Ok(())
}
