//! skillsnap scan command.

use tabled::Tabled;

use super::{format_size, Result};
use crate::output::Output;
use skillsnap_core::{SkipReason, Workspace};

/// Table row for scan output.
#[derive(Tabled)]
struct ScanRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Run the scan command.
pub fn run(output: &Output, ws: &Workspace) -> Result<()> {
    let entries = skillsnap_core::scan(ws)?;

    if output.is_json() {
        output.json(&entries);
        return Ok(());
    }

    if entries.is_empty() {
        output.info("No skills found");
        return Ok(());
    }

    let rows: Vec<ScanRow> = entries
        .iter()
        .map(|e| ScanRow {
            name: e.name.clone(),
            size: format_size(e.size),
            status: match e.skipped {
                None => "ready".to_string(),
                Some(SkipReason::SelfTree) => "skipped (self)".to_string(),
                Some(SkipReason::TooLarge) => "skipped (too large)".to_string(),
            },
        })
        .collect();
    output.table(&rows);

    let candidates = entries.iter().filter(|e| e.is_candidate()).count();
    output.info(&format!("{} of {} skills eligible", candidates, entries.len()));

    Ok(())
}
