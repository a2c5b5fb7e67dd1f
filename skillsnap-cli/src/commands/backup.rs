//! skillsnap backup-all command.

use tabled::Tabled;

use super::{CliError, Result};
use crate::output::Output;
use skillsnap_core::{BackupEvent, Workspace};

/// Table row for failed trees.
#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "Skill")]
    tree: String,
    #[tabled(rename = "Error")]
    error: String,
}

/// Run the backup-all command.
pub fn run(output: &Output, ws: &Workspace, message: Option<&str>) -> Result<()> {
    let pb = output.progress(0);

    let report = skillsnap_core::backup_all(ws, message, |event| match event {
        BackupEvent::Planned { changed, .. } => pb.set_length(changed as u64),
        BackupEvent::Saving { name, .. } => pb.set_message(name.to_string()),
        BackupEvent::Saved { name, outcome } => {
            pb.inc(1);
            if let Some(tag) = &outcome.tag {
                pb.println(format!("  created {}", tag));
            } else {
                pb.println(format!("  {} unchanged", name));
            }
        }
        BackupEvent::Failed { name, error } => {
            pb.inc(1);
            pb.println(format!("  {} failed: {}", name, error));
        }
    });
    pb.finish_and_clear();
    let report = report?;

    if output.is_json() {
        output.json(&report);
    } else {
        output.info(&format!(
            "Scanned {} skills: {} changed, {} snapshots created, {} unchanged, {} failed",
            report.scanned,
            report.changed,
            report.created.len(),
            report.unchanged.len(),
            report.failed.len()
        ));
        if !report.failed.is_empty() {
            let rows: Vec<FailureRow> = report
                .failed
                .iter()
                .map(|f| FailureRow {
                    tree: f.tree.clone(),
                    error: f.message.clone(),
                })
                .collect();
            output.table(&rows);
        }
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::Failed(format!(
            "{} of {} skills failed to back up",
            report.failed.len(),
            report.scanned
        )))
    }
}
