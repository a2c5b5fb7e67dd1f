//! skillsnap init command.

use super::Result;
use crate::output::Output;
use skillsnap_core::{InitAction, Workspace};

/// Run the init command.
pub fn run(output: &Output, ws: &Workspace) -> Result<()> {
    let result = skillsnap_core::init(ws)?;

    if output.is_json() {
        output.json(&result);
        return Ok(());
    }

    let path = result.repo_dir.display();
    match result.action {
        InitAction::Existing => output.info(&format!("Repository already initialized at {}", path)),
        InitAction::Created => output.success(&format!("Created repository at {}", path)),
        InitAction::Cloned => output.success(&format!(
            "Cloned {} into {}",
            result.remote_url.as_deref().unwrap_or("remote"),
            path
        )),
    }
    if result.gitignore_updated {
        output.info("Updated .gitignore");
    }

    Ok(())
}
