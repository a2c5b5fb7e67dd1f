//! skillsnap status command.

use super::Result;
use crate::output::Output;
use skillsnap_core::Workspace;

/// Run the status command.
pub fn run(output: &Output, ws: &Workspace) -> Result<()> {
    let report = skillsnap_core::status(ws)?;

    if output.is_json() {
        output.json(&report);
        return Ok(());
    }

    let repo = &report.repo;
    output.println(&format!("Repository: {}", repo.path.display()));
    if !repo.initialized {
        output.println("  not initialized (run 'skillsnap init')");
    } else if let Some(state) = &repo.state {
        let branch = match (&state.branch, state.is_detached) {
            (Some(b), false) => b.clone(),
            (_, true) => "(detached)".to_string(),
            (None, false) => "(no branch)".to_string(),
        };
        output.println(&format!("  branch: {}", branch));
        output.println(&format!(
            "  working tree: {}{}",
            if state.is_dirty { "dirty" } else { "clean" },
            if state.has_untracked { ", untracked files" } else { "" }
        ));
    }
    if repo.locked {
        output.warn("  locked by another skillsnap process");
    }
    if let Some(remote) = &ws.config().remote_url {
        output.println(&format!("  remote: {}", remote));
    }

    let cache = &report.cache;
    output.println(&format!("Cache: {}", cache.path.display()));
    if cache.exists {
        output.println(&format!(
            "  {} skill(s) cached, format {}",
            cache.cached_trees, cache.version
        ));
    } else {
        output.println("  empty");
    }

    match &report.trees {
        Some(trees) => {
            output.println(&format!(
                "Skills: {} total, {} changed, {} unchanged",
                trees.total,
                trees.changed.len(),
                trees.unchanged
            ));
            for name in &trees.changed {
                output.println(&format!("  * {}", name));
            }
        }
        None => output.println(&format!(
            "Skills: directory not found ({})",
            ws.layout().skills_dir().display()
        )),
    }

    Ok(())
}
