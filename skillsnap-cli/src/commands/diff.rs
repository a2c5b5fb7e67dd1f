//! skillsnap diff command.

use super::Result;
use crate::output::Output;
use skillsnap_core::{DiffEntry, Workspace};

/// Unified diff lines shown per file in human output.
const PREVIEW_LINES: usize = 20;

/// Run the diff command.
pub fn run(output: &Output, ws: &Workspace, name: &str, version: Option<&str>) -> Result<()> {
    let report = skillsnap_core::diff(ws, name, version)?;

    if output.is_json() {
        output.json(&report);
        return Ok(());
    }

    if report.is_empty() {
        output.info(&format!("No differences found against {}.", report.tag));
        return Ok(());
    }

    output.println(&format!("Comparing '{}' with {}:", name, report.tag));
    for entry in &report.entries {
        let marker = match entry {
            DiffEntry::Added { .. } => "[+]",
            DiffEntry::Removed { .. } => "[-]",
            DiffEntry::Modified { .. } => "[~]",
            DiffEntry::Unreadable { .. } => "[!]",
        };
        output.println(&format!("{} {}: {}", marker, entry.label(), entry.path()));

        match entry {
            DiffEntry::Modified { unified, .. } => print_preview(output, unified),
            DiffEntry::Unreadable { error, .. } => output.println(&format!("    {}", error)),
            _ => {}
        }
    }

    Ok(())
}

fn print_preview(output: &Output, unified: &str) {
    let lines: Vec<&str> = unified.lines().collect();
    for line in lines.iter().take(PREVIEW_LINES) {
        output.println(&format!("    {}", colorize(line)));
    }
    if lines.len() > PREVIEW_LINES {
        output.println(&format!("    ... and {} more lines.", lines.len() - PREVIEW_LINES));
    }
}

fn colorize(line: &str) -> String {
    if line.starts_with("+++") || line.starts_with("---") {
        format!("\x1b[1m{}\x1b[0m", line)
    } else if line.starts_with('+') {
        format!("\x1b[32m{}\x1b[0m", line)
    } else if line.starts_with('-') {
        format!("\x1b[31m{}\x1b[0m", line)
    } else if line.starts_with("@@") {
        format!("\x1b[36m{}\x1b[0m", line)
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_markers() {
        assert_eq!(colorize("+added"), "\x1b[32m+added\x1b[0m");
        assert_eq!(colorize("-gone"), "\x1b[31m-gone\x1b[0m");
        assert_eq!(colorize(" same"), " same");
        assert!(colorize("+++ Local/SKILL.md").starts_with("\x1b[1m"));
    }
}
