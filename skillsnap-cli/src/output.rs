//! Output formatting for the CLI.
//!
//! Handles human-readable and JSON output formats.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::OutputFormat;

/// Output handler for CLI commands.
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    /// Check if JSON output is selected.
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a line to stdout (respects quiet mode, suppressed for JSON).
    pub fn println(&self, msg: &str) {
        if !self.quiet && !self.is_json() {
            println!("{}", msg);
        }
    }

    /// Print a success message (green in human format).
    pub fn success(&self, msg: &str) {
        if !self.quiet && !self.is_json() {
            println!("\x1b[32m{}\x1b[0m", msg);
        }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if !self.quiet && !self.is_json() {
            println!("{}", msg);
        }
    }

    /// Print a warning message (yellow in human format).
    pub fn warn(&self, msg: &str) {
        if self.quiet {
            return;
        }
        match self.format {
            OutputFormat::Human => eprintln!("\x1b[33m{}\x1b[0m", msg),
            OutputFormat::Json => eprintln!("{}", json!({"type": "warning", "message": msg})),
        }
    }

    /// Print an error message (red in human format, always shown).
    pub fn error(&self, error_type: &str, msg: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("\x1b[31merror: {}\x1b[0m", msg),
            OutputFormat::Json => eprintln!(
                "{}",
                json!({"type": "error", "error_type": error_type, "message": msg})
            ),
        }
    }

    /// Print a value as pretty JSON on stdout.
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{}", s),
            Err(e) => self.error("json_error", &e.to_string()),
        }
    }

    /// Print rows as a table (respects quiet mode).
    pub fn table<T: Tabled>(&self, rows: &[T]) {
        if !self.quiet && !self.is_json() {
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }
    }

    /// Progress bar over `len` items; hidden for JSON and quiet output.
    pub fn progress(&self, len: u64) -> ProgressBar {
        if self.quiet || self.is_json() {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
            pb.set_style(style.progress_chars("=> "));
        }
        pb
    }
}
