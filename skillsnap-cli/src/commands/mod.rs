//! skillsnap command implementations.
//!
//! Each subcommand is implemented in its own module and delegates
//! to skillsnap-core for the actual snapshot logic.

pub mod init;
pub mod scan;
pub mod save;
pub mod list;
pub mod restore;
pub mod delete;
pub mod backup;
pub mod diff;
pub mod cache;
pub mod status;

use std::io;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// skillsnap core error.
    #[error("{0}")]
    Snap(#[from] skillsnap_core::SnapError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArg(String),

    /// Some items of a batch failed; details were already printed.
    #[error("{0}")]
    Failed(String),
}

impl CliError {
    /// Stable error type for JSON output.
    pub fn error_type(&self) -> &'static str {
        match self {
            CliError::Snap(e) => e.error_type(),
            CliError::Io(_) => "io_error",
            CliError::InvalidArg(_) => "invalid_input",
            CliError::Failed(_) => "partial_failure",
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Human-readable byte count.
pub(crate) fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{} B", bytes)
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}
