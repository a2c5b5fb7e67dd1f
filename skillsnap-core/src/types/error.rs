//! skillsnap error types.
//!
//! Every failure carries an `ErrorKind` whose `error_type()` string is stable,
//! so JSON consumers of the CLI can match on it.

use std::fmt;
use std::path::PathBuf;

/// Error kind enum for skillsnap operations.
#[derive(Debug, Clone)]
pub enum ErrorKind {
    /// Tree, tag or snapshot absent.
    NotFound { message: String },
    /// Another invocation holds the repository lock.
    Conflict { message: String },
    /// Required tooling (the `git` binary, the network) is missing.
    Unavailable { message: String },
    /// Attempt to modify the reserved self tree.
    Forbidden { name: String },
    /// Cache or archive failed to parse.
    Corrupt { message: String },
    /// Underlying commit/push/tag operation failed.
    Backend { message: String },
    /// Tree exceeds the size cap.
    TooLarge { name: String, size: u64, limit: u64 },
    /// Malformed name, version or argument.
    InvalidInput { message: String },
    /// Snapshot repository not initialized.
    NotInitialized { path: PathBuf },
    /// Configuration error.
    ConfigError { message: String },
    /// JSON parsing error.
    JsonError { message: String },
    /// I/O error.
    IoError { message: String },
}

impl ErrorKind {
    /// Get the error type as a string.
    ///
    /// These strings are stable and must not change.
    pub fn error_type(&self) -> &'static str {
        match self {
            ErrorKind::NotFound { .. } => "not_found",
            ErrorKind::Conflict { .. } => "conflict",
            ErrorKind::Unavailable { .. } => "unavailable",
            ErrorKind::Forbidden { .. } => "forbidden",
            ErrorKind::Corrupt { .. } => "corrupt",
            ErrorKind::Backend { .. } => "backend",
            ErrorKind::TooLarge { .. } => "too_large",
            ErrorKind::InvalidInput { .. } => "invalid_input",
            ErrorKind::NotInitialized { .. } => "not_initialized",
            ErrorKind::ConfigError { .. } => "config_error",
            ErrorKind::JsonError { .. } => "json_error",
            ErrorKind::IoError { .. } => "io_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound { message } => write!(f, "{}", message),
            ErrorKind::Conflict { message } => write!(f, "{}", message),
            ErrorKind::Unavailable { message } => write!(f, "unavailable: {}", message),
            ErrorKind::Forbidden { name } => {
                write!(f, "'{}' is reserved and cannot be modified", name)
            }
            ErrorKind::Corrupt { message } => write!(f, "corrupt data: {}", message),
            ErrorKind::Backend { message } => write!(f, "backend error: {}", message),
            ErrorKind::TooLarge { name, size, limit } => write!(
                f,
                "'{}' is {} bytes, over the {} byte limit",
                name, size, limit
            ),
            ErrorKind::InvalidInput { message } => write!(f, "invalid input: {}", message),
            ErrorKind::NotInitialized { path } => write!(
                f,
                "snapshot repository not initialized at {} - run skillsnap init first",
                path.display()
            ),
            ErrorKind::ConfigError { message } => write!(f, "config error: {}", message),
            ErrorKind::JsonError { message } => write!(f, "json error: {}", message),
            ErrorKind::IoError { message } => write!(f, "io error: {}", message),
        }
    }
}

impl std::error::Error for ErrorKind {}

/// Main error type for skillsnap operations.
#[derive(Debug)]
pub struct SnapError(Box<ErrorKind>);

impl SnapError {
    /// Create a new error from an error kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Get the error type as a string.
    pub fn error_type(&self) -> &'static str {
        self.kind().error_type()
    }

    // Convenience constructors

    /// Create a "not found" error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound {
            message: message.into(),
        })
    }

    /// Create a "conflict" error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict {
            message: message.into(),
        })
    }

    /// Create the "operation in progress" conflict raised when the lock is taken.
    pub fn lock_held() -> Self {
        Self::conflict("another snapshot operation is in progress, try again later")
    }

    /// Create an "unavailable" error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable {
            message: message.into(),
        })
    }

    /// Create a "forbidden" error for the reserved tree name.
    pub fn forbidden(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden { name: name.into() })
    }

    /// Create a "corrupt" error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Corrupt {
            message: message.into(),
        })
    }

    /// Create a "backend" error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Backend {
            message: message.into(),
        })
    }

    /// Create a "too large" error.
    pub fn too_large(name: impl Into<String>, size: u64, limit: u64) -> Self {
        Self::new(ErrorKind::TooLarge {
            name: name.into(),
            size,
            limit,
        })
    }

    /// Create an "invalid input" error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput {
            message: message.into(),
        })
    }

    /// Create a "not initialized" error.
    pub fn not_initialized(path: impl Into<PathBuf>) -> Self {
        Self::new(ErrorKind::NotInitialized { path: path.into() })
    }

    /// Create a "config error".
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigError {
            message: message.into(),
        })
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound { .. })
    }

    /// Check if this is a Conflict error.
    pub fn is_conflict(&self) -> bool {
        matches!(self.kind(), ErrorKind::Conflict { .. })
    }

    /// Check if this is a Forbidden error.
    pub fn is_forbidden(&self) -> bool {
        matches!(self.kind(), ErrorKind::Forbidden { .. })
    }

    /// Check if this is a Backend error.
    pub fn is_backend(&self) -> bool {
        matches!(self.kind(), ErrorKind::Backend { .. })
    }

    /// Check if this is an Unavailable error.
    pub fn is_unavailable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Unavailable { .. })
    }

    /// Check if this is a TooLarge error.
    pub fn is_too_large(&self) -> bool {
        matches!(self.kind(), ErrorKind::TooLarge { .. })
    }

    /// Check if this is an InvalidInput error.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidInput { .. })
    }

    /// Check if this is a NotInitialized error.
    pub fn is_not_initialized(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotInitialized { .. })
    }

    /// Check if this is an IoError.
    pub fn is_io_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::IoError { .. })
    }
}

impl fmt::Display for SnapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SnapError {}

// Conversion from common error types

impl From<std::io::Error> for SnapError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::IoError {
            message: e.to_string(),
        })
    }
}

impl From<serde_json::Error> for SnapError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(ErrorKind::JsonError {
            message: e.to_string(),
        })
    }
}

impl From<toml::de::Error> for SnapError {
    fn from(e: toml::de::Error) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<git2::Error> for SnapError {
    fn from(e: git2::Error) -> Self {
        Self::backend(e.message().to_string())
    }
}

impl From<walkdir::Error> for SnapError {
    fn from(e: walkdir::Error) -> Self {
        Self::new(ErrorKind::IoError {
            message: e.to_string(),
        })
    }
}
