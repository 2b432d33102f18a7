//! Error types for dradismd.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=remote, 3=not_found, 4=validation, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for `--json` consumers

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::SyncError;

/// Result type alias for dradismd operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Remote (exit 2)
    RemoteError,
    Unreachable,

    // Not Found (exit 3)
    ProjectNotFound,
    StandardIssueNotFound,
    PathNotFound,

    // Validation (exit 4)
    InvalidArgument,
    UnsupportedFormat,
    RequiredField,

    // Sync (exit 6)
    SyncError,

    // Config (exit 7)
    ConfigError,
    InvalidToken,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Conversion (exit 9)
    ConversionError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::RemoteError => "REMOTE_ERROR",
            Self::Unreachable => "UNREACHABLE",
            Self::ProjectNotFound => "PROJECT_NOT_FOUND",
            Self::StandardIssueNotFound => "STANDARD_ISSUE_NOT_FOUND",
            Self::PathNotFound => "PATH_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            Self::RequiredField => "REQUIRED_FIELD",
            Self::SyncError => "SYNC_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::ConversionError => "CONVERSION_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-9).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::RemoteError => 2,
            Self::ProjectNotFound | Self::StandardIssueNotFound | Self::PathNotFound => 3,
            Self::InvalidArgument | Self::UnsupportedFormat | Self::RequiredField => 4,
            Self::SyncError => 6,
            Self::ConfigError | Self::InvalidToken | Self::Unreachable => 7,
            Self::IoError | Self::JsonError => 8,
            Self::ConversionError => 9,
        }
    }

    /// Whether retrying with corrected input can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument
                | Self::UnsupportedFormat
                | Self::RequiredField
                | Self::Unreachable
                | Self::RemoteError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in dradismd operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Project not found: {id}")]
    ProjectNotFound { id: u64 },

    #[error("Standard issue not found: {id}")]
    StandardIssueNotFound { id: u64 },

    #[error("Path does not exist: {}", path.display())]
    PathNotFound { path: PathBuf },

    #[error("Unsupported format '{format}' (supported: {})", supported.join(", "))]
    UnsupportedFormat {
        format: String,
        supported: Vec<&'static str>,
    },

    #[error("Invalid or missing Dradis API token")]
    InvalidToken,

    #[error("Instance {url} is not reachable")]
    Unreachable { url: String },

    #[error("Remote request failed: {0}")]
    Remote(String),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing required field {field} in {}", path.display())]
    RequiredField { field: &'static str, path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(err.to_string())
    }
}

impl From<crate::convert::ConvertError> for Error {
    fn from(err: crate::convert::ConvertError) -> Self {
        match err {
            crate::convert::ConvertError::PathNotFound(path) => Self::PathNotFound { path },
            crate::convert::ConvertError::UnsupportedInput(extension) => Self::UnsupportedFormat {
                format: extension,
                supported: crate::convert::MarkupFormat::INPUT_EXTENSIONS.to_vec(),
            },
            other => Self::Conversion(other.to_string()),
        }
    }
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ProjectNotFound { .. } => ErrorCode::ProjectNotFound,
            Self::StandardIssueNotFound { .. } => ErrorCode::StandardIssueNotFound,
            Self::PathNotFound { .. } => ErrorCode::PathNotFound,
            Self::UnsupportedFormat { .. } => ErrorCode::UnsupportedFormat,
            Self::InvalidToken => ErrorCode::InvalidToken,
            Self::Unreachable { .. } => ErrorCode::Unreachable,
            Self::Remote(_) => ErrorCode::RemoteError,
            Self::Sync(_) => ErrorCode::SyncError,
            Self::Conversion(_) => ErrorCode::ConversionError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::RequiredField { .. } => ErrorCode::RequiredField,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ProjectNotFound { id } => Some(format!(
                "Project {id} doesn't exist or you don't have access. \
                 Use `dradismd list-projects` to see available projects."
            )),
            Self::StandardIssueNotFound { id } => Some(format!(
                "No library entry with ID {id}. Use `dradismd list-issues` to search the library."
            )),
            Self::UnsupportedFormat { supported, .. } => {
                Some(format!("Pick one of: {}", supported.join(", ")))
            }
            Self::InvalidToken => Some(
                "Set `api_token` in the config file or export DRADIS_API_TOKEN \
                 (Dradis tokens are 20 characters long)"
                    .to_string(),
            ),
            Self::Unreachable { .. } => Some(
                "Check `instance_url` in the config file, or `ssl_certificate` \
                 if the instance uses a private CA"
                    .to_string(),
            ),
            Self::RequiredField { field, .. } => {
                Some(format!("Add a `#[{field}]#` line followed by its value"))
            }
            Self::Conversion(_) => Some(
                "Conversion needs pandoc on PATH (https://pandoc.org/installing.html)".to_string(),
            ),
            Self::PathNotFound { .. }
            | Self::Remote(_)
            | Self::Sync(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
