//! Error types for locating and reading data files

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while locating or decoding a data file
#[derive(Error, Debug)]
pub enum IngestError {
    /// No qualifying data file was found
    #[error("No data file found in {}: {reason}", .directory.display())]
    InputNotFound { directory: PathBuf, reason: String },

    /// No attempted text encoding could decode the file
    #[error("Unable to decode {} with any of the attempted encodings: {}", .path.display(), .attempted.join(", "))]
    Decode {
        path: PathBuf,
        attempted: Vec<String>,
    },

    /// The file extension is not an accepted input format
    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The file content could not be parsed
    #[error("Invalid file format: {} - {reason}", .path.display())]
    InvalidFormat { path: PathBuf, reason: String },

    /// Unknown encoding label in the configuration
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Invalid discovery pattern
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ingest operations
pub type IngestResult<T> = Result<T, IngestError>;

impl IngestError {
    /// Create an invalid-format error for a path
    pub fn invalid_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            IngestError::InputNotFound { directory, reason } => {
                format!(
                    "No data file found in {}: {reason}\n\nHint: Make sure the script writes a .csv, .xlsx or .json file into $DATALOOM_OUTPUT_DIR.",
                    directory.display()
                )
            }
            IngestError::Decode { path, attempted } => {
                format!(
                    "Unable to decode {} (tried {}).\n\nHint: Add the file's encoding to [reader] encodings.",
                    path.display(),
                    attempted.join(", ")
                )
            }
            IngestError::UnsupportedFormat(path) => {
                format!(
                    "Unsupported file format: {}\n\nHint: Accepted extensions are .csv, .xlsx and .json.",
                    path.display()
                )
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_lists_encodings() {
        let err = IngestError::Decode {
            path: PathBuf::from("/data/export.csv"),
            attempted: vec!["utf-8-sig".to_string(), "utf-8".to_string()],
        };
        let display = err.to_string();
        assert!(display.contains("/data/export.csv"));
        assert!(display.contains("utf-8-sig, utf-8"));
    }

    #[test]
    fn test_user_message_hint() {
        let err = IngestError::InputNotFound {
            directory: PathBuf::from("/data"),
            reason: "no file modified in the last 120s".to_string(),
        };
        assert!(err.user_message().contains("Hint"));
    }
}
