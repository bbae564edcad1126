//! Unified error hierarchy for RideLens
//!
//! Only decoding and I/O can fail. Missing data inside a decoded file is
//! represented with defaults and `None`, never with an error.

use std::path::PathBuf;
use thiserror::Error;

use crate::export::ExportError;

/// Top-level error type for all RideLens operations
#[derive(Debug, Error)]
pub enum RideLensError {
    /// FIT file decoding errors
    #[error("FIT parsing error: {0}")]
    FitParsing(#[from] FitError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// FIT decoding specific errors
#[derive(Debug, Error)]
pub enum FitError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The decoder rejected the bytes
    #[error("Malformed FIT data: {reason}")]
    Decode { reason: String },

    /// The path does not look like a FIT file
    #[error("Unsupported file: {path}")]
    UnsupportedFile { path: PathBuf },
}

/// Result type alias for RideLens operations
pub type Result<T> = std::result::Result<T, RideLensError>;

impl RideLensError {
    /// Whether the input itself was rejected, as opposed to the environment failing
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, RideLensError::FitParsing(FitError::Decode { .. }))
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RideLensError::FitParsing(FitError::FileNotFound { .. }) => ErrorSeverity::Warning,
            RideLensError::FitParsing(FitError::UnsupportedFile { .. }) => ErrorSeverity::Warning,
            RideLensError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RideLensError::FitParsing(FitError::FileNotFound { path }) => {
                format!("Could not find ride file: {}", path.display())
            }
            RideLensError::FitParsing(FitError::Decode { .. }) => {
                "Failed to read the ride file. Please make sure it is a valid .fit file.".to_string()
            }
            RideLensError::FitParsing(FitError::UnsupportedFile { path }) => {
                format!(
                    "{} is not a .fit file. Please select a file from your cycling computer.",
                    path.display()
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = RideLensError::FitParsing(FitError::FileNotFound {
            path: PathBuf::from("/test/ride.fit"),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);

        let err = RideLensError::FitParsing(FitError::Decode {
            reason: "bad header".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);

        let err = RideLensError::Internal("test".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_decode_failure() {
        let err = RideLensError::FitParsing(FitError::Decode {
            reason: "truncated".to_string(),
        });
        assert!(err.is_decode_failure());

        let err = RideLensError::Io(std::io::Error::new(std::io::ErrorKind::Interrupted, "eintr"));
        assert!(!err.is_decode_failure());
    }

    #[test]
    fn test_user_messages() {
        let err = RideLensError::FitParsing(FitError::FileNotFound {
            path: PathBuf::from("ride.fit"),
        });
        assert!(err.user_message().contains("Could not find"));

        let err = RideLensError::FitParsing(FitError::UnsupportedFile {
            path: PathBuf::from("ride.gpx"),
        });
        assert!(err.user_message().contains("not a .fit file"));
    }
}
