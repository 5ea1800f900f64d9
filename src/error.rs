//! Unified error handling for trialseal
//!
//! This module provides the error system shared by the codec, the gate, the
//! loader and the CLI:
//! - Unique error codes for debugging and documentation
//! - Structured error information with context
//! - Convenient constructor methods
//! - Automatic conversions from common error types
//!
//! Gate denials never surface their cause. Every denial collapses into
//! [`TrialsealError::InitializationFailed`] through [`TrialsealError::denied`].

use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::gate::DenyReason;

/// Unified Result type for all trialseal operations
pub type Result<T> = std::result::Result<T, TrialsealError>;

/// Error codes for trialseal operations
///
/// Each error has a unique code in the format `TXXX` where:
/// - T1XX: Trailer errors
/// - T2XX: Trial gate and runtime errors
/// - T3XX: File and I/O errors
/// - T4XX: Configuration errors
/// - T5XX: Validation and input errors
/// - T8XX: UI and interaction errors
/// - T9XX: Serialization errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Trailer (T1XX)
    /// T101: Trailer header present but structure incomplete
    MalformedTrailer,

    // Gate / runtime (T2XX)
    /// T201: Model initialization failed (generic gate denial)
    InitializationFailed,
    /// T202: Wrapped runtime constructor failed
    RuntimeError,

    // File/IO (T3XX)
    /// T301: File not found
    FileNotFound,
    /// T302: File read error
    FileReadError,
    /// T303: File write error
    FileWriteError,
    /// T304: Staging the transient copy failed
    StagingFailed,
    /// T305: Path error
    PathError,

    // Configuration (T4XX)
    /// T401: Configuration error
    ConfigError,

    // Validation (T5XX)
    /// T501: Invalid input
    InvalidInput,
    /// T502: Validation failed
    ValidationFailed,

    // UI (T8XX)
    /// T801: Dialog error
    DialogError,
    /// T802: User cancelled
    UserCancelled,

    // Serialization (T9XX)
    /// T902: Serialization error
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::MalformedTrailer => 101,

            ErrorCode::InitializationFailed => 201,
            ErrorCode::RuntimeError => 202,

            ErrorCode::FileNotFound => 301,
            ErrorCode::FileReadError => 302,
            ErrorCode::FileWriteError => 303,
            ErrorCode::StagingFailed => 304,
            ErrorCode::PathError => 305,

            ErrorCode::ConfigError => 401,

            ErrorCode::InvalidInput => 501,
            ErrorCode::ValidationFailed => 502,

            ErrorCode::DialogError => 801,
            ErrorCode::UserCancelled => 802,

            ErrorCode::SerializationError => 902,
        }
    }

    /// Get the string code (e.g., "T201")
    pub fn as_str(&self) -> String {
        format!("T{}", self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.code())
    }
}

/// Main error type for all trialseal operations
#[derive(Error, Debug)]
pub enum TrialsealError {
    // ==================== Trailer Errors (T1XX) ====================
    /// Trailer header found but the structure behind it is broken
    #[error("[{code}] Malformed trailer: {message}")]
    Trailer {
        code: ErrorCode,
        message: String,
        offset: usize,
    },

    // ==================== Gate / Runtime Errors (T2XX) ====================
    /// Generic load failure. Carries no cause on purpose.
    #[error("Model initialization failed")]
    InitializationFailed,

    /// The wrapped runtime constructor failed
    #[error("[{code}] Runtime error: {source}")]
    Runtime {
        code: ErrorCode,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ==================== File/IO Errors (T3XX) ====================
    /// File or IO error
    #[error("[{code}] {context}: {message}")]
    Io {
        code: ErrorCode,
        context: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Path related error
    #[error("[{code}] Path error: {message}")]
    Path {
        code: ErrorCode,
        message: String,
        path: Option<String>,
    },

    // ==================== Configuration Errors (T4XX) ====================
    /// Configuration error
    #[error("[{code}] Configuration error: {message}")]
    Config {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<config::ConfigError>,
    },

    // ==================== Validation Errors (T5XX) ====================
    /// Validation error
    #[error("[{code}] Validation error: {message}")]
    Validation { code: ErrorCode, message: String },

    /// Invalid input error
    #[error("[{code}] Invalid input: {message}")]
    InvalidInput { code: ErrorCode, message: String },

    // ==================== UI Errors (T8XX) ====================
    /// UI/Dialog error
    #[error("[{code}] UI error: {message}")]
    Ui { code: ErrorCode, message: String },

    // ==================== Serialization Errors (T9XX) ====================
    /// JSON serialization error
    #[error("[{code}] Serialization error: {message}")]
    Serialization {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

// ==================== Constructor Methods ====================

impl TrialsealError {
    // --- Trailer ---

    /// Create malformed trailer error
    pub fn malformed_trailer(message: impl Into<String>, offset: usize) -> Self {
        Self::Trailer {
            code: ErrorCode::MalformedTrailer,
            message: message.into(),
            offset,
        }
    }

    // --- Gate / runtime ---

    /// Collapse a gate denial into the public sentinel.
    ///
    /// This is the only place a [`DenyReason`] is turned into an error. The
    /// reason is logged at debug level and then discarded.
    pub fn denied(reason: &DenyReason) -> Self {
        tracing::debug!(reason = %reason, "model load denied");
        Self::InitializationFailed
    }

    /// Wrap an error returned by the runtime's own constructor
    pub fn runtime(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime {
            code: ErrorCode::RuntimeError,
            source: Box::new(source),
        }
    }

    // --- File/IO ---

    /// Create IO error for a failed read of `path`
    pub fn read_failed(path: &Path, err: std::io::Error) -> Self {
        Self::io_from_error(format!("Read {}", path.display()), err, ErrorCode::FileReadError)
    }

    /// Create IO error for a failed write of `path`
    pub fn write_failed(path: &Path, err: std::io::Error) -> Self {
        Self::io_from_error(format!("Write {}", path.display()), err, ErrorCode::FileWriteError)
    }

    /// Create IO error from std::io::Error; `fallback` is used unless the file is missing
    fn io_from_error(context: String, err: std::io::Error, fallback: ErrorCode) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            _ => fallback,
        };

        Self::Io {
            code,
            context,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create staging error for the transient copy
    pub fn staging(err: std::io::Error) -> Self {
        Self::Io {
            code: ErrorCode::StagingFailed,
            context: "Transient model staging".to_string(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::Io {
            code: ErrorCode::FileNotFound,
            context: "File not found".to_string(),
            message: path.into(),
            source: None,
        }
    }

    /// Create path error with path
    pub fn path_with_location(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Path {
            code: ErrorCode::PathError,
            message: message.into(),
            path: Some(path.into()),
        }
    }

    // --- Configuration ---

    /// Create configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration error with source
    pub fn config_from_error(err: config::ConfigError) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: err.to_string(),
            source: Some(err),
        }
    }

    // --- Validation ---

    /// Create validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
        }
    }

    /// Create invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code: ErrorCode::InvalidInput,
            message: message.into(),
        }
    }

    // --- UI ---

    /// Create user cancelled error
    pub fn user_cancelled() -> Self {
        Self::Ui {
            code: ErrorCode::UserCancelled,
            message: "Operation cancelled by user".to_string(),
        }
    }

    // --- Utility Methods ---

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Trailer { code, .. } => *code,
            Self::InitializationFailed => ErrorCode::InitializationFailed,
            Self::Runtime { code, .. } => *code,
            Self::Io { code, .. } => *code,
            Self::Path { code, .. } => *code,
            Self::Config { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::InvalidInput { code, .. } => *code,
            Self::Ui { code, .. } => *code,
            Self::Serialization { code, .. } => *code,
        }
    }

    /// Check if this is the generic gate denial
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::InitializationFailed)
    }
}

// ==================== From Implementations ====================

impl From<std::io::Error> for TrialsealError {
    fn from(err: std::io::Error) -> Self {
        Self::io_from_error("IO operation".to_string(), err, ErrorCode::FileReadError)
    }
}

impl From<serde_json::Error> for TrialsealError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            code: ErrorCode::SerializationError,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<config::ConfigError> for TrialsealError {
    fn from(err: config::ConfigError) -> Self {
        Self::config_from_error(err)
    }
}

impl From<dialoguer::Error> for TrialsealError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Ui {
            code: ErrorCode::DialogError,
            message: format!("Dialog error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trailer::Expiry;
    use std::io::ErrorKind;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::MalformedTrailer.code(), 101);
        assert_eq!(ErrorCode::InitializationFailed.code(), 201);
        assert_eq!(ErrorCode::FileNotFound.code(), 301);
        assert_eq!(ErrorCode::ConfigError.code(), 401);
    }

    #[test]
    fn test_error_code_string() {
        assert_eq!(ErrorCode::StagingFailed.as_str(), "T304");
        assert_eq!(ErrorCode::RuntimeError.to_string(), "T202");
    }

    #[test]
    fn test_denial_is_uninformative() {
        let expired = TrialsealError::denied(&DenyReason::Expired {
            expiry: Expiry::from_unix(1_700_000_000),
            now: 1_700_000_001,
        });
        let malformed = TrialsealError::denied(&DenyReason::Malformed);
        let unreadable = TrialsealError::denied(&DenyReason::Unreadable(
            std::io::ErrorKind::NotFound,
        ));

        assert_eq!(expired.to_string(), "Model initialization failed");
        assert_eq!(expired.to_string(), malformed.to_string());
        assert_eq!(malformed.to_string(), unreadable.to_string());
        assert!(expired.is_denial());
        assert_eq!(unreadable.code(), ErrorCode::InitializationFailed);
    }

    #[test]
    fn test_io_error_code_mapping() {
        let err = TrialsealError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(err.code(), ErrorCode::FileNotFound);

        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        let read = TrialsealError::read_failed(Path::new("m.onnx"), denied);
        assert_eq!(read.code(), ErrorCode::FileReadError);
        assert!(read.to_string().starts_with("[T302] Read m.onnx"));

        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        let write = TrialsealError::write_failed(Path::new("m.onnx"), denied);
        assert_eq!(write.code(), ErrorCode::FileWriteError);

        let missing = std::io::Error::from(ErrorKind::NotFound);
        let write_missing = TrialsealError::write_failed(Path::new("out/m.onnx"), missing);
        assert_eq!(write_missing.code(), ErrorCode::FileNotFound);

        let staging = TrialsealError::staging(std::io::Error::other("disk full"));
        assert_eq!(staging.code(), ErrorCode::StagingFailed);
        assert!(staging.to_string().contains("disk full"));
    }
}
