//! Error types for ccodetools
//!
//! One error enum for the library; the binary wraps it with `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for analysis, tool execution and the server
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Source file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Source file exceeds the configured size limit
    #[error("File too large: {} is {size} bytes, limit is {max} bytes", path.display())]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max: u64,
    },

    /// The C grammar could not be loaded or produced no tree
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Requested function has no definition in the file
    #[error("Function '{0}' not found")]
    FunctionNotFound(String),

    /// Backend name not known to the factory
    #[error("Analyzer '{name}' not found. Available: {available}")]
    UnknownBackend { name: String, available: String },

    /// Path resolved outside of the configured source root
    #[error("Path escapes source root: {}", .0.display())]
    PathEscapesRoot(PathBuf),

    /// Tool arguments missing or of the wrong type
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// Unknown tool name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// JSON-RPC framing errors
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalyzerError::FileTooLarge {
            path: PathBuf::from("big.c"),
            size: 9000,
            max: 8000,
        };
        assert!(err.to_string().contains("big.c"));
        assert!(err.to_string().contains("9000"));
        assert!(err.to_string().contains("8000"));
    }

    #[test]
    fn test_function_not_found_message() {
        let err = AnalyzerError::FunctionNotFound("frobnicate".to_string());
        assert_eq!(err.to_string(), "Function 'frobnicate' not found");
    }

    #[test]
    fn test_unknown_backend_lists_available() {
        let err = AnalyzerError::UnknownBackend {
            name: "clang".to_string(),
            available: "syntax".to_string(),
        };
        assert!(err.to_string().contains("clang"));
        assert!(err.to_string().contains("Available: syntax"));
    }
}
