//! Error types module
//!
//! All conversion failures are unified under `ConvertError`. Chat-facing text is
//! deliberately generic; the variant and its fields are what gets logged.

use std::io;
use std::path::PathBuf;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like unsupported pairs
    Debug,
    /// Warning level - for recoverable issues like a full queue
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Describes how an error should be reported
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "TOOL_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether trying again later may succeed
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Unsupported conversion: {from} to {to}")]
    Unsupported { from: String, to: String },

    #[error("Invalid target format: {0}")]
    InvalidFormat(String),

    #[error("Input file not found: {0}")]
    MissingInput(PathBuf),

    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    #[error("Image processing error: {0}")]
    Image(String),

    #[error("Document processing error: {0}")]
    Document(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Conversion timed out after {0} seconds")]
    Timeout(u64),

    #[error("Too many conversions in progress")]
    Busy,

    #[error("Conversion was abandoned before its output was published")]
    Abandoned,
}

impl ConvertError {
    pub fn unsupported(from: impl Into<String>, to: impl Into<String>) -> Self {
        ConvertError::Unsupported {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        ConvertError::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Only a full gate is worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.is_recoverable()
    }

    /// Chat text for a failed conversion of a `noun` file (video, document, image).
    pub fn user_message(&self, noun: &str) -> String {
        match self {
            ConvertError::Busy => {
                "⏳ Too many conversions in progress, please try again later.".to_string()
            }
            _ => format!("❌ Error during {} conversion!", noun),
        }
    }
}

impl ErrorMetadata for ConvertError {
    fn error_code(&self) -> &'static str {
        match self {
            ConvertError::Unsupported { .. } => "UNSUPPORTED_CONVERSION",
            ConvertError::InvalidFormat(_) => "INVALID_FORMAT",
            ConvertError::MissingInput(_) => "MISSING_INPUT",
            ConvertError::Tool { .. } => "TOOL_FAILED",
            ConvertError::Image(_) => "IMAGE_PROCESSING_ERROR",
            ConvertError::Document(_) => "DOCUMENT_PROCESSING_ERROR",
            ConvertError::Io(_) => "IO_ERROR",
            ConvertError::Timeout(_) => "TIMEOUT",
            ConvertError::Busy => "BUSY",
            ConvertError::Abandoned => "ABANDONED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, ConvertError::Busy)
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ConvertError::Unsupported { .. } | ConvertError::InvalidFormat(_) => LogLevel::Debug,
            ConvertError::Busy | ConvertError::Timeout(_) | ConvertError::Abandoned => {
                LogLevel::Warn
            }
            _ => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ConvertError::unsupported(".txt", "mp4").error_code(),
            "UNSUPPORTED_CONVERSION"
        );
        assert_eq!(ConvertError::Busy.error_code(), "BUSY");
        assert_eq!(
            ConvertError::tool("ffmpeg", "boom").error_code(),
            "TOOL_FAILED"
        );
    }

    #[test]
    fn test_only_busy_is_recoverable() {
        assert!(ConvertError::Busy.is_recoverable());
        assert!(!ConvertError::Timeout(10).is_recoverable());
        assert!(!ConvertError::Document("bad".into()).is_recoverable());
    }

    #[test]
    fn test_user_message_is_generic() {
        assert_eq!(
            ConvertError::tool("ffmpeg", "Unknown encoder 'libx264'").user_message("video"),
            "❌ Error during video conversion!"
        );
        assert_eq!(
            ConvertError::unsupported(".pdf", "mp4").user_message("document"),
            "❌ Error during document conversion!"
        );
        assert!(ConvertError::Busy.user_message("image").starts_with("⏳"));
        assert!(ConvertError::Busy.is_retryable());
    }

    #[test]
    fn test_display_carries_pair() {
        let err = ConvertError::unsupported(".pdf", "mp4");
        assert_eq!(err.to_string(), "Unsupported conversion: .pdf to mp4");
    }

    #[test]
    fn test_io_conversion() {
        let err: ConvertError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, ConvertError::Io(_)));
        assert_eq!(err.log_level(), LogLevel::Error);
    }
}
