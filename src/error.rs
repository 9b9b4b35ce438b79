//! Error types for bucketeer

use thiserror::Error;

/// Result type alias for bucketeer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bucketeer
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors (file system operations)
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Storage backend errors (S3 and S3-compatible services)
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Unknown named target
    #[error("Unknown target '{name}'. Available targets: {available}")]
    UnknownTarget { name: String, available: String },

    /// Required CLI argument missing for the chosen mode
    #[error("{message}")]
    MissingArgument { message: String },

    /// Multipart upload error
    #[error("Multipart upload error: {message}")]
    MultipartUpload { message: String },

    /// Archive (zip) creation error
    #[error("Archive error: {message}")]
    Archive { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing-argument error
    pub fn missing_argument(message: impl Into<String>) -> Self {
        Self::MissingArgument {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Config {
            message: format!("JSON parse error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_error_display_carries_context() {
        let err = Error::MultipartUpload {
            message: "no ETag returned for part (upload abc123)".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("Multipart upload error"));
        assert!(rendered.contains("abc123"));
    }
}
