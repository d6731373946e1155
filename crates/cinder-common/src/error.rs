//! Error types for CinderDB.

use thiserror::Error;

/// Result type alias using CinderError.
pub type Result<T> = std::result::Result<T, CinderError>;

/// Errors that can occur in CinderDB operations.
#[derive(Debug, Error)]
pub enum CinderError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Buffer pool errors
    #[error("Buffer pool exhausted, every frame is pinned")]
    PoolExhausted,

    #[error("Page not found: {page_id}")]
    PageNotFound { page_id: i32 },

    // Replacer errors
    #[error("Frame id out of range: {frame_id}")]
    InvalidFrame { frame_id: u32 },

    #[error("Frame is not evictable: {frame_id}")]
    FrameNotEvictable { frame_id: u32 },

    // Page codec errors
    #[error("Page corrupted: {page_id}, reason: {reason}")]
    PageCorrupted { page_id: i32, reason: String },

    // Configuration errors
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter { name: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_io_error_conversion() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: CinderError = io_err.into();
        assert!(matches!(err, CinderError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_pool_exhausted_display() {
        let err = CinderError::PoolExhausted;
        assert_eq!(
            err.to_string(),
            "Buffer pool exhausted, every frame is pinned"
        );
    }

    #[test]
    fn test_page_not_found_display() {
        let err = CinderError::PageNotFound { page_id: 42 };
        assert_eq!(err.to_string(), "Page not found: 42");
    }

    #[test]
    fn test_replacer_errors_display() {
        let err = CinderError::InvalidFrame { frame_id: 100 };
        assert_eq!(err.to_string(), "Frame id out of range: 100");

        let err = CinderError::FrameNotEvictable { frame_id: 3 };
        assert_eq!(err.to_string(), "Frame is not evictable: 3");
    }

    #[test]
    fn test_page_corrupted_display() {
        let err = CinderError::PageCorrupted {
            page_id: 7,
            reason: "bad node type".to_string(),
        };
        assert_eq!(err.to_string(), "Page corrupted: 7, reason: bad node type");
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = CinderError::InvalidParameter {
            name: "pool_size".to_string(),
            value: "0".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid parameter: pool_size = 0");
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(CinderError::PoolExhausted)
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CinderError>();
    }
}
