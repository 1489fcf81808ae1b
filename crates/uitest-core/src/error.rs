//! Error types for uitest.

use thiserror::Error;

/// Main error type for uitest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or contradictory parameters
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Well-formed region that selects no pixels of a frame
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// Source file does not exist
    #[error("No such file: {0}")]
    NotFound(String),

    /// Image decoding or encoding failed
    #[error("Image error: {0}")]
    Image(String),

    /// Operation needs a device under test but none is configured
    #[error("{0} isn't configured to run on your hardware")]
    NotConfigured(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error reports a missing file.
    ///
    /// Covers both [`Error::NotFound`] and IO errors of kind `NotFound`.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_arguments_error() {
        let err = Error::InvalidArguments("x, width and right disagree".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid arguments: x, width and right disagree"
        );
    }

    #[test]
    fn test_invalid_region_error() {
        let err = Error::InvalidRegion("outside frame".to_string());
        assert_eq!(err.to_string(), "Invalid region: outside frame");
    }

    #[test]
    fn test_not_found_error() {
        let err = Error::NotFound("idontexist.png".to_string());
        assert_eq!(err.to_string(), "No such file: idontexist.png");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_not_configured_error() {
        let err = Error::NotConfigured("press".to_string());
        assert_eq!(
            err.to_string(),
            "press isn't configured to run on your hardware"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_config_error() {
        let err = Error::Config("wait.timeout_secs must be >= 0".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: wait.timeout_secs must be >= 0"
        );
    }

    #[test]
    fn test_other_error() {
        let err = Error::Other("unknown error".to_string());
        assert_eq!(err.to_string(), "unknown error");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_not_found());
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_debug() {
        let err = Error::InvalidRegion("test".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("InvalidRegion"));
    }
}
