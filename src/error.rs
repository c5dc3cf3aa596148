//! Error types for document loading and element inspection

use thiserror::Error;

/// Result type alias for inspection operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or querying a document
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load a document
    #[error("Failed to load document: {0}")]
    LoadError(String),

    /// Network error while fetching a page, stylesheet or frame
    #[error("Network error: {0}")]
    NetworkError(String),

    /// A selector could not be parsed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "fetch")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(err: &Error) -> &'static str {
        match err {
            Error::LoadError(_) => "load",
            Error::NetworkError(_) => "network",
            Error::InvalidSelector(_) => "selector",
            Error::ConfigError(_) => "config",
            Error::Io(_) => "io",
        }
    }

    #[test]
    fn io_errors_convert_and_display() {
        let read = || -> Result<String> { Ok(std::fs::read_to_string("/definitely/not/here.html")?) };
        let err = read().unwrap_err();
        assert_eq!(kind(&err), "io");
        assert!(err.to_string().starts_with("I/O error: "));
    }

    #[test]
    fn messages_name_the_failure() {
        let err = Error::InvalidSelector("p[[".to_string());
        assert_eq!(kind(&err), "selector");
        assert_eq!(err.to_string(), "Invalid selector: p[[");
        assert_eq!(Error::LoadError("x".into()).to_string(), "Failed to load document: x");
    }
}
