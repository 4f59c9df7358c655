//! Error types for the sticker generator library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the sticker generator library
#[derive(Error, Debug)]
pub enum Error {
    /// A required field is missing or blank
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The sticker image could not be read or decoded
    #[error("Sticker image unavailable at {}: {reason}", .path.display())]
    ImageMissing { path: PathBuf, reason: String },

    /// The output document could not be written
    #[error("Cannot write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Font file could not be parsed
    #[error("Font error: {0}")]
    Font(String),

    /// Fiscal year string could not be parsed
    #[error("Invalid fiscal year: {0}")]
    InvalidFiscalYear(String),

    /// Zip container error while packaging or reading a document
    #[error("Package error: {0}")]
    Package(#[from] zip::result::ZipError),

    /// Malformed document XML
    #[error("XML error: {0}")]
    Xml(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(err.to_string())
    }
}

impl Error {
    /// Whether the user can fix this by changing their input or destination
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::WriteFailure { .. } | Error::InvalidFiscalYear(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_failure_message_names_path() {
        let err = Error::WriteFailure {
            path: PathBuf::from("/no/such/dir/out.docx"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/no/such/dir/out.docx"));
        assert!(err.is_user_correctable());
    }

    #[test]
    fn test_image_missing_is_not_user_correctable() {
        let err = Error::ImageMissing {
            path: PathBuf::from("sticker.png"),
            reason: "not found".to_string(),
        };
        assert!(!err.is_user_correctable());
        assert!(err.to_string().contains("sticker.png"));
    }
}
