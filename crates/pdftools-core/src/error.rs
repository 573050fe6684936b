use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PdfToolsError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("At least 2 documents are required, found {found}")]
    NotEnoughDocuments { found: usize },

    #[error("Select at least one valid page and a rotation direction")]
    NothingToRotate,

    #[error("Index {index} out of bounds (length: {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Threshold {0} must be between 0 and 255")]
    InvalidThreshold(i64),

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("File size must be less than {} MB", .max_bytes / (1024 * 1024))]
    FileTooLarge { size: u64, max_bytes: u64 },

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("{0}")]
    Conversion(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Another {0} request is already in progress")]
    Busy(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PdfToolsError {
    /// Whether the error was raised before any work started (bad input)
    /// rather than by the codec or the network.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PdfToolsError::InvalidRange(_)
                | PdfToolsError::NotEnoughDocuments { .. }
                | PdfToolsError::NothingToRotate
                | PdfToolsError::IndexOutOfBounds { .. }
                | PdfToolsError::InvalidThreshold(_)
                | PdfToolsError::UnsupportedFile(_)
                | PdfToolsError::FileTooLarge { .. }
                | PdfToolsError::Busy(_)
                | PdfToolsError::InvalidConfig(_)
        )
    }

    /// Message to show in the UI. Validation errors are shown verbatim,
    /// codec and network faults collapse to a generic failure line.
    pub fn user_message(&self) -> String {
        match self {
            PdfToolsError::Conversion(msg) => msg.clone(),
            e if e.is_validation() => e.to_string(),
            e => format!("Operation failed. Please try again. ({})", e),
        }
    }
}

impl From<lopdf::Error> for PdfToolsError {
    fn from(e: lopdf::Error) -> Self {
        PdfToolsError::OperationError(e.to_string())
    }
}

impl From<serde_json::Error> for PdfToolsError {
    fn from(e: serde_json::Error) -> Self {
        PdfToolsError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_too_large_message_uses_megabytes() {
        let err = PdfToolsError::FileTooLarge {
            size: 11 * 1024 * 1024,
            max_bytes: 10 * 1024 * 1024,
        };
        assert_eq!(err.to_string(), "File size must be less than 10 MB");
    }

    #[test]
    fn test_user_message_hides_codec_faults() {
        let err = PdfToolsError::ParseError("bad xref".into());
        assert!(err.user_message().starts_with("Operation failed"));

        let err = PdfToolsError::NotEnoughDocuments { found: 1 };
        assert_eq!(
            err.user_message(),
            "At least 2 documents are required, found 1"
        );
    }

    #[test]
    fn test_conversion_error_is_shown_verbatim() {
        let err = PdfToolsError::Conversion("Unsupported slide layout".into());
        assert_eq!(err.user_message(), "Unsupported slide layout");
    }
}
