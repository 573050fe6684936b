//! Contracts of the remote conversion and OCR services.
//!
//! The HTTP calls themselves live in the browser adapter; this module owns
//! upload validation, endpoint paths and response decoding.

use crate::error::PdfToolsError;
use serde::{Deserialize, Serialize};

/// File name given to every converted document
pub const CONVERTED_FILE_NAME: &str = "converted.pdf";

/// Path of the OCR text extraction endpoint
pub const EXTRACT_TEXT_PATH: &str = "/extract-text";

const FALLBACK_ERROR: &str = "Conversion failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionKind {
    Excel,
    PowerPoint,
    Notebook,
}

impl ConversionKind {
    pub fn endpoint_path(self) -> &'static str {
        match self {
            ConversionKind::Excel => "/convert/excel-to-pdf",
            ConversionKind::PowerPoint => "/convert/ppt-to-pdf",
            ConversionKind::Notebook => "/convert/ipynb-to-pdf",
        }
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ConversionKind::Excel => &["xlsx"],
            ConversionKind::PowerPoint => &["ppt", "pptx"],
            ConversionKind::Notebook => &["ipynb"],
        }
    }

    pub fn mime_types(self) -> &'static [&'static str] {
        match self {
            ConversionKind::Excel => {
                &["application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"]
            }
            ConversionKind::PowerPoint => &[
                "application/vnd.ms-powerpoint",
                "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            ],
            // Browsers report no reliable MIME type for notebooks
            ConversionKind::Notebook => &[],
        }
    }

    /// Value for a file input's `accept` attribute
    pub fn accept(self) -> String {
        self.extensions()
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn accepts(self, file_name: &str, mime: &str) -> bool {
        if self.mime_types().contains(&mime) {
            return true;
        }
        file_name
            .rsplit_once('.')
            .map(|(_, ext)| {
                let ext = ext.to_ascii_lowercase();
                self.extensions().contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    fn type_hint(self) -> &'static str {
        match self {
            ConversionKind::Excel => "Please upload a valid .xlsx file",
            ConversionKind::PowerPoint => "Please upload a valid .ppt or .pptx file",
            ConversionKind::Notebook => "Please upload a valid .ipynb file",
        }
    }
}

/// Check a picked file before uploading: type first, then size
pub fn validate_upload(
    kind: ConversionKind,
    file_name: &str,
    mime: &str,
    size: u64,
    max_bytes: u64,
) -> Result<(), PdfToolsError> {
    if !kind.accepts(file_name, mime) {
        return Err(PdfToolsError::UnsupportedFile(kind.type_hint().into()));
    }
    if size > max_bytes {
        return Err(PdfToolsError::FileTooLarge { size, max_bytes });
    }
    Ok(())
}

/// Full endpoint URL for a base URL and path
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Extract the message from a failed conversion response
pub fn parse_error_body(body: &[u8]) -> PdfToolsError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_ERROR.to_string());
    PdfToolsError::Conversion(message)
}

/// Text recognized on one page, as returned by the OCR service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub page: u32,
    pub text: String,
}

pub fn parse_page_texts(body: &[u8]) -> Result<Vec<PageText>, PdfToolsError> {
    Ok(serde_json::from_slice(body)?)
}

/// First page whose text contains `query`, ignoring case
pub fn search_pages(pages: &[PageText], query: &str) -> Option<u32> {
    if query.is_empty() {
        return None;
    }
    let needle = query.to_lowercase();
    pages
        .iter()
        .find(|p| p.text.to_lowercase().contains(&needle))
        .map(|p| p.page)
}
