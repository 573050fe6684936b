//! File checks and per-page information shown when a PDF is added

use crate::codec::{resolved_page_dict, LopdfCodec, LopdfHandle, PdfCodec};
use crate::error::PdfToolsError;
use crate::model::Rotation;
use lopdf::Object;
use serde::Serialize;

/// Bytes scanned from the end of the file for the `%%EOF` marker
const EOF_SCAN_WINDOW: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct PdfInfo {
    pub page_count: u32,
    /// Version from the header (e.g. "1.7")
    pub version: String,
    pub encrypted: bool,
    pub size_bytes: usize,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Cheap structural check: header and end-of-file marker only
pub fn quick_validate(bytes: &[u8]) -> Result<(), PdfToolsError> {
    check_header(bytes)?;

    let tail = &bytes[bytes.len().saturating_sub(EOF_SCAN_WINDOW)..];
    if !tail.windows(5).any(|w| w == b"%%EOF") {
        return Err(PdfToolsError::ParseError(
            "PDF appears truncated (missing %%EOF marker)".into(),
        ));
    }
    Ok(())
}

/// Full parse; reports metadata or why the file cannot be used
pub fn validate_pdf(bytes: &[u8]) -> Result<PdfInfo, PdfToolsError> {
    check_header(bytes)?;

    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| PdfToolsError::ParseError(e.to_string()))?;

    info_from_document(&document, document.get_pages().len(), bytes)
}

/// Metadata of a file already loaded by [`LopdfCodec`]
pub fn describe(handle: &LopdfHandle, bytes: &[u8]) -> Result<PdfInfo, PdfToolsError> {
    check_header(bytes)?;
    info_from_document(handle.document(), handle.page_ids().len(), bytes)
}

fn info_from_document(
    document: &lopdf::Document,
    page_count: usize,
    bytes: &[u8],
) -> Result<PdfInfo, PdfToolsError> {
    if page_count == 0 {
        return Err(PdfToolsError::ParseError("PDF has no pages".into()));
    }

    let (title, author) = info_strings(document);
    Ok(PdfInfo {
        page_count: page_count as u32,
        version: header_version(bytes),
        encrypted: document.is_encrypted(),
        size_bytes: bytes.len(),
        title,
        author,
    })
}

/// Page count without building a document
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PdfToolsError> {
    let handle = LopdfCodec::new().load(bytes)?;
    Ok(handle.page_ids().len() as u32)
}

fn check_header(bytes: &[u8]) -> Result<(), PdfToolsError> {
    if bytes.len() < 8 {
        return Err(PdfToolsError::UnsupportedFile(
            "File too small to be a valid PDF".into(),
        ));
    }
    if !bytes.starts_with(b"%PDF-") {
        return Err(PdfToolsError::UnsupportedFile(
            "Not a valid PDF file (missing %PDF- header)".into(),
        ));
    }
    Ok(())
}

fn header_version(bytes: &[u8]) -> String {
    std::str::from_utf8(&bytes[5..8])
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|_| "1.4".to_string())
}

fn info_strings(document: &lopdf::Document) -> (Option<String>, Option<String>) {
    let Ok(info) = document
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .and_then(|id| document.get_object(id))
        .and_then(Object::as_dict)
    else {
        return (None, None);
    };

    (info_text(info, b"Title"), info_text(info, b"Author"))
}

fn info_text(info: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    info.get(key)
        .and_then(Object::as_str)
        .ok()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum PageOrientation {
    Portrait,
    Landscape,
    Square,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    /// 1-based page number
    pub page_num: u32,
    /// Width in points, before rotation
    pub width: f32,
    pub height: f32,
    pub rotation: Rotation,
    pub has_content: bool,
    /// Orientation as displayed, after rotation
    pub orientation: PageOrientation,
}

impl PageInfo {
    pub fn for_page(handle: &LopdfHandle, index: u32) -> Result<Self, PdfToolsError> {
        let page_id = *handle
            .page_ids()
            .get(index as usize)
            .ok_or(PdfToolsError::IndexOutOfBounds {
                index: index as usize,
                len: handle.page_ids().len(),
            })?;
        let dict = resolved_page_dict(handle.document(), page_id)?;

        // US Letter when no MediaBox is found anywhere up the tree
        let [x0, y0, x1, y1] = match dict.get(b"MediaBox").and_then(Object::as_array) {
            Ok(array) => parse_box(array)?,
            Err(_) => [0.0, 0.0, 612.0, 792.0],
        };
        let (width, height) = ((x1 - x0).abs(), (y1 - y0).abs());

        let rotation =
            Rotation::from_degrees(dict.get(b"Rotate").and_then(Object::as_i64).unwrap_or(0));
        let (shown_w, shown_h) = if rotation.degrees() % 180 == 90 {
            (height, width)
        } else {
            (width, height)
        };

        let orientation = if (shown_w - shown_h).abs() < 1.0 {
            PageOrientation::Square
        } else if shown_w > shown_h {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        };

        Ok(Self {
            page_num: index + 1,
            width,
            height,
            rotation,
            has_content: dict.has(b"Contents"),
            orientation,
        })
    }

    pub fn all(handle: &LopdfHandle) -> Result<Vec<Self>, PdfToolsError> {
        (0..handle.page_ids().len() as u32)
            .map(|i| Self::for_page(handle, i))
            .collect()
    }
}

fn parse_box(array: &[Object]) -> Result<[f32; 4], PdfToolsError> {
    if array.len() != 4 {
        return Err(PdfToolsError::ParseError(
            "MediaBox must have 4 elements".into(),
        ));
    }

    let mut result = [0.0; 4];
    for (i, obj) in array.iter().enumerate() {
        result[i] = match obj {
            Object::Integer(n) => *n as f32,
            Object::Real(n) => *n as f32,
            _ => {
                return Err(PdfToolsError::ParseError(format!(
                    "MediaBox element {} is not a number",
                    i
                )))
            }
        };
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_inherited_pdf, create_test_pdf};

    #[test]
    fn test_quick_validate() {
        assert!(quick_validate(b"tiny").is_err());
        assert!(quick_validate(b"not a pdf file").is_err());
        assert!(quick_validate(b"%PDF-1.7\nno end marker").is_err());
        assert!(quick_validate(&create_test_pdf(1, "Q")).is_ok());
    }

    #[test]
    fn test_validate_pdf_reports_pages_and_version() {
        let pdf = create_test_pdf(3, "V");
        let info = validate_pdf(&pdf).unwrap();
        assert_eq!(info.page_count, 3);
        assert_eq!(info.version, "1.7");
        assert!(!info.encrypted);
        assert_eq!(info.size_bytes, pdf.len());
        assert_eq!(info.title, None);
    }

    #[test]
    fn test_validate_pdf_rejects_garbage_body() {
        let err = validate_pdf(b"%PDF-1.7 garbage garbage").unwrap_err();
        assert!(matches!(err, PdfToolsError::ParseError(_)));
    }

    #[test]
    fn test_describe_matches_validate_pdf() {
        let pdf = create_test_pdf(4, "D");
        let handle = LopdfCodec::new().load(&pdf).unwrap();
        assert_eq!(describe(&handle, &pdf).unwrap(), validate_pdf(&pdf).unwrap());
    }

    #[test]
    fn test_get_page_count() {
        assert_eq!(get_page_count(&create_test_pdf(5, "C")).unwrap(), 5);
    }

    #[test]
    fn test_page_info_letter_portrait() {
        let handle = LopdfCodec::new().load(&create_test_pdf(2, "P")).unwrap();
        let pages = PageInfo::all(&handle).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].page_num, 2);
        assert_eq!((pages[0].width, pages[0].height), (612.0, 792.0));
        assert_eq!(pages[0].orientation, PageOrientation::Portrait);
        assert!(pages[0].has_content);
    }

    #[test]
    fn test_page_info_uses_inherited_rotation() {
        let handle = LopdfCodec::new().load(&create_inherited_pdf()).unwrap();
        let page = PageInfo::for_page(&handle, 0).unwrap();

        assert_eq!(page.rotation.degrees(), 90);
        assert_eq!((page.width, page.height), (300.0, 400.0));
        assert_eq!(page.orientation, PageOrientation::Landscape);
    }

    #[test]
    fn test_page_info_out_of_range() {
        let handle = LopdfCodec::new().load(&create_test_pdf(1, "R")).unwrap();
        assert!(PageInfo::for_page(&handle, 1).is_err());
    }
}
