//! Remote conversion and OCR search
//!
//! Office documents and notebooks are converted by an HTTP service; scanned
//! PDFs are sent to an OCR service whose page texts are then searched locally.

use crate::{config_from_js, js_error, to_js, to_uint8_array, BusyGuard};
use pdftools_core::convert::{
    self, ConversionKind, PageText, CONVERTED_FILE_NAME, EXTRACT_TEXT_PATH,
};
use pdftools_core::tools::Tool;
use pdftools_core::{PdfToolsError, ToolsConfig};
use std::cell::{Cell, RefCell};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FormData, Request, RequestInit, RequestMode, Response};

/// Turn a rejected JS promise or failed binding call into a network fault
fn network_error(e: JsValue) -> PdfToolsError {
    PdfToolsError::Network(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

/// POST `file` as multipart field `file` and read the whole response body.
/// Non-2xx responses are decoded as `{ error }`.
async fn post_file(url: &str, file: &File) -> Result<Vec<u8>, PdfToolsError> {
    let window = web_sys::window().ok_or_else(|| PdfToolsError::Network("No window".into()))?;

    let form = FormData::new().map_err(network_error)?;
    form.append_with_blob_and_filename("file", file, &file.name())
        .map_err(network_error)?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::Cors);
    opts.set_body(&form);

    let request = Request::new_with_str_and_init(url, &opts).map_err(network_error)?;
    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(network_error)?;
    let response: Response = response.dyn_into().map_err(network_error)?;

    let buffer = JsFuture::from(response.array_buffer().map_err(network_error)?)
        .await
        .map_err(network_error)?;
    let body = js_sys::Uint8Array::new(&buffer).to_vec();

    if !response.ok() {
        web_sys::console::warn_1(&format!("{} returned {}", url, response.status()).into());
        return Err(convert::parse_error_body(&body));
    }
    Ok(body)
}

/// Excel, PowerPoint or notebook to PDF through the conversion service
#[wasm_bindgen]
pub struct RemoteConverter {
    kind: ConversionKind,
    config: ToolsConfig,
    busy: Cell<bool>,
}

#[wasm_bindgen]
impl RemoteConverter {
    /// `tool` is the slug of a conversion tool, e.g. "excel-to-pdf"
    #[wasm_bindgen(constructor)]
    pub fn new(tool: &str, config: JsValue) -> Result<RemoteConverter, JsValue> {
        let kind = Tool::from_slug(tool)
            .and_then(Tool::conversion)
            .ok_or_else(|| {
                js_error(PdfToolsError::OperationError(format!(
                    "Not a conversion tool: {}",
                    tool
                )))
            })?;
        Ok(Self::with_config(kind, config_from_js(config)?))
    }

    /// Value for the file input's `accept` attribute
    #[wasm_bindgen(getter)]
    pub fn accept(&self) -> String {
        self.kind.accept()
    }

    #[wasm_bindgen(getter, js_name = outputName)]
    pub fn output_name(&self) -> String {
        CONVERTED_FILE_NAME.to_string()
    }

    #[wasm_bindgen(getter, js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Check a picked file before it is uploaded
    #[wasm_bindgen(js_name = validateFile)]
    pub fn validate_file(&self, name: &str, mime: &str, size: f64) -> Result<(), JsValue> {
        self.validate_internal(name, mime, size as u64)
            .map_err(js_error)
    }

    /// Upload the file and return the converted PDF
    pub async fn convert(&self, file: File) -> Result<js_sys::Uint8Array, JsValue> {
        let bytes = self.convert_internal(&file).await.map_err(js_error)?;
        Ok(to_uint8_array(&bytes))
    }
}

impl RemoteConverter {
    fn with_config(kind: ConversionKind, config: ToolsConfig) -> Self {
        Self {
            kind,
            config,
            busy: Cell::new(false),
        }
    }

    fn validate_internal(&self, name: &str, mime: &str, size: u64) -> Result<(), PdfToolsError> {
        convert::validate_upload(self.kind, name, mime, size, self.config.max_upload_bytes)
    }

    fn endpoint(&self) -> String {
        convert::endpoint_url(&self.config.conversion_base_url, self.kind.endpoint_path())
    }

    async fn convert_internal(&self, file: &File) -> Result<Vec<u8>, PdfToolsError> {
        let _busy = BusyGuard::acquire(&self.busy, "conversion")?;
        self.validate_internal(&file.name(), &file.type_(), file.size() as u64)?;

        let pdf = post_file(&self.endpoint(), file).await?;
        web_sys::console::log_1(&format!("Converted {} ({} bytes)", file.name(), pdf.len()).into());
        Ok(pdf)
    }
}

/// Text search over a scanned PDF
#[wasm_bindgen]
pub struct OcrSearchSession {
    config: ToolsConfig,
    pages: RefCell<Vec<PageText>>,
    busy: Cell<bool>,
}

#[wasm_bindgen]
impl OcrSearchSession {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<OcrSearchSession, JsValue> {
        Ok(Self::with_config(config_from_js(config)?))
    }

    /// Send the PDF to the OCR service; returns the number of pages read
    #[wasm_bindgen(js_name = extractText)]
    pub async fn extract_text(&self, file: File) -> Result<usize, JsValue> {
        let pages = self.fetch_pages(&file).await.map_err(js_error)?;
        Ok(self.set_pages(pages))
    }

    #[wasm_bindgen(js_name = getPages)]
    pub fn get_pages(&self) -> Result<JsValue, JsValue> {
        to_js(&*self.pages.borrow())
    }

    /// 1-based page of the first match, if any
    pub fn search(&self, query: &str) -> Option<u32> {
        convert::search_pages(&self.pages.borrow(), query)
    }

    pub fn clear(&self) {
        self.pages.borrow_mut().clear();
    }
}

impl OcrSearchSession {
    fn with_config(config: ToolsConfig) -> Self {
        Self {
            config,
            pages: RefCell::new(Vec::new()),
            busy: Cell::new(false),
        }
    }

    fn set_pages(&self, pages: Vec<PageText>) -> usize {
        let count = pages.len();
        *self.pages.borrow_mut() = pages;
        count
    }

    async fn fetch_pages(&self, file: &File) -> Result<Vec<PageText>, PdfToolsError> {
        let _busy = BusyGuard::acquire(&self.busy, "text extraction")?;
        let url = convert::endpoint_url(&self.config.ocr_base_url, EXTRACT_TEXT_PATH);
        let body = post_file(&url, file).await?;
        convert::parse_page_texts(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u32, text: &str) -> PageText {
        PageText {
            page,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_converter_validates_type_before_size() {
        let converter = RemoteConverter::with_config(ConversionKind::Excel, ToolsConfig::default());
        let too_big = 11 * 1024 * 1024;

        assert!(matches!(
            converter.validate_internal("deck.pptx", "", 10),
            Err(PdfToolsError::UnsupportedFile(_))
        ));
        assert!(matches!(
            converter.validate_internal("sheet.xlsx", "", too_big),
            Err(PdfToolsError::FileTooLarge { .. })
        ));
        assert!(converter.validate_internal("sheet.xlsx", "", 1024).is_ok());
    }

    #[test]
    fn test_converter_endpoint_uses_config() {
        let config = ToolsConfig {
            conversion_base_url: "http://localhost:8080/".into(),
            ..ToolsConfig::default()
        };
        let converter = RemoteConverter::with_config(ConversionKind::Notebook, config);
        assert_eq!(converter.endpoint(), "http://localhost:8080/convert/ipynb-to-pdf");
        assert_eq!(converter.accept(), ".ipynb");
        assert!(!converter.is_busy());
    }

    #[test]
    fn test_search_after_extraction() {
        let session = OcrSearchSession::with_config(ToolsConfig::default());
        assert_eq!(session.search("invoice"), None);

        let count = session.set_pages(vec![
            page(1, "Cover letter"),
            page(2, "INVOICE #42"),
            page(3, "invoice copy"),
        ]);
        assert_eq!(count, 3);
        assert_eq!(session.search("invoice"), Some(2));
        assert_eq!(session.search("receipt"), None);

        session.clear();
        assert_eq!(session.search("invoice"), None);
    }
}
