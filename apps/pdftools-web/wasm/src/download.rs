//! Object URL for the latest result of a tool

use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, Url};

pub const PDF_MIME: &str = "application/pdf";

/// Holds at most one object URL; setting a new one revokes the old one.
#[wasm_bindgen]
#[derive(Debug, Default)]
pub struct DownloadLink {
    url: Option<String>,
}

#[wasm_bindgen]
impl DownloadLink {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `bytes` in a Blob and return its URL. `mime` defaults to PDF.
    pub fn set(&mut self, bytes: &[u8], mime: Option<String>) -> Result<String, JsValue> {
        let parts = js_sys::Array::new();
        parts.push(&crate::to_uint8_array(bytes));

        let options = BlobPropertyBag::new();
        options.set_type(mime.as_deref().unwrap_or(PDF_MIME));
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;

        let url = Url::create_object_url_with_blob(&blob)?;
        self.revoke();
        self.url = Some(url.clone());
        Ok(url)
    }

    #[wasm_bindgen(getter)]
    pub fn url(&self) -> Option<String> {
        self.url.clone()
    }

    pub fn revoke(&mut self) {
        if let Some(url) = self.url.take() {
            if let Err(e) = Url::revoke_object_url(&url) {
                web_sys::console::warn_1(&e);
            }
        }
    }
}

impl Drop for DownloadLink {
    fn drop(&mut self) {
        self.revoke();
    }
}
