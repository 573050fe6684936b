//! Rotate session
//!
//! Rotations accumulate: every run works on the result of the previous one.

use crate::{js_error, to_js, to_uint8_array, BusyGuard};
use pdftools_core::codec::{self, LopdfCodec, LopdfHandle};
use pdftools_core::{assembly, Document, PdfToolsError, RotationDirection};
use std::cell::Cell;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct RotateSession {
    codec: LopdfCodec,
    document: Option<Document<LopdfHandle>>,
    pages: String,
    direction: Option<RotationDirection>,
    busy: Cell<bool>,
}

impl Default for RotateSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl RotateSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            codec: LopdfCodec::new(),
            document: None,
            pages: String::new(),
            direction: None,
            busy: Cell::new(false),
        }
    }

    /// Load the PDF to rotate; returns its page count
    #[wasm_bindgen(js_name = loadDocument)]
    pub fn load_document(&mut self, bytes: &[u8]) -> Result<usize, JsValue> {
        self.load_internal(bytes).map_err(js_error)
    }

    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> usize {
        self.document.as_ref().map_or(0, Document::page_count)
    }

    /// Comma-separated 1-based page numbers, e.g. "1, 3,5"
    #[wasm_bindgen(js_name = setPages)]
    pub fn set_pages(&mut self, pages: &str) {
        self.pages = pages.to_string();
    }

    /// "left" or "right"; anything else clears the choice
    #[wasm_bindgen(js_name = setDirection)]
    pub fn set_direction(&mut self, direction: &str) {
        self.direction = RotationDirection::parse(direction);
    }

    /// Current angle of every page, in degrees
    #[wasm_bindgen(js_name = getRotations)]
    pub fn get_rotations(&self) -> Result<JsValue, JsValue> {
        to_js(&self.rotations())
    }

    #[wasm_bindgen(js_name = canRotate)]
    pub fn can_rotate(&self) -> bool {
        self.document.is_some() && !self.pages.trim().is_empty() && self.direction.is_some()
    }

    /// Rotate the selected pages and return the updated PDF
    pub fn rotate(&mut self) -> Result<js_sys::Uint8Array, JsValue> {
        let bytes = self.rotate_internal().map_err(js_error)?;
        Ok(to_uint8_array(&bytes))
    }
}

impl RotateSession {
    fn load_internal(&mut self, bytes: &[u8]) -> Result<usize, PdfToolsError> {
        let document = codec::decode(&self.codec, bytes)?;
        let count = document.page_count();
        self.document = Some(document);
        Ok(count)
    }

    fn rotations(&self) -> Vec<u16> {
        self.document
            .as_ref()
            .map(|d| d.pages().iter().map(|p| p.rotation().degrees()).collect())
            .unwrap_or_default()
    }

    fn rotate_internal(&mut self) -> Result<Vec<u8>, PdfToolsError> {
        let _busy = BusyGuard::acquire(&self.busy, "rotate")?;

        let source = self
            .document
            .as_ref()
            .ok_or_else(|| PdfToolsError::OperationError("No document loaded".into()))?;
        let rotated = assembly::rotate_pages(source, &self.pages, self.direction)?;
        let bytes = codec::encode(&self.codec, &rotated)?;

        self.document = Some(rotated);
        Ok(bytes)
    }
}
