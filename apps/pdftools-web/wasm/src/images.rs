//! Images to PDF session

use crate::{js_error, to_js, to_uint8_array, BusyGuard};
use js_sys::{Object, Reflect};
use pdftools_core::images::{images_to_pdf, ImageFile, ImagesToPdf};
use pdftools_core::{DocumentSet, LopdfCodec, PdfToolsError};
use serde::Serialize;
use std::cell::Cell;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct ImageEntryJs {
    name: String,
    mime: String,
    size_bytes: usize,
}

#[wasm_bindgen]
pub struct ImageSession {
    codec: LopdfCodec,
    images: DocumentSet<ImageFile>,
    busy: Cell<bool>,
}

impl Default for ImageSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl ImageSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            codec: LopdfCodec::new(),
            images: DocumentSet::new(),
            busy: Cell::new(false),
        }
    }

    #[wasm_bindgen(js_name = addImage)]
    pub fn add_image(&mut self, name: &str, mime: &str, bytes: Vec<u8>) -> usize {
        self.images.push(ImageFile {
            name: name.to_string(),
            mime: mime.to_string(),
            bytes,
        });
        self.images.len()
    }

    /// Forget the current selection (a new pick replaces it)
    pub fn clear(&mut self) {
        self.images.clear();
    }

    #[wasm_bindgen(js_name = moveImage)]
    pub fn move_image(&mut self, from: usize, to: usize) -> Result<(), JsValue> {
        self.images.move_file(from, to).map_err(js_error)
    }

    #[wasm_bindgen(js_name = removeImage)]
    pub fn remove_image(&mut self, index: usize) -> Result<(), JsValue> {
        self.images.remove_file(index).map(|_| ()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = reverseImages)]
    pub fn reverse_images(&mut self) {
        self.images.reverse_files();
    }

    #[wasm_bindgen(js_name = getImageCount)]
    pub fn get_image_count(&self) -> usize {
        self.images.len()
    }

    #[wasm_bindgen(js_name = getImages)]
    pub fn get_images(&self) -> Result<JsValue, JsValue> {
        let entries: Vec<ImageEntryJs> = self
            .images
            .iter()
            .map(|f| ImageEntryJs {
                name: f.name.clone(),
                mime: f.mime.clone(),
                size_bytes: f.bytes.len(),
            })
            .collect();
        to_js(&entries)
    }

    /// Returns `{ data, pageCount, skipped }`; `skipped` lists files that
    /// were not PNG or JPEG.
    pub fn convert(&self) -> Result<JsValue, JsValue> {
        let result = self.convert_internal().map_err(js_error)?;

        let obj = Object::new();
        Reflect::set(&obj, &"data".into(), &to_uint8_array(&result.pdf))?;
        Reflect::set(&obj, &"pageCount".into(), &(result.page_count as u32).into())?;
        Reflect::set(&obj, &"skipped".into(), &to_js(&result.skipped)?)?;
        Ok(obj.into())
    }
}

impl ImageSession {
    fn convert_internal(&self) -> Result<ImagesToPdf, PdfToolsError> {
        let _busy = BusyGuard::acquire(&self.busy, "image conversion")?;
        let files = self.images.snapshot();
        images_to_pdf(&self.codec, &files)
    }
}
