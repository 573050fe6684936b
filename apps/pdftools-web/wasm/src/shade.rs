//! Shade removal session
//!
//! pdf.js renders each page at [`ShadeSession::render_scale`] and hands the
//! RGBA buffers over; Rust binarizes them and builds the output PDF.

use crate::{config_from_js, js_error, to_uint8_array, BusyGuard};
use pdftools_core::raster::{remove_shading, PrerenderedPages, RasterImage, Rasterizer, Threshold};
use pdftools_core::{LopdfCodec, PdfToolsError};
use std::cell::Cell;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct ShadeSession {
    codec: LopdfCodec,
    pages: PrerenderedPages,
    threshold: Threshold,
    render_scale: f32,
    busy: Cell<bool>,
}

#[wasm_bindgen]
impl ShadeSession {
    /// `config` is an optional settings object (see `getDefaultConfig`)
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ShadeSession, JsValue> {
        let config = config_from_js(config)?;
        let threshold = config.threshold().map_err(js_error)?;
        Ok(Self::with_settings(threshold, config.render_scale))
    }

    /// Scale pages should be rendered at
    #[wasm_bindgen(getter, js_name = renderScale)]
    pub fn render_scale(&self) -> f32 {
        self.render_scale
    }

    #[wasm_bindgen(getter)]
    pub fn threshold(&self) -> u8 {
        self.threshold.value()
    }

    #[wasm_bindgen(js_name = setThreshold)]
    pub fn set_threshold(&mut self, value: i32) -> Result<(), JsValue> {
        self.threshold = Threshold::new(value as i64).map_err(js_error)?;
        Ok(())
    }

    /// Hand over one rendered page (canvas `ImageData.data`)
    #[wasm_bindgen(js_name = pushPage)]
    pub fn push_page(&mut self, width: u32, height: u32, rgba: Vec<u8>) -> Result<usize, JsValue> {
        self.push_page_internal(width, height, rgba).map_err(js_error)
    }

    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> usize {
        self.pages.page_count()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    /// Binarize every pushed page into a new PDF
    pub fn execute(&self) -> Result<js_sys::Uint8Array, JsValue> {
        let bytes = self.execute_internal().map_err(js_error)?;
        Ok(to_uint8_array(&bytes))
    }
}

impl ShadeSession {
    fn with_settings(threshold: Threshold, render_scale: f32) -> Self {
        Self {
            codec: LopdfCodec::new(),
            pages: PrerenderedPages::new(),
            threshold,
            render_scale,
            busy: Cell::new(false),
        }
    }

    fn push_page_internal(&mut self, width: u32, height: u32, rgba: Vec<u8>) -> Result<usize, PdfToolsError> {
        self.pages.push(RasterImage::new(width, height, rgba)?);
        Ok(self.pages.page_count())
    }

    fn execute_internal(&self) -> Result<Vec<u8>, PdfToolsError> {
        let _busy = BusyGuard::acquire(&self.busy, "shade removal")?;
        remove_shading(&self.pages, &self.codec, self.threshold, self.render_scale)
    }
}
