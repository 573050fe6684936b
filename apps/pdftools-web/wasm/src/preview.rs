//! Page navigation for the PDF to image preview. pdf.js draws the page,
//! this tracks which one.

use wasm_bindgen::prelude::*;

/// Scale the preview canvas is rendered at
pub const PREVIEW_RENDER_SCALE: f32 = 1.5;

#[wasm_bindgen]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewNavigator {
    page_count: u32,
    current: u32,
}

#[wasm_bindgen]
impl PreviewNavigator {
    /// Starts on page 1 (or 0 for an empty document)
    #[wasm_bindgen(constructor)]
    pub fn new(page_count: u32) -> Self {
        Self {
            page_count,
            current: page_count.min(1),
        }
    }

    #[wasm_bindgen(getter, js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// 1-based page on screen
    #[wasm_bindgen(getter)]
    pub fn current(&self) -> u32 {
        self.current
    }

    #[wasm_bindgen(getter, js_name = renderScale)]
    pub fn render_scale(&self) -> f32 {
        PREVIEW_RENDER_SCALE
    }

    /// Returns false when already on the last page
    pub fn next(&mut self) -> bool {
        self.go_to(self.current + 1)
    }

    /// Returns false when already on the first page
    pub fn previous(&mut self) -> bool {
        self.current > 1 && self.go_to(self.current - 1)
    }

    /// Jump to a page; anything outside `1..=pageCount` is ignored
    #[wasm_bindgen(js_name = goTo)]
    pub fn go_to(&mut self, page: u32) -> bool {
        if !(1..=self.page_count).contains(&page) {
            return false;
        }
        self.current = page;
        true
    }

    #[wasm_bindgen(js_name = hasNext)]
    pub fn has_next(&self) -> bool {
        self.current < self.page_count
    }

    #[wasm_bindgen(js_name = hasPrevious)]
    pub fn has_previous(&self) -> bool {
        self.current > 1
    }
}
