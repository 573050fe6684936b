//! Which tool page is showing

use crate::js_error;
use pdftools_core::tools::{Navigation, Tool};
use pdftools_core::PdfToolsError;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
#[derive(Debug, Default)]
pub struct ToolShell {
    navigation: Navigation,
}

#[wasm_bindgen]
impl ToolShell {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slug of the current tool ("dashboard" on the home screen)
    #[wasm_bindgen(getter)]
    pub fn current(&self) -> String {
        self.navigation.current().slug().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn title(&self) -> String {
        self.navigation.current().title().to_string()
    }

    #[wasm_bindgen(getter, js_name = isDashboard)]
    pub fn is_dashboard(&self) -> bool {
        self.navigation.is_dashboard()
    }

    pub fn open(&mut self, slug: &str) -> Result<(), JsValue> {
        self.open_internal(slug).map_err(js_error)
    }

    pub fn back(&mut self) {
        self.navigation.back();
    }

    /// Accepted file types for the current conversion tool, if it is one
    #[wasm_bindgen(js_name = conversionAccept)]
    pub fn conversion_accept(&self) -> Option<String> {
        self.navigation.current().conversion().map(|kind| kind.accept())
    }
}

impl ToolShell {
    fn open_internal(&mut self, slug: &str) -> Result<(), PdfToolsError> {
        let tool = Tool::from_slug(slug)
            .ok_or_else(|| PdfToolsError::OperationError(format!("Unknown tool: {}", slug)))?;
        self.navigation.open(tool);
        Ok(())
    }
}
