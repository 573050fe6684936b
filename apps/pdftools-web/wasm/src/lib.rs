//! WASM bindings for PDF Tools
//!
//! Each tool page gets a session object that keeps its state in Rust.
//! JavaScript only handles DOM events, file reading and pdf.js rendering.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { PdfToolsSession, SessionMode } from './pkg/pdftools_wasm.js';
//!
//! await init();
//!
//! const session = new PdfToolsSession(SessionMode.Merge);
//! session.addDocument("a.pdf", bytesA);
//! session.addDocument("b.pdf", bytesB);
//! session.moveDocument(1, 0);
//! const merged = session.executeMerge();
//! ```

pub mod download;
pub mod images;
pub mod preview;
pub mod remote;
pub mod rotate;
pub mod session;
pub mod shade;
pub mod shell;

#[cfg(test)]
mod test_support;

use pdftools_core::{info, tools, PdfToolsError, ToolsConfig};
use serde::Serialize;
use std::cell::Cell;
use wasm_bindgen::prelude::*;

pub use download::DownloadLink;
pub use images::ImageSession;
pub use preview::PreviewNavigator;
pub use remote::{OcrSearchSession, RemoteConverter};
pub use rotate::RotateSession;
pub use session::{PdfToolsSession, SessionMode};
pub use shade::ShadeSession;
pub use shell::ToolShell;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Header and `%%EOF` check without parsing
#[wasm_bindgen(js_name = quickValidate)]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    info::quick_validate(bytes).map_err(js_error)
}

#[wasm_bindgen(js_name = getPdfInfo)]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = info::validate_pdf(bytes).map_err(js_error)?;
    to_js(&info)
}

#[wasm_bindgen(js_name = getPageCount)]
pub fn get_page_count(bytes: &[u8]) -> Result<u32, JsValue> {
    info::get_page_count(bytes).map_err(js_error)
}

/// Cards for the dashboard, in display order
#[wasm_bindgen(js_name = getDashboardCards)]
pub fn get_dashboard_cards() -> Result<JsValue, JsValue> {
    to_js(&tools::dashboard_cards())
}

/// Default settings, for pages that want to show or tweak them
#[wasm_bindgen(js_name = getDefaultConfig)]
pub fn get_default_config() -> Result<JsValue, JsValue> {
    to_js(&ToolsConfig::default())
}

/// Format bytes as human-readable string
#[wasm_bindgen(js_name = formatBytes)]
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

/// Read an optional config object handed over from JS
pub(crate) fn config_from_js(value: JsValue) -> Result<ToolsConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(ToolsConfig::default());
    }
    let config: ToolsConfig = serde_wasm_bindgen::from_value(value)
        .map_err(|e| js_error(PdfToolsError::InvalidConfig(e.to_string())))?;
    config.validate().map_err(js_error)?;
    Ok(config)
}

pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Log a failure to the console and turn it into the message shown to the user
pub(crate) fn js_error(e: PdfToolsError) -> JsValue {
    if !e.is_validation() {
        web_sys::console::error_1(&format!("PDF Tools: {}", e).into());
    }
    JsValue::from_str(&e.user_message())
}

pub(crate) fn to_uint8_array(bytes: &[u8]) -> js_sys::Uint8Array {
    let array = js_sys::Uint8Array::new_with_length(bytes.len() as u32);
    array.copy_from(bytes);
    array
}

/// Marks a tool as working. A second request while the first is running is
/// refused; the flag clears when the guard drops, on success or failure.
pub(crate) struct BusyGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> BusyGuard<'a> {
    pub(crate) fn acquire(flag: &'a Cell<bool>, what: &str) -> Result<Self, PdfToolsError> {
        if flag.replace(true) {
            return Err(PdfToolsError::Busy(what.to_string()));
        }
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
