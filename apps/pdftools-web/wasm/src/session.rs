//! Merge and split sessions
//!
//! Holds the ordered file list (merge) or the single source and its range
//! rows (split) in Rust memory.

use crate::{js_error, to_js, to_uint8_array, BusyGuard};
use js_sys::{Array, Object, Reflect};
use pdftools_core::codec::{self, LopdfCodec, LopdfHandle, PdfCodec};
use pdftools_core::info::{self, PageInfo, PdfInfo};
use pdftools_core::{assembly, parse_page_selection, parse_range_list};
use pdftools_core::{Document, DocumentSet, PageRange, PdfToolsError};
use serde::Serialize;
use std::cell::Cell;
use wasm_bindgen::prelude::*;

/// File name without one trailing ".pdf", matched in any case
fn file_stem(name: &str) -> &str {
    let cut = name.len().saturating_sub(4);
    match name.get(cut..) {
        Some(ext) if ext.eq_ignore_ascii_case(".pdf") => &name[..cut],
        _ => name,
    }
}

#[derive(Clone)]
struct DocumentEntry {
    name: String,
    info: PdfInfo,
    document: Document<LopdfHandle>,
}

/// One row of the split form: two free-text fields
#[derive(Debug, Clone, Default, Serialize)]
struct RangeRow {
    start: String,
    end: String,
}

/// A finished split part
#[derive(Debug, Clone)]
pub struct SplitOutput {
    pub name: String,
    pub range: PageRange,
    /// Index of the range row that produced this part
    pub row: usize,
    pub bytes: Vec<u8>,
}

#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// One source, several page ranges
    Split,
    /// Several sources, one output
    Merge,
}

#[wasm_bindgen]
pub struct PdfToolsSession {
    mode: SessionMode,
    codec: LopdfCodec,
    documents: DocumentSet<DocumentEntry>,
    ranges: Vec<RangeRow>,
    busy: Cell<bool>,
    progress_callback: Option<js_sys::Function>,
}

#[wasm_bindgen]
impl PdfToolsSession {
    #[wasm_bindgen(constructor)]
    pub fn new(mode: SessionMode) -> Self {
        Self {
            mode,
            codec: LopdfCodec::new(),
            documents: DocumentSet::new(),
            ranges: Vec::new(),
            busy: Cell::new(false),
            progress_callback: None,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Callback signature: (current: number, total: number, message: string) => void
    #[wasm_bindgen(js_name = setProgressCallback)]
    pub fn set_progress_callback(&mut self, callback: js_sys::Function) {
        self.progress_callback = Some(callback);
    }

    #[wasm_bindgen(js_name = addDocument)]
    pub fn add_document(&mut self, name: &str, bytes: &[u8]) -> Result<JsValue, JsValue> {
        let info = self.add_document_internal(name, bytes).map_err(js_error)?;
        to_js(&info)
    }

    #[wasm_bindgen(js_name = removeDocument)]
    pub fn remove_document(&mut self, index: usize) -> Result<(), JsValue> {
        self.documents.remove_file(index).map_err(js_error)?;
        if self.documents.is_empty() {
            self.ranges.clear();
        }
        Ok(())
    }

    /// Drag-and-drop: move the file at `from` to position `to`
    #[wasm_bindgen(js_name = moveDocument)]
    pub fn move_document(&mut self, from: usize, to: usize) -> Result<(), JsValue> {
        self.documents.move_file(from, to).map_err(js_error)
    }

    #[wasm_bindgen(js_name = reverseDocuments)]
    pub fn reverse_documents(&mut self) {
        self.documents.reverse_files();
    }

    /// `new_order` lists current indices in the desired order
    #[wasm_bindgen(js_name = reorderDocuments)]
    pub fn reorder_documents(&mut self, new_order: &[usize]) -> Result<(), JsValue> {
        self.documents.reorder(new_order).map_err(js_error)
    }

    #[wasm_bindgen(js_name = getDocumentInfos)]
    pub fn get_document_infos(&self) -> Result<JsValue, JsValue> {
        let infos: Vec<DocumentInfoJs> = self
            .documents
            .iter()
            .map(|d| DocumentInfoJs {
                name: d.name.clone(),
                page_count: d.info.page_count,
                size_bytes: d.info.size_bytes,
                version: d.info.version.clone(),
            })
            .collect();
        to_js(&infos)
    }

    #[wasm_bindgen(js_name = getPageInfos)]
    pub fn get_page_infos(&self, doc_index: usize) -> Result<JsValue, JsValue> {
        let entry = self.entry(doc_index).map_err(js_error)?;
        let infos = entry
            .document
            .pages()
            .first()
            .map(|page| PageInfo::all(page.source()))
            .transpose()
            .map_err(js_error)?
            .unwrap_or_default();
        to_js(&infos)
    }

    #[wasm_bindgen(js_name = getDocumentCount)]
    pub fn get_document_count(&self) -> usize {
        self.documents.len()
    }

    #[wasm_bindgen(js_name = getTotalPageCount)]
    pub fn get_total_page_count(&self) -> u32 {
        self.documents.iter().map(|d| d.info.page_count).sum()
    }

    /// Append an empty range row
    #[wasm_bindgen(js_name = addRange)]
    pub fn add_range(&mut self) -> usize {
        self.ranges.push(RangeRow::default());
        self.ranges.len() - 1
    }

    #[wasm_bindgen(js_name = setRange)]
    pub fn set_range(&mut self, index: usize, start: &str, end: &str) -> Result<(), JsValue> {
        self.set_range_internal(index, start, end).map_err(js_error)
    }

    #[wasm_bindgen(js_name = removeRange)]
    pub fn remove_range(&mut self, index: usize) -> Result<(), JsValue> {
        if index >= self.ranges.len() {
            return Err(js_error(PdfToolsError::IndexOutOfBounds {
                index,
                len: self.ranges.len(),
            }));
        }
        self.ranges.remove(index);
        Ok(())
    }

    /// Replace all rows from text such as "1-3, 5, 8-10"
    #[wasm_bindgen(js_name = setRangesText)]
    pub fn set_ranges_text(&mut self, text: &str) -> Result<usize, JsValue> {
        self.set_ranges_text_internal(text).map_err(js_error)
    }

    #[wasm_bindgen(js_name = getRanges)]
    pub fn get_ranges(&self) -> Result<JsValue, JsValue> {
        to_js(&self.ranges)
    }

    #[wasm_bindgen(js_name = canExecute)]
    pub fn can_execute(&self) -> bool {
        match self.mode {
            SessionMode::Split => !self.documents.is_empty() && !self.ranges.is_empty(),
            SessionMode::Merge => self.documents.len() >= 2,
        }
    }

    #[wasm_bindgen(js_name = executeMerge)]
    pub fn execute_merge(&self) -> Result<js_sys::Uint8Array, JsValue> {
        let bytes = self.merge_internal().map_err(js_error)?;
        Ok(to_uint8_array(&bytes))
    }

    /// Returns an array of `{ name, start, end, row, data }`
    #[wasm_bindgen(js_name = executeSplit)]
    pub fn execute_split(&self) -> Result<Array, JsValue> {
        let outputs = self.split_internal().map_err(js_error)?;

        let result = Array::new();
        for output in outputs {
            let obj = Object::new();
            Reflect::set(&obj, &"name".into(), &output.name.into())?;
            Reflect::set(&obj, &"start".into(), &output.range.start.into())?;
            Reflect::set(&obj, &"end".into(), &output.range.end.into())?;
            Reflect::set(&obj, &"row".into(), &(output.row as u32).into())?;
            Reflect::set(&obj, &"data".into(), &to_uint8_array(&output.bytes))?;
            result.push(&obj);
        }
        Ok(result)
    }

    /// Keep only the selected pages ("1-3, 5") of the split source
    #[wasm_bindgen(js_name = executeExtract)]
    pub fn execute_extract(&self, selection: &str) -> Result<js_sys::Uint8Array, JsValue> {
        let bytes = self.extract_internal(selection).map_err(js_error)?;
        Ok(to_uint8_array(&bytes))
    }
}

impl PdfToolsSession {
    fn add_document_internal(&mut self, name: &str, bytes: &[u8]) -> Result<PdfInfo, PdfToolsError> {
        let handle = self.codec.load(bytes)?;
        let info = info::describe(&handle, bytes)?;
        let document = codec::from_handle(&self.codec, handle)?;

        // Picking a new file for split replaces the old one
        if self.mode == SessionMode::Split && !self.documents.is_empty() {
            self.documents.clear();
            self.ranges.clear();
        }

        self.documents.push(DocumentEntry {
            name: name.to_string(),
            info: info.clone(),
            document,
        });
        Ok(info)
    }

    fn entry(&self, index: usize) -> Result<&DocumentEntry, PdfToolsError> {
        self.documents
            .get(index)
            .ok_or(PdfToolsError::IndexOutOfBounds {
                index,
                len: self.documents.len(),
            })
    }

    fn require_mode(&self, mode: SessionMode) -> Result<(), PdfToolsError> {
        if self.mode != mode {
            return Err(PdfToolsError::OperationError(format!(
                "{:?} is not available in {:?} mode",
                mode, self.mode
            )));
        }
        Ok(())
    }

    fn set_range_internal(&mut self, index: usize, start: &str, end: &str) -> Result<(), PdfToolsError> {
        let len = self.ranges.len();
        let row = self
            .ranges
            .get_mut(index)
            .ok_or(PdfToolsError::IndexOutOfBounds { index, len })?;
        row.start = start.to_string();
        row.end = end.to_string();
        Ok(())
    }

    fn set_ranges_text_internal(&mut self, text: &str) -> Result<usize, PdfToolsError> {
        self.ranges = parse_range_list(text)?
            .into_iter()
            .map(|r| RangeRow {
                start: r.start.to_string(),
                end: r.end.to_string(),
            })
            .collect();
        Ok(self.ranges.len())
    }

    fn merge_internal(&self) -> Result<Vec<u8>, PdfToolsError> {
        self.require_mode(SessionMode::Merge)?;
        let _busy = BusyGuard::acquire(&self.busy, "merge")?;

        // Later reorders cannot affect a merge already under way
        let documents: Vec<Document<LopdfHandle>> =
            self.documents.iter().map(|d| d.document.clone()).collect();

        self.report_progress(10, 100, "Merging...");
        let merged = assembly::merge(&documents)?;

        self.report_progress(60, 100, "Writing PDF...");
        let bytes = codec::encode(&self.codec, &merged)?;

        self.report_progress(100, 100, "Complete");
        Ok(bytes)
    }

    fn split_internal(&self) -> Result<Vec<SplitOutput>, PdfToolsError> {
        self.require_mode(SessionMode::Split)?;
        let _busy = BusyGuard::acquire(&self.busy, "split")?;

        let entry = self.entry(0)?.clone();

        // Rows whose fields are not numbers never reach the engine
        let (rows, ranges): (Vec<usize>, Vec<PageRange>) = self
            .ranges
            .iter()
            .enumerate()
            .filter_map(|(row, r)| PageRange::from_fields(&r.start, &r.end).map(|range| (row, range)))
            .unzip();

        let parts = assembly::split(&entry.document, &ranges);
        let stem = file_stem(&entry.name);
        let total = parts.len().max(1) as u32;

        let mut outputs = Vec::with_capacity(parts.len());
        for (i, part) in parts.into_iter().enumerate() {
            self.report_progress(
                i as u32 * 100 / total,
                100,
                &format!("Writing part {}/{}...", i + 1, total),
            );
            outputs.push(SplitOutput {
                name: format!("{}_pages_{}.pdf", stem, part.range),
                range: part.range,
                row: rows[part.request_index],
                bytes: codec::encode(&self.codec, &part.document)?,
            });
        }

        self.report_progress(100, 100, "Complete");
        Ok(outputs)
    }

    fn extract_internal(&self, selection: &str) -> Result<Vec<u8>, PdfToolsError> {
        self.require_mode(SessionMode::Split)?;
        let _busy = BusyGuard::acquire(&self.busy, "split")?;

        let entry = self.entry(0)?;
        let pages = parse_page_selection(selection, entry.document.page_count())?;
        let extracted = assembly::extract(&entry.document, &pages)?;
        codec::encode(&self.codec, &extracted)
    }

    fn report_progress(&self, current: u32, total: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            let _ = callback.call3(
                &JsValue::null(),
                &JsValue::from(current),
                &JsValue::from(total),
                &JsValue::from_str(message),
            );
        }
    }
}

#[derive(Serialize)]
struct DocumentInfoJs {
    name: String,
    page_count: u32,
    size_bytes: usize,
    version: String,
}
