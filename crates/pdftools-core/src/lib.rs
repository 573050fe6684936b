//! PDF Tools core
//!
//! Client-side document assembly over lopdf: merge, split, extract and
//! rotate pages, turn images into PDFs and binarize scanned pages.
//!
//! The assembly engine (`assembly`) works on [`Document`] values that only
//! reference their source pages; bytes are read and written by a
//! [`PdfCodec`], normally [`LopdfCodec`].

pub mod assembly;
pub mod codec;
pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod images;
pub mod info;
pub mod model;
pub mod ranges;
pub mod raster;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use assembly::{merge, rotate, rotate_pages, split, SplitPart};
pub use codec::{decode, encode, LopdfCodec, LopdfHandle, PdfCodec};
pub use command::{process_command, process_json, PdfCommand, ProcessMetrics, ProcessResult};
pub use config::ToolsConfig;
pub use error::PdfToolsError;
pub use info::get_page_count;
pub use model::{Document, DocumentSet, Page, PageRange, Rotation, RotationDirection};
pub use ranges::{parse_page_numbers, parse_page_selection, parse_range_list};
pub use raster::{RasterImage, Rasterizer, Threshold};
pub use tools::Tool;
