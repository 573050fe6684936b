//! JSON command surface
//!
//! A single entry point that takes a tagged command, runs it through the
//! lopdf codec and reports base64-encoded output.

use crate::assembly;
use crate::codec::{self, LopdfCodec};
use crate::error::PdfToolsError;
use crate::model::{PageRange, RotationDirection};
use crate::ranges::parse_page_selection;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum PdfCommand {
    Merge {
        files: Vec<Vec<u8>>,
    },
    Split {
        file: Vec<u8>,
        ranges: Vec<(u32, u32)>,
    },
    Rotate {
        file: Vec<u8>,
        /// Comma-separated 1-based page numbers
        pages: String,
        direction: Option<RotationDirection>,
    },
    Extract {
        file: Vec<u8>,
        /// Page selection such as "1-3, 5"
        pages: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    /// Base64-encoded PDF data
    pub data: Option<String>,
    /// Base64-encoded PDFs for commands with several outputs
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    pub error: Option<String>,
    pub metrics: Option<ProcessMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessMetrics {
    pub input_size_bytes: usize,
    pub output_size_bytes: usize,
    pub page_count: u32,
}

impl ProcessResult {
    fn failure(error: &PdfToolsError) -> Self {
        Self {
            success: false,
            data: None,
            outputs: Vec::new(),
            error: Some(error.user_message()),
            metrics: None,
        }
    }
}

/// Parse and run a JSON command. Never fails; errors are reported in the result.
pub fn process_json(json: &str) -> ProcessResult {
    match serde_json::from_str::<PdfCommand>(json) {
        Ok(command) => process_command(command),
        Err(e) => ProcessResult::failure(&PdfToolsError::from(e)),
    }
}

pub fn process_command(command: PdfCommand) -> ProcessResult {
    match run(command) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "command failed");
            ProcessResult::failure(&e)
        }
    }
}

fn run(command: PdfCommand) -> Result<ProcessResult, PdfToolsError> {
    let codec = LopdfCodec::new();

    match command {
        PdfCommand::Merge { files } => {
            let input_size = files.iter().map(Vec::len).sum();
            let documents = files
                .iter()
                .map(|bytes| codec::decode(&codec, bytes))
                .collect::<Result<Vec<_>, _>>()?;
            let merged = assembly::merge(&documents)?;
            let bytes = codec::encode(&codec, &merged)?;
            Ok(single(bytes, input_size, merged.page_count()))
        }
        PdfCommand::Split { file, ranges } => {
            let source = codec::decode(&codec, &file)?;
            let ranges: Vec<PageRange> = ranges
                .into_iter()
                .map(|(start, end)| PageRange::new(start, end))
                .collect();

            let mut outputs = Vec::new();
            let mut output_size = 0;
            let mut page_count = 0;
            for part in assembly::split(&source, &ranges) {
                let bytes = codec::encode(&codec, &part.document)?;
                output_size += bytes.len();
                page_count += part.document.page_count() as u32;
                outputs.push(STANDARD.encode(&bytes));
            }

            Ok(ProcessResult {
                success: true,
                data: None,
                outputs,
                error: None,
                metrics: Some(ProcessMetrics {
                    input_size_bytes: file.len(),
                    output_size_bytes: output_size,
                    page_count,
                }),
            })
        }
        PdfCommand::Rotate {
            file,
            pages,
            direction,
        } => {
            let source = codec::decode(&codec, &file)?;
            let rotated = assembly::rotate_pages(&source, &pages, direction)?;
            let bytes = codec::encode(&codec, &rotated)?;
            Ok(single(bytes, file.len(), rotated.page_count()))
        }
        PdfCommand::Extract { file, pages } => {
            let source = codec::decode(&codec, &file)?;
            let selection = parse_page_selection(&pages, source.page_count())?;
            let extracted = assembly::extract(&source, &selection)?;
            let bytes = codec::encode(&codec, &extracted)?;
            Ok(single(bytes, file.len(), extracted.page_count()))
        }
    }
}

fn single(bytes: Vec<u8>, input_size: usize, page_count: usize) -> ProcessResult {
    ProcessResult {
        success: true,
        metrics: Some(ProcessMetrics {
            input_size_bytes: input_size,
            output_size_bytes: bytes.len(),
            page_count: page_count as u32,
        }),
        data: Some(STANDARD.encode(&bytes)),
        outputs: Vec::new(),
        error: None,
    }
}
