//! The set of tools offered on the dashboard

use crate::convert::ConversionKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    #[default]
    Dashboard,
    Merge,
    Split,
    Rotate,
    ImagesToPdf,
    PdfToImage,
    RemoveShading,
    ExcelToPdf,
    PptToPdf,
    NotebookToPdf,
    OcrSearch,
}

impl Tool {
    /// Tools shown as dashboard cards, in display order
    pub const ALL: [Tool; 10] = [
        Tool::Merge,
        Tool::Split,
        Tool::Rotate,
        Tool::ImagesToPdf,
        Tool::PdfToImage,
        Tool::RemoveShading,
        Tool::ExcelToPdf,
        Tool::PptToPdf,
        Tool::NotebookToPdf,
        Tool::OcrSearch,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tool::Dashboard => "PDF Tools",
            Tool::Merge => "Merge PDFs",
            Tool::Split => "Split PDFs",
            Tool::Rotate => "Rotate PDF",
            Tool::ImagesToPdf => "Images to PDF",
            Tool::PdfToImage => "PDF to Image",
            Tool::RemoveShading => "Remove Shading",
            Tool::ExcelToPdf => "Excel to PDF",
            Tool::PptToPdf => "PowerPoint to PDF",
            Tool::NotebookToPdf => "Notebook to PDF",
            Tool::OcrSearch => "Search Scanned PDF",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::Dashboard => "Pick a tool to get started.",
            Tool::Merge => "Combine multiple PDFs into one.",
            Tool::Split => "Split a single PDF into multiple parts.",
            Tool::Rotate => "Rotate selected pages left or right.",
            Tool::ImagesToPdf => "Turn PNG and JPEG images into a PDF.",
            Tool::PdfToImage => "Preview PDF pages as images.",
            Tool::RemoveShading => "Clean up scans into pure black and white.",
            Tool::ExcelToPdf => "Convert an .xlsx spreadsheet to PDF.",
            Tool::PptToPdf => "Convert a .ppt or .pptx presentation to PDF.",
            Tool::NotebookToPdf => "Convert a Jupyter notebook to PDF.",
            Tool::OcrSearch => "Find text inside a scanned PDF.",
        }
    }

    /// Stable identifier used by the page (`"images-to-pdf"`)
    pub fn slug(self) -> &'static str {
        match self {
            Tool::Dashboard => "dashboard",
            Tool::Merge => "merge",
            Tool::Split => "split",
            Tool::Rotate => "rotate",
            Tool::ImagesToPdf => "images-to-pdf",
            Tool::PdfToImage => "pdf-to-image",
            Tool::RemoveShading => "remove-shading",
            Tool::ExcelToPdf => "excel-to-pdf",
            Tool::PptToPdf => "ppt-to-pdf",
            Tool::NotebookToPdf => "notebook-to-pdf",
            Tool::OcrSearch => "ocr-search",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        std::iter::once(Tool::Dashboard)
            .chain(Tool::ALL)
            .find(|tool| tool.slug() == slug)
    }

    /// Remote conversion used by this tool, if any
    pub fn conversion(self) -> Option<ConversionKind> {
        match self {
            Tool::ExcelToPdf => Some(ConversionKind::Excel),
            Tool::PptToPdf => Some(ConversionKind::PowerPoint),
            Tool::NotebookToPdf => Some(ConversionKind::Notebook),
            _ => None,
        }
    }
}

/// Dashboard card
#[derive(Debug, Clone, Serialize)]
pub struct ToolCard {
    pub tool: Tool,
    pub title: &'static str,
    pub description: &'static str,
}

pub fn dashboard_cards() -> Vec<ToolCard> {
    Tool::ALL
        .iter()
        .map(|&tool| ToolCard {
            tool,
            title: tool.title(),
            description: tool.description(),
        })
        .collect()
}

/// Which tool is on screen. Back always returns to the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Navigation {
    current: Tool,
}

impl Navigation {
    pub fn current(&self) -> Tool {
        self.current
    }

    pub fn open(&mut self, tool: Tool) {
        tracing::debug!(?tool, "opening tool");
        self.current = tool;
    }

    pub fn back(&mut self) {
        self.current = Tool::Dashboard;
    }

    pub fn is_dashboard(&self) -> bool {
        self.current == Tool::Dashboard
    }
}
