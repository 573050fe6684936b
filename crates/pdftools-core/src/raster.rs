//! Shade removal: threshold binarization of rendered pages

use crate::codec::PdfCodec;
use crate::error::PdfToolsError;
use crate::images::PageImage;

/// Scale pages are rendered at before binarization
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

/// Brightness cut-off in `0..=255`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold(u8);

impl Threshold {
    pub const DEFAULT: Threshold = Threshold(140);

    pub fn new(value: i64) -> Result<Self, PdfToolsError> {
        u8::try_from(value)
            .map(Threshold)
            .map_err(|_| PdfToolsError::InvalidThreshold(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A rendered page: RGBA, four bytes per pixel, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, PdfToolsError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(PdfToolsError::ImageError(format!(
                "Expected {} RGBA bytes for {}x{}, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

/// Map each pixel to pure black or white by its channel average.
///
/// Average strictly above the threshold becomes white; alpha is kept.
pub fn binarize(pixels: &mut [u8], threshold: Threshold) {
    // avg > t without the integer division
    let limit = threshold.value() as u16 * 3;
    for px in pixels.chunks_exact_mut(4) {
        let sum = px[0] as u16 + px[1] as u16 + px[2] as u16;
        let value = if sum > limit { 255 } else { 0 };
        px[0] = value;
        px[1] = value;
        px[2] = value;
    }
}

/// Renders PDF pages to RGBA
pub trait Rasterizer {
    fn page_count(&self) -> usize;

    fn render_page(&self, index: usize, scale: f32) -> Result<RasterImage, PdfToolsError>;
}

/// Pages rendered elsewhere (by pdf.js in the browser) and handed over
#[derive(Debug, Default, Clone)]
pub struct PrerenderedPages {
    pages: Vec<RasterImage>,
}

impl PrerenderedPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, page: RasterImage) {
        self.pages.push(page);
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

impl Rasterizer for PrerenderedPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The scale was fixed when the pages were rendered, so it is ignored
    fn render_page(&self, index: usize, _scale: f32) -> Result<RasterImage, PdfToolsError> {
        self.pages
            .get(index)
            .cloned()
            .ok_or(PdfToolsError::IndexOutOfBounds {
                index,
                len: self.pages.len(),
            })
    }
}

/// Render, binarize and re-assemble every page as an image-only PDF
pub fn remove_shading<R: Rasterizer, C: PdfCodec>(
    rasterizer: &R,
    codec: &C,
    threshold: Threshold,
    scale: f32,
) -> Result<Vec<u8>, PdfToolsError> {
    let page_count = rasterizer.page_count();
    if page_count == 0 {
        return Err(PdfToolsError::OperationError("No pages to process".into()));
    }

    let mut handle = codec.create();
    for index in 0..page_count {
        let page = rasterizer.render_page(index, scale)?;
        let (width, height) = (page.width(), page.height());
        let mut pixels = page.into_pixels();
        binarize(&mut pixels, threshold);
        codec.embed_image(&mut handle, &PageImage::gray_from_rgba(width, height, &pixels))?;
    }

    tracing::info!(pages = page_count, threshold = threshold.value(), "removed shading");
    codec.save(&mut handle)
}
