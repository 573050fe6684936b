//! Images to PDF
//!
//! Each supported image becomes one page sized to the image. Files that are
//! neither PNG nor JPEG are skipped and reported back to the caller.

use crate::codec::PdfCodec;
use crate::error::PdfToolsError;
use image::{DynamicImage, GenericImageView};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Detect from the MIME subtype, falling back to the file extension
    pub fn detect(mime: &str, file_name: &str) -> Option<Self> {
        let subtype = mime.split('/').nth(1).unwrap_or("");
        Self::from_token(subtype).or_else(|| {
            file_name
                .rsplit_once('.')
                .and_then(|(_, ext)| Self::from_token(ext))
        })
    }

    fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpeg" | "jpg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }

    fn as_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelColor {
    Gray,
    Rgb,
}

impl PixelColor {
    pub fn components(self) -> usize {
        match self {
            PixelColor::Gray => 1,
            PixelColor::Rgb => 3,
        }
    }
}

/// Decoded pixels ready to be placed on a page
#[derive(Debug, Clone, PartialEq)]
pub struct PageImage {
    pub width: u32,
    pub height: u32,
    pub color: PixelColor,
    /// Row-major samples, `color.components()` bytes per pixel
    pub samples: Vec<u8>,
    /// One byte per pixel; `None` when the image is fully opaque
    pub alpha: Option<Vec<u8>>,
}

impl PageImage {
    pub fn decode(bytes: &[u8], format: ImageFormat) -> Result<Self, PdfToolsError> {
        let image = image::load_from_memory_with_format(bytes, format.as_image_format())
            .map_err(|e| PdfToolsError::ImageError(e.to_string()))?;
        Ok(Self::from_dynamic(&image))
    }

    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let (width, height) = image.dimensions();

        if !image.color().has_color() {
            let luma = image.to_luma_alpha8();
            let mut samples = Vec::with_capacity((width * height) as usize);
            let mut alpha = Vec::with_capacity((width * height) as usize);
            for pixel in luma.pixels() {
                samples.push(pixel[0]);
                alpha.push(pixel[1]);
            }
            return Self {
                width,
                height,
                color: PixelColor::Gray,
                samples,
                alpha: opaque_or(alpha),
            };
        }

        let rgba = image.to_rgba8();
        let mut samples = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        for pixel in rgba.pixels() {
            samples.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel[3]);
        }
        Self {
            width,
            height,
            color: PixelColor::Rgb,
            samples,
            alpha: opaque_or(alpha),
        }
    }

    /// Grayscale page from an RGBA buffer whose channels are already equal,
    /// such as the output of binarization.
    pub fn gray_from_rgba(width: u32, height: u32, rgba: &[u8]) -> Self {
        Self {
            width,
            height,
            color: PixelColor::Gray,
            samples: rgba.chunks_exact(4).map(|px| px[0]).collect(),
            alpha: None,
        }
    }
}

fn opaque_or(alpha: Vec<u8>) -> Option<Vec<u8>> {
    if alpha.iter().all(|&a| a == u8::MAX) {
        None
    } else {
        Some(alpha)
    }
}

/// A picked image file
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImagesToPdf {
    #[serde(skip)]
    pub pdf: Vec<u8>,
    pub page_count: usize,
    /// Names of files that were not PNG or JPEG
    pub skipped: Vec<String>,
}

/// Lay out the images one per page, in order.
///
/// Unsupported files are skipped; a supported file that fails to decode
/// aborts the whole conversion.
pub fn images_to_pdf<C: PdfCodec>(
    codec: &C,
    files: &[ImageFile],
) -> Result<ImagesToPdf, PdfToolsError> {
    if files.is_empty() {
        return Err(PdfToolsError::UnsupportedFile("No images selected".into()));
    }

    let mut handle = codec.create();
    let mut skipped = Vec::new();
    let mut page_count = 0;

    for file in files {
        let Some(format) = ImageFormat::detect(&file.mime, &file.name) else {
            tracing::warn!(name = %file.name, mime = %file.mime, "skipping unsupported image");
            skipped.push(file.name.clone());
            continue;
        };

        let image = PageImage::decode(&file.bytes, format).map_err(|e| match e {
            PdfToolsError::ImageError(msg) => {
                PdfToolsError::ImageError(format!("{}: {}", file.name, msg))
            }
            other => other,
        })?;
        codec.embed_image(&mut handle, &image)?;
        page_count += 1;
    }

    if page_count == 0 {
        return Err(PdfToolsError::UnsupportedFile(
            "Only PNG and JPEG images are supported".into(),
        ));
    }

    tracing::info!(pages = page_count, skipped = skipped.len(), "converted images");
    Ok(ImagesToPdf {
        pdf: codec.save(&mut handle)?,
        page_count,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LopdfCodec;
    use image::{ImageBuffer, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, alpha: u8) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([200u8, 10, 10, alpha]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn file(name: &str, mime: &str, bytes: Vec<u8>) -> ImageFile {
        ImageFile {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(ImageFormat::detect("image/png", "a.png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::detect("image/jpeg", "a"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::detect("", "photo.JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::detect("image/gif", "a.gif"), None);
    }

    #[test]
    fn test_decode_opaque_png_has_no_alpha() {
        let image = PageImage::decode(&png_bytes(3, 2, 255), ImageFormat::Png).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.color, PixelColor::Rgb);
        assert_eq!(image.samples.len(), 3 * 2 * 3);
        assert!(image.alpha.is_none());
    }

    #[test]
    fn test_decode_translucent_png_keeps_alpha() {
        let image = PageImage::decode(&png_bytes(2, 2, 128), ImageFormat::Png).unwrap();
        assert_eq!(image.alpha, Some(vec![128; 4]));
    }

    #[test]
    fn test_gray_from_rgba() {
        let image = PageImage::gray_from_rgba(2, 1, &[0, 0, 0, 255, 255, 255, 255, 255]);
        assert_eq!(image.samples, vec![0, 255]);
    }

    #[test]
    fn test_images_to_pdf_skips_unsupported() {
        let codec = LopdfCodec::new();
        let files = vec![
            file("a.png", "image/png", png_bytes(10, 20, 255)),
            file("b.gif", "image/gif", vec![1, 2, 3]),
            file("c.png", "image/png", png_bytes(30, 40, 255)),
        ];

        let result = images_to_pdf(&codec, &files).unwrap();
        assert_eq!(result.page_count, 2);
        assert_eq!(result.skipped, vec!["b.gif".to_string()]);

        let doc = lopdf::Document::load_mem(&result.pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_images_to_pdf_requires_a_supported_image() {
        let codec = LopdfCodec::new();
        assert!(images_to_pdf(&codec, &[]).is_err());

        let err = images_to_pdf(&codec, &[file("x.bmp", "image/bmp", vec![0])]).unwrap_err();
        assert!(matches!(err, PdfToolsError::UnsupportedFile(_)));
    }

    #[test]
    fn test_images_to_pdf_fails_on_corrupt_image() {
        let codec = LopdfCodec::new();
        let err = images_to_pdf(&codec, &[file("bad.png", "image/png", vec![0; 16])]).unwrap_err();
        assert!(matches!(err, PdfToolsError::ImageError(_)));
    }
}
