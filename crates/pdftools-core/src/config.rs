//! Tool configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::error::PdfToolsError;
use crate::raster::Threshold;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Base URL of the office/notebook conversion service
    #[serde(default = "default_conversion_base_url")]
    pub conversion_base_url: String,
    /// Base URL of the OCR text extraction service
    #[serde(default = "default_ocr_base_url")]
    pub ocr_base_url: String,
    /// Largest file accepted for remote conversion (default: 10 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Binarization threshold for shade removal (default: 140)
    #[serde(default = "default_shade_threshold")]
    pub shade_threshold: i64,
    /// Scale pages are rendered at for shade removal (default: 2.0)
    #[serde(default = "default_render_scale")]
    pub render_scale: f32,
}

fn default_conversion_base_url() -> String {
    "https://trauma-chi.vercel.app".to_string()
}

fn default_ocr_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_shade_threshold() -> i64 {
    Threshold::DEFAULT.value() as i64
}

fn default_render_scale() -> f32 {
    crate::raster::DEFAULT_RENDER_SCALE
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            conversion_base_url: default_conversion_base_url(),
            ocr_base_url: default_ocr_base_url(),
            max_upload_bytes: default_max_upload_bytes(),
            shade_threshold: default_shade_threshold(),
            render_scale: default_render_scale(),
        }
    }
}

impl ToolsConfig {
    /// Parse and validate a JSON config
    pub fn from_json(s: &str) -> Result<Self, PdfToolsError> {
        let config: ToolsConfig = serde_json::from_str(s)
            .map_err(|e| PdfToolsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PdfToolsError> {
        for (name, url) in [
            ("conversion_base_url", &self.conversion_base_url),
            ("ocr_base_url", &self.ocr_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(PdfToolsError::InvalidConfig(format!(
                    "{} must be an http(s) URL, got {:?}",
                    name, url
                )));
            }
        }
        if self.max_upload_bytes == 0 {
            return Err(PdfToolsError::InvalidConfig(
                "max_upload_bytes must be positive".into(),
            ));
        }
        if !(self.render_scale.is_finite() && self.render_scale > 0.0) {
            return Err(PdfToolsError::InvalidConfig(format!(
                "render_scale must be positive, got {}",
                self.render_scale
            )));
        }
        self.threshold().map(|_| ())
    }

    pub fn threshold(&self) -> Result<Threshold, PdfToolsError> {
        Threshold::new(self.shade_threshold)
    }
}
