//! Editor configuration.
//!
//! Every field has a default so a partial JSON object is a valid config.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, EditorError, Result};
use crate::types::Color;

/// What the materializer does with an element whose `type` it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownVariantPolicy {
    /// Drop the element and log a warning.
    #[default]
    Skip,
    /// Fail the whole materialization with `UnknownVariant`.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background: Color,
    /// Maximum number of undo steps kept.
    pub history_limit: usize,
    pub duplicate_offset: f64,
    /// Uploaded bitmaps are scaled to this width, aspect preserved.
    pub upload_width: f64,
    pub unknown_variants: UnknownVariantPolicy,
    pub export_basename: String,
    pub export_multiplier: f64,
    pub jpeg_quality: u8,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1080,
            canvas_height: 1080,
            background: Color::WHITE,
            history_limit: 100,
            duplicate_offset: 20.0,
            upload_width: 400.0,
            unknown_variants: UnknownVariantPolicy::Skip,
            export_basename: "design".to_string(),
            export_multiplier: 2.0,
            jpeg_quality: 100,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("canvasWidth", self.canvas_width as f64)?;
        ensure_positive("canvasHeight", self.canvas_height as f64)?;
        ensure_positive("uploadWidth", self.upload_width)?;
        ensure_positive("exportMultiplier", self.export_multiplier)?;
        if self.history_limit == 0 {
            return Err(EditorError::Config("historyLimit must be at least 1".to_string()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(EditorError::Config(format!("jpegQuality {} is outside 1..=100", self.jpeg_quality)));
        }
        if self.export_basename.trim().is_empty() {
            return Err(EditorError::Config("exportBasename is empty".to_string()));
        }
        Ok(())
    }
}
