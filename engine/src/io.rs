//! Bitmap export and the persistence seam.

use image::{DynamicImage, ImageOutputFormat, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use tracing::info;

use crate::document::Document;
use crate::error::{EditorError, Result};
use crate::image_ops::data_url;
use crate::render::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpeg { quality: u8 },
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpeg",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// Encoded export ready for an [`ExportSink`].
#[derive(Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ExportedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedImage")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl ExportedImage {
    pub fn to_data_url(&self) -> String {
        data_url(self.format.mime(), &self.bytes)
    }

    pub fn file_name(&self, basename: &str) -> String {
        format!("{}.{}", basename, self.format.extension())
    }
}

/// Host side destination for exports (browser download, file, upload).
pub trait ExportSink {
    fn deliver(&mut self, file_name: &str, image: &ExportedImage) -> Result<()>;
}

/// Rasterizes `doc` at `scale` and encodes it.
pub fn export_bitmap(doc: &Document, format: ExportFormat, scale: f64, renderer: &Renderer<'_>) -> Result<ExportedImage> {
    let rgba = renderer.render_rgba(doc, scale)?;
    let (width, height) = rgba.dimensions();
    let bytes = encode(rgba, format)?;
    info!(width, height, format = format.extension(), size = bytes.len(), "exported bitmap");
    Ok(ExportedImage { format, width, height, bytes })
}

fn encode(rgba: RgbaImage, format: ExportFormat) -> Result<Vec<u8>> {
    let (image, output) = match format {
        ExportFormat::Png => (DynamicImage::ImageRgba8(rgba), ImageOutputFormat::Png),
        ExportFormat::Jpeg { quality } => {
            (DynamicImage::ImageRgb8(flatten(&rgba)), ImageOutputFormat::Jpeg(quality.clamp(1, 100)))
        }
    };
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), output)
        .map_err(|e| EditorError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// JPEG has no alpha; translucent pixels are composited over white.
fn flatten(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u32 * a as u32 + 255 * (255 - a as u32) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesignId(pub String);

impl fmt::Display for DesignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stores serialized documents. The engine never looks inside the id.
pub trait DesignStore {
    fn save(&mut self, serialized: &str) -> Result<DesignId>;
    fn load(&self, id: &DesignId) -> Result<String>;
}

#[derive(Debug, Default)]
pub struct MemoryDesignStore {
    designs: HashMap<DesignId, String>,
    next: u64,
}

impl MemoryDesignStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.designs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.designs.is_empty()
    }
}

impl DesignStore for MemoryDesignStore {
    fn save(&mut self, serialized: &str) -> Result<DesignId> {
        self.next += 1;
        let id = DesignId(format!("design-{}", self.next));
        self.designs.insert(id.clone(), serialized.to_string());
        Ok(id)
    }

    fn load(&self, id: &DesignId) -> Result<String> {
        self.designs
            .get(id)
            .cloned()
            .ok_or_else(|| EditorError::Persistence(format!("no design stored under {id}")))
    }
}
