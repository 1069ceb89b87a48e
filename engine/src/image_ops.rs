use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::{EditorError, Result};

/// Where an image object's bitmap comes from.
///
/// Embedded bytes travel as a `data:` URL; remote sources keep their URL and
/// are resolved by the host through [`crate::render::AssetResolver`].
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub enum ImageSource {
    Embedded(Arc<Vec<u8>>),
    Remote(String),
}

impl ImageSource {
    pub fn embedded(bytes: impl Into<Vec<u8>>) -> Self {
        ImageSource::Embedded(Arc::new(bytes.into()))
    }

    pub fn to_url(&self) -> String {
        match self {
            ImageSource::Embedded(bytes) => data_url(mime_for(bytes), bytes),
            ImageSource::Remote(url) => url.clone(),
        }
    }

    /// Parses either a `data:*;base64,` URL or any other reference.
    pub fn parse(reference: &str) -> Result<Self> {
        let Some(rest) = reference.strip_prefix("data:") else {
            return Ok(ImageSource::Remote(reference.to_string()));
        };
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| EditorError::DecodeFailure("malformed data URL".to_string()))?;
        if !meta.ends_with(";base64") {
            return Err(EditorError::DecodeFailure("data URL is not base64 encoded".to_string()));
        }
        let bytes = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| EditorError::DecodeFailure(e.to_string()))?;
        Ok(ImageSource::embedded(bytes))
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Embedded(bytes) => write!(f, "Embedded({} bytes)", bytes.len()),
            ImageSource::Remote(url) => write!(f, "Remote({url})"),
        }
    }
}

impl TryFrom<String> for ImageSource {
    type Error = EditorError;

    fn try_from(value: String) -> Result<Self> {
        ImageSource::parse(&value)
    }
}

impl From<ImageSource> for String {
    fn from(source: ImageSource) -> Self {
        source.to_url()
    }
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

fn mime_for(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Png) => "image/png",
        _ => "application/octet-stream",
    }
}

/// Decodes an uploaded or embedded bitmap to straight RGBA.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes).map_err(|e| EditorError::DecodeFailure(e.to_string()))?;
    let rgba = img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(EditorError::DecodeFailure("image has no pixels".to_string()));
    }
    Ok(rgba)
}

/// Per-object pixel filter. Applied in list order.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ImageFilter {
    Grayscale,
    Sepia,
    /// Additive shift, `-1.0..=1.0` of full range.
    Brightness { amount: f64 },
    /// Contrast stretch around mid gray, `-1.0..=1.0`.
    Contrast { amount: f64 },
}

impl ImageFilter {
    /// Presets behind the properties panel buttons.
    pub const BRIGHTEN: ImageFilter = ImageFilter::Brightness { amount: 0.2 };
    pub const CONTRAST: ImageFilter = ImageFilter::Contrast { amount: 0.3 };

    pub fn name(&self) -> &'static str {
        match self {
            ImageFilter::Grayscale => "grayscale",
            ImageFilter::Sepia => "sepia",
            ImageFilter::Brightness { .. } => "brightness",
            ImageFilter::Contrast { .. } => "contrast",
        }
    }

    fn apply_pixel(&self, px: &mut Rgba<u8>) {
        let [r, g, b, a] = px.0;
        let (r, g, b) = (r as f64, g as f64, b as f64);
        let out = match *self {
            ImageFilter::Grayscale => {
                let v = (r + g + b) / 3.0;
                [v, v, v]
            }
            ImageFilter::Sepia => [
                r * 0.393 + g * 0.769 + b * 0.189,
                r * 0.349 + g * 0.686 + b * 0.168,
                r * 0.272 + g * 0.534 + b * 0.131,
            ],
            ImageFilter::Brightness { amount } => {
                let shift = amount * 255.0;
                [r + shift, g + shift, b + shift]
            }
            ImageFilter::Contrast { amount } => {
                let c = (amount * 255.0).floor();
                let factor = (259.0 * (c + 255.0)) / (255.0 * (259.0 - c));
                [factor * (r - 128.0) + 128.0, factor * (g - 128.0) + 128.0, factor * (b - 128.0) + 128.0]
            }
        };
        px.0 = [clamp_channel(out[0]), clamp_channel(out[1]), clamp_channel(out[2]), a];
    }
}

fn clamp_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Runs `filters` over `image` in order. Alpha is left untouched.
pub fn apply_filters(image: &mut RgbaImage, filters: &[ImageFilter]) {
    if filters.is_empty() {
        return;
    }
    for px in image.pixels_mut() {
        for filter in filters {
            filter.apply_pixel(px);
        }
    }
}
