use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EditorError;

/// Identifier of a scene object, unique within one document.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tag of a scene object variant, as it appears in template descriptors.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    #[serde(alias = "i-text")]
    Text,
    #[serde(alias = "rectangle")]
    Rect,
    Circle,
    Triangle,
    #[serde(alias = "star")]
    Polygon,
    Image,
}

impl ShapeType {
    pub fn tag(self) -> &'static str {
        match self {
            ShapeType::Text => "text",
            ShapeType::Rect => "rect",
            ShapeType::Circle => "circle",
            ShapeType::Triangle => "triangle",
            ShapeType::Polygon => "polygon",
            ShapeType::Image => "image",
        }
    }

    /// Human label used for default layer names.
    pub fn label(self) -> &'static str {
        match self {
            ShapeType::Text => "Text",
            ShapeType::Rect => "Rectangle",
            ShapeType::Circle => "Circle",
            ShapeType::Triangle => "Triangle",
            ShapeType::Polygon => "Star",
            ShapeType::Image => "Image",
        }
    }
}

impl FromStr for ShapeType {
    type Err = EditorError;

    /// Accepts descriptor tags plus the toolbar spellings ("rectangle", "star").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "i-text" => Ok(ShapeType::Text),
            "rect" | "rectangle" => Ok(ShapeType::Rect),
            "circle" => Ok(ShapeType::Circle),
            "triangle" => Ok(ShapeType::Triangle),
            "polygon" | "star" => Ok(ShapeType::Polygon),
            "image" => Ok(ShapeType::Image),
            other => Err(EditorError::UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Direction of a z-order change. `Front` paints last, `Back` paints first.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum ZOrder {
    Front,
    Back,
    Forward,
    Backward,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Straight (non premultiplied) RGBA color, written as `#rrggbb` / `#rrggbbaa`.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    pub fn to_hex(&self) -> String {
        if *self == Color::TRANSPARENT {
            "transparent".to_string()
        } else if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EditorError::InvalidColor(s.to_string());
        let value = s.trim().to_ascii_lowercase();
        match value.as_str() {
            "transparent" | "none" | "" => return Ok(Color::TRANSPARENT),
            "black" => return Ok(Color::BLACK),
            "white" => return Ok(Color::WHITE),
            _ => {}
        }
        let hex = value.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        let color = match hex.len() {
            3 => Color::rgb(nibble(0).map_err(|_| invalid())?, nibble(1).map_err(|_| invalid())?, nibble(2).map_err(|_| invalid())?),
            4 => Color::rgba(
                nibble(0).map_err(|_| invalid())?,
                nibble(1).map_err(|_| invalid())?,
                nibble(2).map_err(|_| invalid())?,
                nibble(3).map_err(|_| invalid())?,
            ),
            6 => Color::rgb(byte(0).map_err(|_| invalid())?, byte(2).map_err(|_| invalid())?, byte(4).map_err(|_| invalid())?),
            8 => Color::rgba(
                byte(0).map_err(|_| invalid())?,
                byte(2).map_err(|_| invalid())?,
                byte(4).map_err(|_| invalid())?,
                byte(6).map_err(|_| invalid())?,
            ),
            _ => return Err(invalid()),
        };
        Ok(color)
    }
}

impl TryFrom<String> for Color {
    type Error = EditorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Named canvas sizes offered next to the editor.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum CanvasPreset {
    InstagramPost,
    InstagramStory,
    FacebookPost,
    YoutubeThumbnail,
    TwitterHeader,
    A4Document,
}

impl CanvasPreset {
    pub const ALL: [CanvasPreset; 6] = [
        CanvasPreset::InstagramPost,
        CanvasPreset::InstagramStory,
        CanvasPreset::FacebookPost,
        CanvasPreset::YoutubeThumbnail,
        CanvasPreset::TwitterHeader,
        CanvasPreset::A4Document,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CanvasPreset::InstagramPost => "Instagram Post",
            CanvasPreset::InstagramStory => "Instagram Story",
            CanvasPreset::FacebookPost => "Facebook Post",
            CanvasPreset::YoutubeThumbnail => "YouTube Thumbnail",
            CanvasPreset::TwitterHeader => "Twitter Header",
            CanvasPreset::A4Document => "A4 Document",
        }
    }

    pub fn size(self) -> (u32, u32) {
        match self {
            CanvasPreset::InstagramPost => (1080, 1080),
            CanvasPreset::InstagramStory => (1080, 1920),
            CanvasPreset::FacebookPost => (1200, 630),
            CanvasPreset::YoutubeThumbnail => (1280, 720),
            CanvasPreset::TwitterHeader => (1500, 500),
            CanvasPreset::A4Document => (794, 1123),
        }
    }
}
