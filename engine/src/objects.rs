use kurbo::{BezPath, Circle, Point, Rect, Shape, Size};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{ensure_positive, EditorError, Result};
use crate::geometry::Placement;
use crate::image_ops::{ImageFilter, ImageSource};
use crate::text;
use crate::types::{Color, FontStyle, FontWeight, ObjectId, ShapeType};

pub const DEFAULT_TEXT: &str = "Double click to edit";
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_FONT_SIZE: f64 = 32.0;
pub const ACCENT_FILL: Color = Color::rgb(0x63, 0x66, 0xf1);
pub const CIRCLE_FILL: Color = Color::rgb(0xec, 0x48, 0x99);
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

pub const STAR_SPIKES: usize = 5;
pub const STAR_OUTER_RADIUS: f64 = 80.0;
pub const STAR_INNER_RADIUS: f64 = 40.0;

/// Average glyph advance as a fraction of the font size.
const TEXT_ADVANCE_EM: f64 = 0.6;
pub(crate) const TEXT_LINE_HEIGHT: f64 = 1.16;

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
}

impl StrokeStyle {
    pub const NONE: StrokeStyle = StrokeStyle { color: Color::TRANSPARENT, width: 0.0 };

    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && !self.color.is_transparent()
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TextShape {
    pub content: String,
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
}

impl TextShape {
    /// Extents of the laid out glyphs, or an estimate from the font size when
    /// no face can be loaded.
    pub fn extents(&self) -> Size {
        let lines: Vec<&str> = self.content.split('\n').collect();
        let width = text::measure_width(self).unwrap_or_else(|| {
            let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
            longest as f64 * self.font_size * TEXT_ADVANCE_EM
        });
        Size::new(width, lines.len() as f64 * self.font_size * TEXT_LINE_HEIGHT)
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ImageShape {
    pub source: ImageSource,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<ImageFilter>,
}

/// Variant specific payload of a scene object.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectKind {
    Text(TextShape),
    Rect { width: f64, height: f64 },
    Circle { radius: f64 },
    Triangle { width: f64, height: f64 },
    Polygon { points: Vec<Point> },
    Image(ImageShape),
}

impl ObjectKind {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ObjectKind::Text(_) => ShapeType::Text,
            ObjectKind::Rect { .. } => ShapeType::Rect,
            ObjectKind::Circle { .. } => ShapeType::Circle,
            ObjectKind::Triangle { .. } => ShapeType::Triangle,
            ObjectKind::Polygon { .. } => ShapeType::Polygon,
            ObjectKind::Image(_) => ShapeType::Image,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ObjectKind::Text(text) => {
                ensure_positive("fontSize", text.font_size)?;
            }
            ObjectKind::Rect { width, height } | ObjectKind::Triangle { width, height } => {
                ensure_positive("width", *width)?;
                ensure_positive("height", *height)?;
            }
            ObjectKind::Circle { radius } => {
                ensure_positive("radius", *radius)?;
            }
            ObjectKind::Polygon { points } => {
                if points.len() < 3 {
                    return Err(EditorError::invalid_geometry("points", points.len() as f64));
                }
            }
            ObjectKind::Image(image) => {
                ensure_positive("width", image.width as f64)?;
                ensure_positive("height", image.height as f64)?;
            }
        }
        Ok(())
    }

    /// Untransformed size of the local frame.
    pub fn local_size(&self) -> Size {
        match self {
            ObjectKind::Text(text) => text.extents(),
            ObjectKind::Rect { width, height } | ObjectKind::Triangle { width, height } => Size::new(*width, *height),
            ObjectKind::Circle { radius } => Size::new(radius * 2.0, radius * 2.0),
            ObjectKind::Polygon { points } => polygon_bounds(points).size(),
            ObjectKind::Image(image) => Size::new(image.width as f64, image.height as f64),
        }
    }

    /// Outline in the local frame, origin at the top-left of the bounding box.
    pub fn outline(&self) -> BezPath {
        match self {
            ObjectKind::Circle { radius } => Circle::new((*radius, *radius), *radius).to_path(0.1),
            ObjectKind::Triangle { width, height } => {
                closed_path(&[Point::new(width / 2.0, 0.0), Point::new(*width, *height), Point::new(0.0, *height)])
            }
            ObjectKind::Polygon { points } => {
                let origin = polygon_bounds(points).origin();
                let shifted: Vec<Point> = points.iter().map(|p| Point::new(p.x - origin.x, p.y - origin.y)).collect();
                closed_path(&shifted)
            }
            ObjectKind::Text(_) | ObjectKind::Rect { .. } | ObjectKind::Image(_) => {
                Rect::from_origin_size(Point::ORIGIN, self.local_size()).to_path(0.1)
            }
        }
    }
}

fn closed_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    for (i, p) in points.iter().enumerate() {
        if i == 0 {
            path.move_to(*p);
        } else {
            path.line_to(*p);
        }
    }
    path.close_path();
    path
}

pub(crate) fn polygon_bounds(points: &[Point]) -> Rect {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    if points.is_empty() {
        Rect::ZERO
    } else {
        Rect::new(min_x, min_y, max_x, max_y)
    }
}

/// Vertices of a star, alternating outer and inner radius, starting at angle 0.
pub fn star_points(spikes: usize, outer_radius: f64, inner_radius: f64) -> Vec<Point> {
    (0..spikes * 2)
        .map(|i| {
            let radius = if i % 2 == 0 { outer_radius } else { inner_radius };
            let angle = i as f64 * PI / spikes as f64;
            Point::new(angle.cos() * radius, angle.sin() * radius)
        })
        .collect()
}

/// One placed visual element.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    #[serde(flatten)]
    pub placement: Placement,
    pub visible: bool,
    pub fill: Color,
    pub stroke: StrokeStyle,
    #[serde(flatten)]
    pub kind: ObjectKind,
}

/// Caller overrides for [`create_object`]. Unset fields take variant defaults.
#[derive(Clone, Debug, Default)]
pub struct ShapeParams {
    pub position: Option<Point>,
    pub fill: Option<Color>,
    pub name: Option<String>,
    pub image: Option<ImageShape>,
}

impl ShapeParams {
    pub fn at(x: f64, y: f64) -> Self {
        ShapeParams { position: Some(Point::new(x, y)), ..Default::default() }
    }

    pub fn with_fill(mut self, fill: Color) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

pub fn default_name(shape: ShapeType) -> String {
    format!("{} Layer", shape.label())
}

/// Builds a scene object with the defaults of its variant.
pub fn create_object(id: ObjectId, shape: ShapeType, params: &ShapeParams) -> Result<SceneObject> {
    let shape_stroke = StrokeStyle { color: Color::BLACK, width: DEFAULT_STROKE_WIDTH };
    let (kind, position, fill, stroke) = match shape {
        ShapeType::Text => (
            ObjectKind::Text(TextShape {
                content: DEFAULT_TEXT.to_string(),
                font_family: DEFAULT_FONT_FAMILY.to_string(),
                font_size: DEFAULT_FONT_SIZE,
                font_weight: FontWeight::Normal,
                font_style: FontStyle::Normal,
            }),
            Point::new(100.0, 100.0),
            Color::BLACK,
            StrokeStyle::NONE,
        ),
        ShapeType::Rect => (
            ObjectKind::Rect { width: 200.0, height: 150.0 },
            Point::new(150.0, 150.0),
            ACCENT_FILL,
            shape_stroke,
        ),
        ShapeType::Circle => (ObjectKind::Circle { radius: 100.0 }, Point::new(150.0, 150.0), CIRCLE_FILL, shape_stroke),
        ShapeType::Triangle => (
            ObjectKind::Triangle { width: 150.0, height: 150.0 },
            Point::new(150.0, 150.0),
            ACCENT_FILL,
            shape_stroke,
        ),
        ShapeType::Polygon => (
            ObjectKind::Polygon { points: star_points(STAR_SPIKES, STAR_OUTER_RADIUS, STAR_INNER_RADIUS) },
            Point::new(150.0, 150.0),
            ACCENT_FILL,
            shape_stroke,
        ),
        ShapeType::Image => {
            let image = params
                .image
                .clone()
                .ok_or_else(|| EditorError::DecodeFailure("image objects need bitmap data".to_string()))?;
            (ObjectKind::Image(image), Point::ORIGIN, Color::TRANSPARENT, StrokeStyle::NONE)
        }
    };
    kind.validate()?;
    let position = params.position.unwrap_or(position);
    Ok(SceneObject {
        id,
        name: params.name.clone().unwrap_or_else(|| default_name(shape)),
        placement: Placement::at(position.x, position.y),
        visible: true,
        fill: params.fill.unwrap_or(fill),
        stroke,
        kind,
    })
}

/// One style edit from the properties panel.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum StyleChange {
    Fill(Color),
    Stroke(Color),
    StrokeWidth(f64),
    FontSize(f64),
    FontWeight(FontWeight),
    FontStyle(FontStyle),
    FontFamily(String),
    Text(String),
}

impl SceneObject {
    pub fn shape_type(&self) -> ShapeType {
        self.kind.shape_type()
    }

    pub fn local_size(&self) -> Size {
        self.kind.local_size()
    }

    /// Axis-aligned bounds on the canvas, rotation and scale included.
    pub fn bounds(&self) -> Rect {
        self.placement.bounds(self.local_size())
    }

    pub fn validate(&self) -> Result<()> {
        self.kind.validate()?;
        ensure_positive("scaleX", self.placement.scale_x)?;
        ensure_positive("scaleY", self.placement.scale_y)?;
        if self.stroke.width < 0.0 || !self.stroke.width.is_finite() {
            return Err(EditorError::invalid_geometry("strokeWidth", self.stroke.width));
        }
        Ok(())
    }

    /// True when the canvas point lies inside the transformed shape.
    pub fn contains(&self, point: Point) -> bool {
        let size = self.local_size();
        let Some(local) = self.placement.to_local(size, point) else {
            return false;
        };
        match &self.kind {
            ObjectKind::Circle { radius } => Circle::new((*radius, *radius), *radius).contains(local),
            ObjectKind::Triangle { .. } | ObjectKind::Polygon { .. } => self.kind.outline().contains(local),
            _ => Rect::from_origin_size(Point::ORIGIN, size).contains(local),
        }
    }

    /// Applies a style edit. Returns `Ok(false)` when the field does not exist on this variant.
    pub fn apply_style(&mut self, change: &StyleChange) -> Result<bool> {
        match (change, &mut self.kind) {
            (StyleChange::Fill(color), _) => self.fill = *color,
            (StyleChange::Stroke(color), _) => self.stroke.color = *color,
            (StyleChange::StrokeWidth(width), _) => {
                if *width < 0.0 || !width.is_finite() {
                    return Err(EditorError::invalid_geometry("strokeWidth", *width));
                }
                self.stroke.width = *width;
            }
            (StyleChange::FontSize(size), ObjectKind::Text(text)) => text.font_size = ensure_positive("fontSize", *size)?,
            (StyleChange::FontWeight(weight), ObjectKind::Text(text)) => text.font_weight = *weight,
            (StyleChange::FontStyle(style), ObjectKind::Text(text)) => text.font_style = *style,
            (StyleChange::FontFamily(family), ObjectKind::Text(text)) => text.font_family = family.clone(),
            (StyleChange::Text(content), ObjectKind::Text(text)) => text.content = content.clone(),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_alternates_radii_from_angle_zero() {
        let points = star_points(STAR_SPIKES, STAR_OUTER_RADIUS, STAR_INNER_RADIUS);
        assert_eq!(points.len(), 10);
        assert_eq!(points[0], Point::new(80.0, 0.0));
        for (i, p) in points.iter().enumerate() {
            let expected = if i % 2 == 0 { 80.0 } else { 40.0 };
            assert!((p.to_vec2().hypot() - expected).abs() < 1e-9, "vertex {i}");
        }
    }

    #[test]
    fn factory_defaults() {
        let rect = create_object(ObjectId(1), ShapeType::Rect, &ShapeParams::default()).unwrap();
        assert_eq!(rect.kind, ObjectKind::Rect { width: 200.0, height: 150.0 });
        assert_eq!(rect.name, "Rectangle Layer");
        assert_eq!(rect.stroke.width, 2.0);
        assert_eq!(rect.fill, ACCENT_FILL);

        let text = create_object(ObjectId(2), ShapeType::Text, &ShapeParams::default().named("Title")).unwrap();
        assert_eq!(text.name, "Title");
        match &text.kind {
            ObjectKind::Text(t) => {
                assert_eq!(t.content, DEFAULT_TEXT);
                assert_eq!(t.font_size, 32.0);
                assert_eq!(t.font_family, "Arial");
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn image_requires_bitmap() {
        assert!(create_object(ObjectId(1), ShapeType::Image, &ShapeParams::default()).is_err());
    }

    #[test]
    fn style_fields_that_do_not_apply_are_ignored() {
        let mut rect = create_object(ObjectId(1), ShapeType::Rect, &ShapeParams::default()).unwrap();
        let before = rect.clone();
        assert!(!rect.apply_style(&StyleChange::FontSize(48.0)).unwrap());
        assert_eq!(rect, before);
        assert!(rect.apply_style(&StyleChange::Fill(Color::WHITE)).unwrap());
        assert_eq!(rect.fill, Color::WHITE);
    }

    #[test]
    fn zero_font_size_is_rejected() {
        let mut text = create_object(ObjectId(1), ShapeType::Text, &ShapeParams::default()).unwrap();
        let before = text.clone();
        assert!(matches!(
            text.apply_style(&StyleChange::FontSize(0.0)),
            Err(EditorError::InvalidGeometry { field: "fontSize", .. })
        ));
        assert_eq!(text, before);
    }

    #[test]
    fn hit_testing_follows_shape() {
        let circle = create_object(ObjectId(1), ShapeType::Circle, &ShapeParams::at(0.0, 0.0)).unwrap();
        assert!(circle.contains(Point::new(100.0, 100.0)));
        assert!(!circle.contains(Point::new(5.0, 5.0)));

        let star = create_object(ObjectId(2), ShapeType::Polygon, &ShapeParams::at(0.0, 0.0)).unwrap();
        let size = star.local_size();
        assert!(star.contains(Point::new(size.width / 2.0, size.height / 2.0)));
    }
}
