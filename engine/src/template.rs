//! Template descriptors and the materializer that expands them into documents.
//!
//! A descriptor is the JSON shape the template gallery stores:
//! `{ backgroundColor, backgroundImage, elements: [{ type, left, top, ... }] }`.
//! The same shape is used to serialize live documents, so saving and loading
//! a design goes through the materializer too.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::UnknownVariantPolicy;
use crate::document::{Background, Document};
use crate::error::{EditorError, Result};
use crate::geometry::Placement;
use crate::image_ops::{self, ImageFilter, ImageSource};
use crate::objects::{
    star_points, ImageShape, ObjectKind, SceneObject, StrokeStyle, TextShape, ACCENT_FILL, CIRCLE_FILL,
    DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, DEFAULT_STROKE_WIDTH, STAR_INNER_RADIUS, STAR_OUTER_RADIUS, STAR_SPIKES,
};
use crate::render::AssetResolver;
use crate::types::{Color, FontStyle, FontWeight, ObjectId, ShapeType};

pub const TEMPLATE_TEXT: &str = "Edit me";

/// Declarative document description.
///
/// Elements stay untyped until materialization so one unknown `type` does not
/// make the whole descriptor unreadable.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<ImageSource>,
    #[serde(default)]
    pub elements: Vec<Value>,
}

impl DocumentDescriptor {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Fields an element may carry. Absent fields take per-variant defaults.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ElementSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flip_x: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flip_y: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<ImageSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<ImageFilter>>,
}

impl ElementSpec {
    /// Full description of a live object. Every field is written so reading it
    /// back needs no defaults.
    pub fn from_object(object: &SceneObject) -> Self {
        let p = &object.placement;
        let mut spec = ElementSpec {
            kind: object.shape_type().tag().to_string(),
            id: Some(object.id),
            name: Some(object.name.clone()),
            left: Some(p.x),
            top: Some(p.y),
            fill: Some(object.fill),
            stroke: Some(object.stroke.color),
            stroke_width: Some(object.stroke.width),
            angle: Some(p.rotation),
            scale_x: Some(p.scale_x),
            scale_y: Some(p.scale_y),
            flip_x: Some(p.flip_h),
            flip_y: Some(p.flip_v),
            visible: Some(object.visible),
            ..Default::default()
        };
        match &object.kind {
            ObjectKind::Text(text) => {
                spec.text = Some(text.content.clone());
                spec.font_size = Some(text.font_size);
                spec.font_family = Some(text.font_family.clone());
                spec.font_weight = Some(text.font_weight);
                spec.font_style = Some(text.font_style);
            }
            ObjectKind::Rect { width, height } | ObjectKind::Triangle { width, height } => {
                spec.width = Some(*width);
                spec.height = Some(*height);
            }
            ObjectKind::Circle { radius } => spec.radius = Some(*radius),
            ObjectKind::Polygon { points } => spec.points = Some(points.clone()),
            ObjectKind::Image(image) => {
                spec.src = Some(image.source.clone());
                spec.width = Some(image.width as f64);
                spec.height = Some(image.height as f64);
                spec.filters = Some(image.filters.clone());
            }
        }
        spec
    }
}

/// Expands descriptors into documents.
pub struct Materializer<'a> {
    policy: UnknownVariantPolicy,
    default_size: (u32, u32),
    assets: Option<&'a dyn AssetResolver>,
}

impl<'a> Materializer<'a> {
    pub fn new(policy: UnknownVariantPolicy, default_size: (u32, u32)) -> Self {
        Materializer { policy, default_size, assets: None }
    }

    /// Lets image elements with a remote `src` and no explicit size be measured.
    pub fn with_assets(mut self, assets: &'a dyn AssetResolver) -> Self {
        self.assets = Some(assets);
        self
    }

    /// Element `i` of the descriptor becomes object `i` of the document.
    pub fn materialize(&self, descriptor: &DocumentDescriptor) -> Result<Document> {
        let width = descriptor.width.unwrap_or(self.default_size.0);
        let height = descriptor.height.unwrap_or(self.default_size.1);
        let mut doc = Document::new(width, height)?;
        doc.set_background(Background {
            color: descriptor.background_color.unwrap_or(Color::WHITE),
            image: descriptor.background_image.clone(),
        });

        let mut next_id = descriptor
            .elements
            .iter()
            .filter_map(|e| e.get("id").and_then(Value::as_u64))
            .max()
            .map_or(1, |max| max.saturating_add(1));

        let mut skipped = 0;
        for (index, raw) in descriptor.elements.iter().enumerate() {
            let Some(spec) = self.read_element(index, raw)? else {
                skipped += 1;
                continue;
            };
            let id = match spec.id {
                Some(id) => id,
                None => {
                    let id = u32::try_from(next_id).map_err(|_| EditorError::IdSpaceExhausted)?;
                    next_id += 1;
                    ObjectId(id)
                }
            };
            match self.build(id, &spec)? {
                Some(object) => doc.add_object(object)?,
                None => skipped += 1,
            }
        }
        info!(objects = doc.len(), skipped, width, height, "materialized document");
        Ok(doc)
    }

    fn read_element(&self, index: usize, raw: &Value) -> Result<Option<ElementSpec>> {
        let tag = raw.get("type").and_then(Value::as_str).unwrap_or_default();
        if let Err(err) = tag.parse::<ShapeType>() {
            return match self.policy {
                UnknownVariantPolicy::Reject => Err(err),
                UnknownVariantPolicy::Skip => {
                    warn!(index, tag, "skipping element with unknown type");
                    Ok(None)
                }
            };
        }
        Ok(Some(ElementSpec::deserialize(raw)?))
    }

    fn build(&self, id: ObjectId, spec: &ElementSpec) -> Result<Option<SceneObject>> {
        let shape: ShapeType = spec.kind.parse()?;
        let outlined = StrokeStyle {
            color: spec.stroke.unwrap_or(Color::BLACK),
            width: spec.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH),
        };
        let (kind, origin, fill, stroke, name) = match shape {
            ShapeType::Text => (
                ObjectKind::Text(TextShape {
                    content: spec.text.clone().unwrap_or_else(|| TEMPLATE_TEXT.to_string()),
                    font_family: spec.font_family.clone().unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
                    font_size: spec.font_size.unwrap_or(DEFAULT_FONT_SIZE),
                    font_weight: spec.font_weight.unwrap_or_default(),
                    font_style: spec.font_style.unwrap_or_default(),
                }),
                (100.0, 100.0),
                Color::BLACK,
                StrokeStyle {
                    color: spec.stroke.unwrap_or(Color::TRANSPARENT),
                    width: spec.stroke_width.unwrap_or(0.0),
                },
                "Text Layer",
            ),
            ShapeType::Rect => (
                ObjectKind::Rect { width: spec.width.unwrap_or(200.0), height: spec.height.unwrap_or(150.0) },
                (150.0, 150.0),
                ACCENT_FILL,
                outlined,
                "Rectangle",
            ),
            ShapeType::Circle => (
                ObjectKind::Circle { radius: spec.radius.unwrap_or(100.0) },
                (150.0, 150.0),
                CIRCLE_FILL,
                outlined,
                "Circle",
            ),
            ShapeType::Triangle => (
                ObjectKind::Triangle { width: spec.width.unwrap_or(150.0), height: spec.height.unwrap_or(150.0) },
                (150.0, 150.0),
                ACCENT_FILL,
                outlined,
                "Triangle",
            ),
            ShapeType::Polygon => (
                ObjectKind::Polygon {
                    points: spec
                        .points
                        .clone()
                        .unwrap_or_else(|| star_points(STAR_SPIKES, STAR_OUTER_RADIUS, STAR_INNER_RADIUS)),
                },
                (150.0, 150.0),
                ACCENT_FILL,
                outlined,
                "Star",
            ),
            ShapeType::Image => {
                let Some(image) = self.image_shape(spec)? else {
                    return Ok(None);
                };
                (
                    ObjectKind::Image(image),
                    (100.0, 100.0),
                    Color::TRANSPARENT,
                    StrokeStyle {
                        color: spec.stroke.unwrap_or(Color::TRANSPARENT),
                        width: spec.stroke_width.unwrap_or(0.0),
                    },
                    "Image",
                )
            }
        };

        let object = SceneObject {
            id,
            name: spec.name.clone().unwrap_or_else(|| name.to_string()),
            placement: Placement {
                x: spec.left.unwrap_or(origin.0),
                y: spec.top.unwrap_or(origin.1),
                rotation: spec.angle.unwrap_or(0.0),
                scale_x: spec.scale_x.unwrap_or(1.0),
                scale_y: spec.scale_y.unwrap_or(1.0),
                flip_h: spec.flip_x.unwrap_or(false),
                flip_v: spec.flip_y.unwrap_or(false),
            },
            visible: spec.visible.unwrap_or(true),
            fill: spec.fill.unwrap_or(fill),
            stroke,
            kind,
        };
        object.validate()?;
        Ok(Some(object))
    }

    /// Resolves the intrinsic size of an image element. `Ok(None)` skips it.
    fn image_shape(&self, spec: &ElementSpec) -> Result<Option<ImageShape>> {
        let Some(source) = spec.src.clone() else {
            warn!(name = spec.name.as_deref(), "skipping image element without src");
            return Ok(None);
        };
        let filters = spec.filters.clone().unwrap_or_default();
        if let (Some(width), Some(height)) = (spec.width, spec.height) {
            return Ok(Some(ImageShape { source, width: width.round() as u32, height: height.round() as u32, filters }));
        }
        let bitmap = match &source {
            ImageSource::Embedded(bytes) => image_ops::decode(bytes)?,
            ImageSource::Remote(url) => match self.assets.and_then(|a| a.resolve(url)) {
                Some(bytes) => image_ops::decode(&bytes)?,
                None => {
                    warn!(src = url.as_str(), "skipping image element whose size cannot be determined");
                    return Ok(None);
                }
            },
        };
        Ok(Some(ImageShape { source, width: bitmap.width(), height: bitmap.height(), filters }))
    }
}

impl Document {
    /// Descriptor holding every field of every object, ids included.
    pub fn to_descriptor(&self) -> Result<DocumentDescriptor> {
        Ok(DocumentDescriptor {
            width: Some(self.width()),
            height: Some(self.height()),
            background_color: Some(self.background().color),
            background_image: self.background().image.clone(),
            elements: self
                .objects()
                .iter()
                .map(|o| serde_json::to_value(ElementSpec::from_object(o)))
                .collect::<serde_json::Result<_>>()?,
        })
    }

    /// Inverse of [`Document::to_descriptor`]. Unknown element types are an error here.
    pub fn from_descriptor(descriptor: &DocumentDescriptor) -> Result<Document> {
        let (width, height) = match (descriptor.width, descriptor.height) {
            (Some(w), Some(h)) => (w, h),
            _ => return Err(EditorError::invalid_geometry("width", 0.0)),
        };
        Materializer::new(UnknownVariantPolicy::Reject, (width, height)).materialize(descriptor)
    }

    pub fn to_json(&self) -> Result<String> {
        self.to_descriptor()?.to_json()
    }

    pub fn from_json(json: &str) -> Result<Document> {
        Document::from_descriptor(&DocumentDescriptor::from_json(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn materialize(value: Value) -> Result<Document> {
        let descriptor: DocumentDescriptor = serde_json::from_value(value).unwrap();
        Materializer::new(UnknownVariantPolicy::Skip, (1080, 1080)).materialize(&descriptor)
    }

    #[test]
    fn absent_fields_take_template_defaults() {
        let doc = materialize(json!({ "elements": [{ "type": "text" }, { "type": "rect" }, { "type": "circle" }] })).unwrap();
        let [text, rect, circle] = doc.objects() else { panic!("expected three objects") };
        assert_eq!(text.placement.position(), Point::new(100.0, 100.0));
        assert!(matches!(&text.kind, ObjectKind::Text(t) if t.content == TEMPLATE_TEXT && t.font_size == 32.0));
        assert_eq!(text.name, "Text Layer");
        assert_eq!(rect.kind, ObjectKind::Rect { width: 200.0, height: 150.0 });
        assert_eq!(rect.fill, ACCENT_FILL);
        assert_eq!(circle.kind, ObjectKind::Circle { radius: 100.0 });
        assert_eq!(circle.fill, CIRCLE_FILL);
        assert_eq!(doc.background().color, Color::WHITE);
    }

    #[test]
    fn explicit_zero_stroke_is_kept() {
        let doc = materialize(json!({ "elements": [{ "type": "rect", "strokeWidth": 0 }] })).unwrap();
        assert_eq!(doc.objects()[0].stroke.width, 0.0);
    }

    #[test]
    fn unknown_types_follow_policy() {
        let value = json!({ "elements": [{ "type": "video" }, { "type": "circle" }] });
        let doc = materialize(value.clone()).unwrap();
        assert_eq!(doc.len(), 1);

        let descriptor: DocumentDescriptor = serde_json::from_value(value).unwrap();
        let strict = Materializer::new(UnknownVariantPolicy::Reject, (1080, 1080));
        assert!(matches!(strict.materialize(&descriptor), Err(EditorError::UnknownVariant(tag)) if tag == "video"));
    }

    #[test]
    fn non_positive_geometry_is_rejected() {
        let result = materialize(json!({ "elements": [{ "type": "circle", "radius": 0 }] }));
        assert!(matches!(result, Err(EditorError::InvalidGeometry { field: "radius", .. })));
    }

    #[test]
    fn image_without_src_is_skipped() {
        let doc = materialize(json!({ "elements": [{ "type": "image", "left": 5 }] })).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn ids_are_preserved_and_filled_in() {
        let doc = materialize(json!({ "elements": [{ "type": "rect", "id": 7 }, { "type": "rect" }] })).unwrap();
        let ids: Vec<ObjectId> = doc.objects().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![ObjectId(7), ObjectId(8)]);
    }
}
