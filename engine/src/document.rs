//! The canvas document: size, background and the ordered object list.
//!
//! Vector order is paint order. Index 0 paints first and sits furthest back.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, EditorError, Result};
use crate::image_ops::ImageSource;
use crate::objects::SceneObject;
use crate::types::{Color, ObjectId, ShapeType, ZOrder};

/// Canvas backdrop. The image, when present, is stretched over the whole
/// document and is never selectable.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Background {
    pub color: Color,
    pub image: Option<ImageSource>,
}

impl Background {
    pub fn color(color: Color) -> Self {
        Background { color, image: None }
    }
}

impl Default for Background {
    fn default() -> Self {
        Background::color(Color::WHITE)
    }
}

/// Row of the layer panel.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    pub id: ObjectId,
    pub name: String,
    pub kind: ShapeType,
    pub visible: bool,
}

/// Documents are read back through [`Document::from_descriptor`], which checks ids and geometry.
#[derive(Serialize, Clone, PartialEq, Debug)]
pub struct Document {
    width: u32,
    height: u32,
    background: Background,
    objects: Vec<SceneObject>,
}

impl Document {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        ensure_positive("width", width as f64)?;
        ensure_positive("height", height as f64)?;
        Ok(Document { width, height, background: Background::default(), objects: Vec::new() })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Objects in paint order.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn max_id(&self) -> Option<ObjectId> {
        self.objects.iter().map(|o| o.id).max()
    }

    /// Appends on top of the paint order.
    pub fn add_object(&mut self, object: SceneObject) -> Result<()> {
        let index = self.objects.len();
        self.insert_object(index, object)
    }

    pub(crate) fn insert_object(&mut self, index: usize, object: SceneObject) -> Result<()> {
        if self.contains(object.id) {
            return Err(EditorError::DuplicateId(object.id));
        }
        object.validate()?;
        let index = index.min(self.objects.len());
        self.objects.insert(index, object);
        Ok(())
    }

    /// Hard removal. Returns the object and the index it occupied.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<(usize, SceneObject)> {
        let index = self.index_of(id).ok_or(EditorError::ObjectNotFound(id))?;
        Ok((index, self.objects.remove(index)))
    }

    /// Moves an object in the paint order. Returns `(from, to)` indices.
    pub fn reorder(&mut self, id: ObjectId, direction: ZOrder) -> Result<(usize, usize)> {
        let from = self.index_of(id).ok_or(EditorError::ObjectNotFound(id))?;
        let last = self.objects.len() - 1;
        let to = match direction {
            ZOrder::Front => last,
            ZOrder::Back => 0,
            ZOrder::Forward => (from + 1).min(last),
            ZOrder::Backward => from.saturating_sub(1),
        };
        self.move_to(from, to);
        Ok((from, to))
    }

    pub(crate) fn move_to(&mut self, from: usize, to: usize) {
        if from == to || from >= self.objects.len() || to >= self.objects.len() {
            return;
        }
        let object = self.objects.remove(from);
        self.objects.insert(to, object);
    }

    pub(crate) fn replace_object(&mut self, object: SceneObject) -> Result<SceneObject> {
        let slot = self.get_mut(object.id).ok_or(EditorError::ObjectNotFound(object.id))?;
        Ok(std::mem::replace(slot, object))
    }

    pub fn set_background(&mut self, background: Background) -> Background {
        std::mem::replace(&mut self.background, background)
    }

    /// Changes the frame only. Objects keep their size and position.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(u32, u32)> {
        ensure_positive("width", width as f64)?;
        ensure_positive("height", height as f64)?;
        let previous = (self.width, self.height);
        self.width = width;
        self.height = height;
        Ok(previous)
    }

    /// Layer panel rows, topmost first.
    pub fn layers(&self) -> Vec<LayerSummary> {
        self.objects
            .iter()
            .enumerate()
            .rev()
            .map(|(index, object)| LayerSummary {
                id: object.id,
                name: if object.name.is_empty() {
                    format!("{} {}", object.shape_type().tag(), index + 1)
                } else {
                    object.name.clone()
                },
                kind: object.shape_type(),
                visible: object.visible,
            })
            .collect()
    }

    /// Topmost visible object under `point`.
    pub fn hit_test(&self, point: Point) -> Option<ObjectId> {
        self.objects.iter().rev().find(|o| o.visible && o.contains(point)).map(|o| o.id)
    }
}
