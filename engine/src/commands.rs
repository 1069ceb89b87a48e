//! Mutating commands of the editor.
//!
//! Every command that changes the document goes through [`Editor::commit`],
//! which applies it, records it in history and notifies observers.
//! Selection-scoped commands are no-ops without an active object.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::Background;
use crate::engine::Editor;
use crate::error::{EditorError, Result};
use crate::geometry::TransformDelta;
use crate::history::Command;
use crate::image_ops::{self, ImageFilter, ImageSource};
use crate::objects::{create_object, ImageShape, ObjectKind, SceneObject, ShapeParams, StyleChange};
use crate::selection::Selection;
use crate::types::{Alignment, CanvasPreset, Color, ObjectId, ShapeType, ZOrder};

/// Serializable form of every editor command, `{ "action": ..., "params": ... }`.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "action", content = "params", rename_all = "snake_case")]
pub enum EditorCommand {
    AddText,
    AddShape { shape: ShapeType },
    /// `src` must be a `data:` URL.
    AddImage { src: ImageSource },
    Select { id: ObjectId },
    ClearSelection,
    Pick { x: f64, y: f64 },
    Duplicate,
    SetStyle(StyleChange),
    Transform(TransformDelta),
    Rotate,
    FlipHorizontal,
    FlipVertical,
    Align { edge: Alignment },
    ToggleVisibility { id: ObjectId },
    /// Without `id` the active object is moved.
    Reorder {
        #[serde(default)]
        id: Option<ObjectId>,
        direction: ZOrder,
    },
    Remove { id: ObjectId },
    DeleteSelected,
    Rename { id: ObjectId, name: String },
    ApplyFilter(ImageFilter),
    ClearFilters,
    SetBackground(Background),
    Resize { width: u32, height: u32 },
    ApplyPreset { preset: CanvasPreset },
    Undo,
    Redo,
}

/// Result of [`Editor::execute`].
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CommandOutcome {
    /// False for no-ops (nothing selected, inapplicable field, empty history).
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
}

impl CommandOutcome {
    fn changed(changed: bool) -> Self {
        CommandOutcome { changed, id: None }
    }

    fn created(id: ObjectId) -> Self {
        CommandOutcome { changed: true, id: Some(id) }
    }

    fn maybe(id: Option<ObjectId>) -> Self {
        CommandOutcome { changed: id.is_some(), id }
    }
}

fn reorder_label(direction: ZOrder) -> &'static str {
    match direction {
        ZOrder::Front => "Bring to Front",
        ZOrder::Back => "Send to Back",
        ZOrder::Forward => "Bring Forward",
        ZOrder::Backward => "Send Backward",
    }
}

impl Editor {
    pub fn execute(&mut self, command: EditorCommand) -> Result<CommandOutcome> {
        Ok(match command {
            EditorCommand::AddText => CommandOutcome::created(self.add_text()?),
            EditorCommand::AddShape { shape } => CommandOutcome::created(self.add_shape(shape)?),
            EditorCommand::AddImage { src } => match src {
                ImageSource::Embedded(bytes) => CommandOutcome::created(self.add_image(&bytes)?),
                ImageSource::Remote(url) => {
                    return Err(EditorError::DecodeFailure(format!("uploads must carry their bytes, got {url}")))
                }
            },
            EditorCommand::Select { id } => {
                self.select(id)?;
                CommandOutcome { changed: false, id: Some(id) }
            }
            EditorCommand::ClearSelection => {
                self.clear_selection();
                CommandOutcome::default()
            }
            EditorCommand::Pick { x, y } => {
                let id = self.pick(Point::new(x, y));
                CommandOutcome { changed: false, id }
            }
            EditorCommand::Duplicate => CommandOutcome::maybe(self.duplicate_selected()?),
            EditorCommand::SetStyle(change) => CommandOutcome::changed(self.set_style(&change)?),
            EditorCommand::Transform(delta) => CommandOutcome::changed(self.transform_selected(&delta)?),
            EditorCommand::Rotate => CommandOutcome::changed(self.rotate_selected()?),
            EditorCommand::FlipHorizontal => CommandOutcome::changed(self.flip_horizontal()?),
            EditorCommand::FlipVertical => CommandOutcome::changed(self.flip_vertical()?),
            EditorCommand::Align { edge } => CommandOutcome::changed(self.align_selected(edge)?),
            EditorCommand::ToggleVisibility { id } => {
                self.toggle_visibility(id)?;
                CommandOutcome { changed: true, id: Some(id) }
            }
            EditorCommand::Reorder { id: Some(id), direction } => CommandOutcome::changed(self.reorder(id, direction)?),
            EditorCommand::Reorder { id: None, direction } => CommandOutcome::changed(self.reorder_selected(direction)?),
            EditorCommand::Remove { id } => {
                self.remove(id)?;
                CommandOutcome { changed: true, id: Some(id) }
            }
            EditorCommand::DeleteSelected => CommandOutcome::maybe(self.delete_selected()?),
            EditorCommand::Rename { id, name } => CommandOutcome::changed(self.rename(id, &name)?),
            EditorCommand::ApplyFilter(filter) => CommandOutcome::changed(self.apply_filter(filter)?),
            EditorCommand::ClearFilters => CommandOutcome::changed(self.clear_filters()?),
            EditorCommand::SetBackground(background) => CommandOutcome::changed(self.set_background(background)?),
            EditorCommand::Resize { width, height } => CommandOutcome::changed(self.resize(width, height)?),
            EditorCommand::ApplyPreset { preset } => CommandOutcome::changed(self.apply_preset(preset)?),
            EditorCommand::Undo => CommandOutcome::changed(self.undo()?.is_some()),
            EditorCommand::Redo => CommandOutcome::changed(self.redo()?.is_some()),
        })
    }

    /// Applies `command` and records it. Observers are not notified.
    fn record(&mut self, label: &str, command: Command) -> Result<()> {
        command.apply(&mut self.document)?;
        debug!(label, target = ?command.target(), "applied command");
        self.history.record(label, command);
        Ok(())
    }

    /// Applies `command`, records it and notifies observers.
    fn commit(&mut self, label: &str, command: Command) -> Result<()> {
        self.record(label, command)?;
        self.selection = self.selection.revalidate(&self.document);
        self.notify();
        Ok(())
    }

    fn insert_new(&mut self, label: &str, object: SceneObject) -> Result<ObjectId> {
        let id = object.id;
        let index = self.document.len();
        self.record(label, Command::Add { index, object })?;
        self.next_id = self.next_id.max(u64::from(id.0) + 1);
        self.selection = Selection::Selected(id);
        self.notify();
        Ok(id)
    }

    /// Snapshots the object, lets `edit` change a copy and commits the pair.
    /// `edit` returns `Ok(false)` when the change does not apply.
    fn update<F>(&mut self, id: ObjectId, label: &str, edit: F) -> Result<bool>
    where
        F: FnOnce(&mut SceneObject) -> Result<bool>,
    {
        let before = self.document.get(id).cloned().ok_or(EditorError::ObjectNotFound(id))?;
        let mut after = before.clone();
        if !edit(&mut after)? || after == before {
            debug!(label, %id, "edit left the object unchanged");
            return Ok(false);
        }
        after.validate()?;
        self.commit(label, Command::Update { before, after })?;
        Ok(true)
    }

    fn update_active<F>(&mut self, label: &str, edit: F) -> Result<bool>
    where
        F: FnOnce(&mut SceneObject) -> Result<bool>,
    {
        match self.active() {
            Some(id) => self.update(id, label, edit),
            None => {
                debug!(label, "no active object");
                Ok(false)
            }
        }
    }

    // --- creation ---

    pub fn add_text(&mut self) -> Result<ObjectId> {
        self.add_object_with(ShapeType::Text, &ShapeParams::default())
    }

    pub fn add_shape(&mut self, shape: ShapeType) -> Result<ObjectId> {
        self.add_object_with(shape, &ShapeParams::default())
    }

    /// Creates an object with variant defaults overridden by `params` and selects it.
    pub fn add_object_with(&mut self, shape: ShapeType, params: &ShapeParams) -> Result<ObjectId> {
        let object = create_object(self.next_object_id()?, shape, params)?;
        let label = format!("Add {}", shape.label());
        self.insert_new(&label, object)
    }

    /// Decodes an upload, scales it to the configured width and selects it.
    /// Nothing is added when the bytes do not decode.
    pub fn add_image(&mut self, bytes: &[u8]) -> Result<ObjectId> {
        let bitmap = image_ops::decode(bytes)?;
        let (width, height) = bitmap.dimensions();
        let params = ShapeParams {
            image: Some(ImageShape { source: ImageSource::embedded(bytes), width, height, filters: Vec::new() }),
            ..Default::default()
        };
        let mut object = create_object(self.next_object_id()?, ShapeType::Image, &params)?;
        let scale = self.config.upload_width / width as f64;
        object.placement.scale_x = scale;
        object.placement.scale_y = scale;
        self.insert_new("Add Image", object)
    }

    /// Copies the active object, offset down and right, and selects the copy.
    pub fn duplicate_selected(&mut self) -> Result<Option<ObjectId>> {
        let Some(source) = self.active_object().cloned() else {
            debug!("duplicate with no active object");
            return Ok(None);
        };
        let offset = self.config.duplicate_offset;
        let mut copy = source;
        copy.id = self.next_object_id()?;
        copy.placement.x += offset;
        copy.placement.y += offset;
        self.insert_new("Duplicate", copy).map(Some)
    }

    // --- edits on the active object ---

    /// No-op returning `false` when the field does not exist on the active variant.
    pub fn set_style(&mut self, change: &StyleChange) -> Result<bool> {
        self.update_active("Change Style", |object| object.apply_style(change))
    }

    pub fn transform_selected(&mut self, delta: &TransformDelta) -> Result<bool> {
        if delta.is_identity() {
            return Ok(false);
        }
        self.update_active("Transform", |object| {
            object.placement = object.placement.apply(delta);
            Ok(true)
        })
    }

    /// Quarter turn clockwise.
    pub fn rotate_selected(&mut self) -> Result<bool> {
        self.update_active("Rotate", |object| {
            object.placement = object.placement.apply(&TransformDelta::rotate(90.0));
            Ok(true)
        })
    }

    pub fn flip_horizontal(&mut self) -> Result<bool> {
        self.update_active("Flip Horizontal", |object| {
            object.placement = object.placement.apply(&TransformDelta::flip_horizontal());
            Ok(true)
        })
    }

    pub fn flip_vertical(&mut self) -> Result<bool> {
        self.update_active("Flip Vertical", |object| {
            object.placement = object.placement.apply(&TransformDelta::flip_vertical());
            Ok(true)
        })
    }

    /// Horizontal alignment against the canvas. Rotation is not accounted for.
    pub fn align_selected(&mut self, edge: Alignment) -> Result<bool> {
        let canvas_width = self.document.width() as f64;
        let label = match edge {
            Alignment::Left => "Align Left",
            Alignment::Center => "Align Center",
            Alignment::Right => "Align Right",
        };
        self.update_active(label, |object| {
            let width = object.local_size().width;
            object.placement.x = match edge {
                Alignment::Left => 0.0,
                Alignment::Center => canvas_width / 2.0 - width / 2.0,
                Alignment::Right => canvas_width - width * object.placement.scale_x,
            };
            Ok(true)
        })
    }

    /// Replaces the active image's filters with `filter`. Other variants are left alone.
    pub fn apply_filter(&mut self, filter: ImageFilter) -> Result<bool> {
        let label = format!("Apply {} Filter", filter.name());
        self.update_active(&label, |object| match &mut object.kind {
            ObjectKind::Image(image) => {
                image.filters = vec![filter];
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    pub fn clear_filters(&mut self) -> Result<bool> {
        self.update_active("Remove Filters", |object| match &mut object.kind {
            ObjectKind::Image(image) => {
                image.filters.clear();
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    // --- layer panel ---

    /// Flips visibility without touching the selection. Returns the new state.
    pub fn toggle_visibility(&mut self, id: ObjectId) -> Result<bool> {
        self.update(id, "Toggle Visibility", |object| {
            object.visible = !object.visible;
            Ok(true)
        })?;
        Ok(self.document.get(id).is_some_and(|o| o.visible))
    }

    pub fn rename(&mut self, id: ObjectId, name: &str) -> Result<bool> {
        self.update(id, "Rename Layer", |object| {
            object.name = name.to_string();
            Ok(true)
        })
    }

    /// Returns `false` when the object is already at the requested end.
    pub fn reorder(&mut self, id: ObjectId, direction: ZOrder) -> Result<bool> {
        let (from, to) = self.document.reorder(id, direction)?;
        if from == to {
            debug!(%id, ?direction, "object already in place");
            return Ok(false);
        }
        self.history.record(reorder_label(direction), Command::Reorder { id, from, to });
        self.notify();
        Ok(true)
    }

    pub fn reorder_selected(&mut self, direction: ZOrder) -> Result<bool> {
        match self.active() {
            Some(id) => self.reorder(id, direction),
            None => {
                debug!(?direction, "reorder with no active object");
                Ok(false)
            }
        }
    }

    /// Hard removal. Clears the selection when `id` was active.
    pub fn remove(&mut self, id: ObjectId) -> Result<()> {
        let index = self.document.index_of(id).ok_or(EditorError::ObjectNotFound(id))?;
        let object = self.document.objects()[index].clone();
        self.commit("Delete", Command::Remove { index, object })
    }

    pub fn delete_selected(&mut self) -> Result<Option<ObjectId>> {
        let Some(id) = self.active() else {
            debug!("delete with no active object");
            return Ok(None);
        };
        self.remove(id)?;
        Ok(Some(id))
    }

    // --- document ---

    pub fn set_background(&mut self, background: Background) -> Result<bool> {
        if background == *self.document.background() {
            return Ok(false);
        }
        let before = self.document.background().clone();
        self.commit("Change Background", Command::SetBackground { before, after: background })?;
        Ok(true)
    }

    /// Keeps the background image, if any.
    pub fn set_background_color(&mut self, color: Color) -> Result<bool> {
        let background = Background { color, image: self.document.background().image.clone() };
        self.set_background(background)
    }

    /// Changes the frame only; objects keep their coordinates and size.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool> {
        let before = (self.document.width(), self.document.height());
        if before == (width, height) {
            return Ok(false);
        }
        self.commit("Resize Canvas", Command::Resize { before, after: (width, height) })?;
        Ok(true)
    }

    pub fn apply_preset(&mut self, preset: CanvasPreset) -> Result<bool> {
        let (width, height) = preset.size();
        debug!(preset = preset.name(), width, height, "applying canvas preset");
        self.resize(width, height)
    }
}
