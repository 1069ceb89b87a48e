//! The editing session: one document, its history, the active selection and
//! the observers that mirror it (layer panel, canvas view).

use kurbo::Point;
use tracing::{debug, info};

use crate::catalog::TemplateSource;
use crate::config::EditorConfig;
use crate::document::{Background, Document, LayerSummary};
use crate::error::{EditorError, Result};
use crate::history::History;
use crate::io::{export_bitmap, DesignId, DesignStore, ExportFormat, ExportSink, ExportedImage};
use crate::objects::SceneObject;
use crate::render::{AssetResolver, Renderer};
use crate::selection::Selection;
use crate::template::{DocumentDescriptor, Materializer};
use crate::types::ObjectId;

/// Receives the layer list, topmost first, after every change.
pub trait EditorObserver {
    fn layers_changed(&mut self, layers: &[LayerSummary], active: Option<ObjectId>);
}

impl<F> EditorObserver for F
where
    F: FnMut(&[LayerSummary], Option<ObjectId>),
{
    fn layers_changed(&mut self, layers: &[LayerSummary], active: Option<ObjectId>) {
        self(layers, active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub struct Editor {
    pub(crate) document: Document,
    pub(crate) history: History,
    pub(crate) selection: Selection,
    pub(crate) next_id: u64,
    pub(crate) config: EditorConfig,
    observers: Vec<(SubscriptionId, Box<dyn EditorObserver>)>,
    next_subscription: u64,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Result<Self> {
        config.validate()?;
        let mut document = Document::new(config.canvas_width, config.canvas_height)?;
        document.set_background(Background::color(config.background));
        Ok(Editor {
            document,
            history: History::new(config.history_limit),
            selection: Selection::Idle,
            next_id: 1,
            config,
            observers: Vec::new(),
            next_subscription: 0,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn active(&self) -> Option<ObjectId> {
        self.selection.active()
    }

    pub fn active_object(&self) -> Option<&SceneObject> {
        self.active().and_then(|id| self.document.get(id))
    }

    pub fn layers(&self) -> Vec<LayerSummary> {
        self.document.layers()
    }

    /// Owned copy of the document for exporting or saving off the edit path.
    pub fn snapshot(&self) -> Document {
        self.document.clone()
    }

    pub fn subscribe(&mut self, observer: impl EditorObserver + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    pub(crate) fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let layers = self.document.layers();
        let active = self.selection.active();
        for (_, observer) in self.observers.iter_mut() {
            observer.layers_changed(&layers, active);
        }
    }

    /// Id the next created object will get.
    pub(crate) fn next_object_id(&self) -> Result<ObjectId> {
        u32::try_from(self.next_id).map(ObjectId).map_err(|_| EditorError::IdSpaceExhausted)
    }

    // --- selection ---

    pub fn select(&mut self, id: ObjectId) -> Result<()> {
        if !self.document.contains(id) {
            return Err(EditorError::ObjectNotFound(id));
        }
        self.selection = Selection::Selected(id);
        self.notify();
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if self.selection != Selection::Idle {
            self.selection = Selection::Idle;
            self.notify();
        }
    }

    /// Selects the topmost visible object under `point`; a miss clears the selection.
    pub fn pick(&mut self, point: Point) -> Option<ObjectId> {
        self.selection = Selection::pick(&self.document, point);
        self.notify();
        self.selection.active()
    }

    // --- history ---

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_labels(&self) -> Vec<String> {
        self.history.labels()
    }

    /// Returns the label of the undone step, `None` when history is empty.
    pub fn undo(&mut self) -> Result<Option<String>> {
        let label = self.history.undo(&mut self.document)?.map(|e| e.label.clone());
        if label.is_some() {
            self.selection = self.selection.revalidate(&self.document);
            self.notify();
        }
        Ok(label)
    }

    pub fn redo(&mut self) -> Result<Option<String>> {
        let label = self.history.redo(&mut self.document)?.map(|e| e.label.clone());
        if label.is_some() {
            self.selection = self.selection.revalidate(&self.document);
            self.notify();
        }
        Ok(label)
    }

    // --- whole-document operations ---

    /// Replaces the document wholesale. History and selection start over.
    pub fn load_document(&mut self, document: Document) {
        self.next_id = document.max_id().map_or(1, |id| u64::from(id.0) + 1);
        self.document = document;
        self.history.clear();
        self.selection = Selection::Idle;
        self.notify();
    }

    /// Discards the current design for an empty canvas of the configured size.
    pub fn new_document(&mut self) -> Result<()> {
        let mut document = Document::new(self.config.canvas_width, self.config.canvas_height)?;
        document.set_background(Background::color(self.config.background));
        self.load_document(document);
        Ok(())
    }

    pub fn load_template(&mut self, descriptor: &DocumentDescriptor) -> Result<()> {
        let document = self.materializer().materialize(descriptor)?;
        info!(objects = document.len(), "loaded template");
        self.load_document(document);
        Ok(())
    }

    /// Same as [`Editor::load_template`] with remote images measured through `assets`.
    pub fn load_template_with(&mut self, descriptor: &DocumentDescriptor, assets: &dyn AssetResolver) -> Result<()> {
        let document = self.materializer().with_assets(assets).materialize(descriptor)?;
        info!(objects = document.len(), "loaded template");
        self.load_document(document);
        Ok(())
    }

    pub fn load_catalog_template(&mut self, source: &dyn TemplateSource, id: u32) -> Result<()> {
        let entry = source
            .by_id(id)
            .ok_or_else(|| EditorError::Persistence(format!("no template with id {id}")))?;
        debug!(id, title = entry.title.as_str(), "opening template");
        let descriptor = entry.template.clone();
        self.load_template(&descriptor)
    }

    fn materializer(&self) -> Materializer<'static> {
        Materializer::new(self.config.unknown_variants, (self.config.canvas_width, self.config.canvas_height))
    }

    pub fn save_to(&self, store: &mut dyn DesignStore) -> Result<DesignId> {
        let id = store.save(&self.document.to_json()?)?;
        info!(%id, objects = self.document.len(), "saved design");
        Ok(id)
    }

    pub fn load_from(&mut self, store: &dyn DesignStore, id: &DesignId) -> Result<()> {
        let document = Document::from_json(&store.load(id)?)?;
        info!(%id, objects = document.len(), "loaded design");
        self.load_document(document);
        Ok(())
    }

    // --- export ---

    /// PNG, or JPEG at the configured quality.
    pub fn default_export_format(&self, jpeg: bool) -> ExportFormat {
        if jpeg {
            ExportFormat::Jpeg { quality: self.config.jpeg_quality }
        } else {
            ExportFormat::Png
        }
    }

    pub fn export(&self, format: ExportFormat, scale: f64) -> Result<ExportedImage> {
        export_bitmap(&self.document, format, scale, &Renderer::new())
    }

    pub fn export_with(&self, format: ExportFormat, scale: f64, assets: &dyn AssetResolver) -> Result<ExportedImage> {
        export_bitmap(&self.document, format, scale, &Renderer::with_assets(assets))
    }

    /// Exports at the configured multiplier and hands the result to `sink`.
    pub fn export_to(&self, sink: &mut dyn ExportSink, format: ExportFormat) -> Result<String> {
        let image = self.export(format, self.config.export_multiplier)?;
        let file_name = image.file_name(&self.config.export_basename);
        sink.deliver(&file_name, &image)?;
        Ok(file_name)
    }
}
