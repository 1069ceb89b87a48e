//! Browser bridge. JS drives the editor with JSON command envelopes and
//! reads layers, history and documents back as JSON strings.

use serde_json::{json, Value};
use std::fmt::Display;
use wasm_bindgen::prelude::*;

use crate::commands::EditorCommand;
use crate::config::EditorConfig;
use crate::document::{Document, LayerSummary};
use crate::engine::{Editor, EditorObserver, SubscriptionId};
use crate::io::ExportFormat;
use crate::template::DocumentDescriptor;
use crate::types::{CanvasPreset, ObjectId};

fn error_json(err: impl Display) -> String {
    json!({ "error": err.to_string() }).to_string()
}

fn js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Forwards layer updates to a JS callback as `(layersJson, activeId | null)`.
struct JsLayerObserver {
    callback: js_sys::Function,
}

impl EditorObserver for JsLayerObserver {
    fn layers_changed(&mut self, layers: &[LayerSummary], active: Option<ObjectId>) {
        let layers = serde_json::to_string(layers).unwrap_or_else(|_| "[]".to_string());
        let active = active.map_or(JsValue::NULL, |id| JsValue::from(id.0));
        // A throwing callback must not abort the command that triggered it.
        let _ = self.callback.call2(&JsValue::NULL, &JsValue::from_str(&layers), &active);
    }
}

#[wasm_bindgen]
pub struct EditorEngine {
    editor: Editor,
    layer_subscription: Option<SubscriptionId>,
}

#[wasm_bindgen]
impl EditorEngine {
    /// `config_json` may be omitted or any subset of the configuration fields.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<EditorEngine, JsValue> {
        console_error_panic_hook::set_once();

        let config = match config_json {
            Some(json) => EditorConfig::from_json(&json).map_err(js_error)?,
            None => EditorConfig::default(),
        };
        let editor = Editor::new(config).map_err(js_error)?;
        Ok(EditorEngine { editor, layer_subscription: None })
    }

    pub fn execute_command(&mut self, cmd_json: &str) -> String {
        let mut envelope: Value = match serde_json::from_str(cmd_json) {
            Ok(v) => v,
            Err(e) => return error_json(format!("Invalid JSON: {e}")),
        };
        // Unit commands may arrive with `params: {}` or `params: null`.
        if let Some(map) = envelope.as_object_mut() {
            let empty = match map.get("params") {
                Some(Value::Null) => true,
                Some(Value::Object(params)) => params.is_empty(),
                _ => false,
            };
            if empty {
                map.remove("params");
            }
        }
        let command: EditorCommand = match serde_json::from_value(envelope) {
            Ok(c) => c,
            Err(e) => return error_json(format!("Unknown command: {e}")),
        };
        match self.editor.execute(command) {
            Ok(outcome) => serde_json::to_string(&outcome).unwrap_or_else(error_json),
            Err(e) => error_json(e),
        }
    }

    /// Adds raw upload bytes from the file picker.
    pub fn add_image(&mut self, data: &[u8]) -> String {
        match self.editor.add_image(data) {
            Ok(id) => json!({ "changed": true, "id": id }).to_string(),
            Err(e) => error_json(e),
        }
    }

    pub fn undo(&mut self) -> bool {
        matches!(self.editor.undo(), Ok(Some(_)))
    }

    pub fn redo(&mut self) -> bool {
        matches!(self.editor.redo(), Ok(Some(_)))
    }

    /// Replaces any previous layer callback.
    pub fn subscribe_layers(&mut self, callback: js_sys::Function) {
        if let Some(previous) = self.layer_subscription.take() {
            self.editor.unsubscribe(previous);
        }
        self.layer_subscription = Some(self.editor.subscribe(JsLayerObserver { callback }));
    }

    pub fn unsubscribe_layers(&mut self) {
        if let Some(previous) = self.layer_subscription.take() {
            self.editor.unsubscribe(previous);
        }
    }

    pub fn get_layers(&self) -> String {
        serde_json::to_string(&self.editor.layers()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn get_selection(&self) -> String {
        serde_json::to_string(&self.editor.selection()).unwrap_or_else(|_| "null".to_string())
    }

    pub fn get_active_object(&self) -> String {
        serde_json::to_string(&self.editor.active_object()).unwrap_or_else(|_| "null".to_string())
    }

    pub fn get_history(&self) -> String {
        serde_json::to_string(&self.editor.history_labels()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn get_presets(&self) -> String {
        let presets: Vec<Value> = CanvasPreset::ALL
            .iter()
            .map(|p| {
                let (width, height) = p.size();
                json!({ "id": p, "name": p.name(), "width": width, "height": height })
            })
            .collect();
        Value::Array(presets).to_string()
    }

    /// The current design as a descriptor, for the persistence API.
    pub fn get_document(&self) -> String {
        self.editor.document().to_json().unwrap_or_else(error_json)
    }

    pub fn load_document(&mut self, json: &str) -> String {
        match Document::from_json(json) {
            Ok(document) => {
                self.editor.load_document(document);
                json!({ "success": true }).to_string()
            }
            Err(e) => error_json(e),
        }
    }

    pub fn load_template(&mut self, json: &str) -> String {
        let loaded = DocumentDescriptor::from_json(json).and_then(|d| self.editor.load_template(&d));
        match loaded {
            Ok(()) => json!({ "success": true, "objects": self.editor.document().len() }).to_string(),
            Err(e) => error_json(e),
        }
    }

    /// Encoded bitmap bytes. `format` is `"png"` or `"jpeg"`; a missing scale uses the configured multiplier.
    pub fn export_bitmap(&self, format: &str, scale: Option<f64>) -> Result<Vec<u8>, JsValue> {
        let format = self.parse_format(format)?;
        let scale = scale.unwrap_or(self.editor.config().export_multiplier);
        self.editor.export(format, scale).map(|image| image.bytes).map_err(js_error)
    }

    pub fn export_data_url(&self, format: &str, scale: Option<f64>) -> Result<String, JsValue> {
        let format = self.parse_format(format)?;
        let scale = scale.unwrap_or(self.editor.config().export_multiplier);
        self.editor.export(format, scale).map(|image| image.to_data_url()).map_err(js_error)
    }

    pub fn export_file_name(&self, format: &str) -> Result<String, JsValue> {
        let format = self.parse_format(format)?;
        Ok(format!("{}.{}", self.editor.config().export_basename, format.extension()))
    }
}

impl EditorEngine {
    fn parse_format(&self, format: &str) -> Result<ExportFormat, JsValue> {
        match format.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(self.editor.default_export_format(true)),
            other => Err(JsValue::from_str(&format!("unsupported export format '{other}'"))),
        }
    }
}
