//! Canvas editing engine for a template-based design tool.
//!
//! A [`Document`] holds an ordered list of [`SceneObject`]s; the [`Editor`]
//! mutates it through reversible commands, keeps the single active
//! selection, and reports layer changes to observers. Templates expand into
//! documents through the [`Materializer`], and documents rasterize to PNG or
//! JPEG with [`export_bitmap`].

pub mod types;
pub mod error;
pub mod geometry;
pub mod image_ops;
pub mod objects;
pub mod document;
pub mod history;
pub mod selection;
pub mod config;
pub mod template;
pub mod catalog;
pub mod text;
pub mod render;
pub mod io;
pub mod engine;
pub mod commands;
pub mod bindings;

pub use bindings::EditorEngine;
pub use catalog::{TemplateCatalog, TemplateEntry, TemplateSource};
pub use commands::{CommandOutcome, EditorCommand};
pub use config::{EditorConfig, UnknownVariantPolicy};
pub use document::{Background, Document, LayerSummary};
pub use engine::{Editor, EditorObserver, SubscriptionId};
pub use error::{EditorError, Result};
pub use geometry::{Placement, TransformDelta};
pub use image_ops::{ImageFilter, ImageSource};
pub use io::{export_bitmap, DesignId, DesignStore, ExportFormat, ExportSink, ExportedImage, MemoryDesignStore};
pub use objects::*;
pub use render::{AssetResolver, Renderer};
pub use selection::Selection;
pub use template::{DocumentDescriptor, ElementSpec, Materializer};
pub use types::*;
