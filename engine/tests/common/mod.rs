// Shared by several integration test files; not every helper is used by each.
#![allow(dead_code)]

use design_engine::{Editor, EditorConfig, EditorObserver, LayerSummary, ObjectId};
use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

pub fn editor() -> Editor {
    Editor::new(EditorConfig::default()).unwrap()
}

pub fn small_editor(width: u32, height: u32) -> Editor {
    Editor::new(EditorConfig { canvas_width: width, canvas_height: height, ..Default::default() }).unwrap()
}

/// Solid-color PNG of the given size.
pub fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}

#[derive(Clone, Default)]
pub struct RecordingObserver {
    pub calls: Rc<RefCell<Vec<(Vec<LayerSummary>, Option<ObjectId>)>>>,
}

impl EditorObserver for RecordingObserver {
    fn layers_changed(&mut self, layers: &[LayerSummary], active: Option<ObjectId>) {
        self.calls.borrow_mut().push((layers.to_vec(), active));
    }
}
