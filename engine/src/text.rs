//! Text outlines and measurement.
//!
//! Families are looked up among the system fonts and the bundled DejaVu Sans,
//! which also stands in for any family that is not installed. Each face is
//! parsed once and kept for the life of the process.

use fontdb::{Database, Family, Query, Stretch, Style, Weight, ID};
use rusttype::{point, Font, OutlineBuilder, Scale};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use tiny_skia::{Path, PathBuilder};
use tracing::warn;

use crate::objects::{TextShape, TEXT_LINE_HEIGHT};
use crate::types::{FontStyle, FontWeight};

const BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const BUNDLED_FAMILY: &str = "DejaVu Sans";

fn db() -> &'static Database {
    static DB: OnceLock<Database> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = Database::new();
        db.load_font_data(BUNDLED_FONT.to_vec());
        db.load_system_fonts();
        db
    })
}

fn face_for(family: &str, bold: bool, italic: bool) -> Option<ID> {
    let families = [Family::Name(family), Family::Name(BUNDLED_FAMILY)];
    let query = Query {
        families: &families,
        weight: if bold { Weight::BOLD } else { Weight::NORMAL },
        stretch: Stretch::Normal,
        style: if italic { Style::Italic } else { Style::Normal },
    };
    db().query(&query)
}

fn font_for(text: &TextShape) -> Option<&'static Font<'static>> {
    static CACHE: OnceLock<Mutex<HashMap<ID, Option<&'static Font<'static>>>>> = OnceLock::new();
    let id = face_for(
        &text.font_family,
        text.font_weight == FontWeight::Bold,
        text.font_style == FontStyle::Italic,
    )?;

    let mut cache = CACHE.get_or_init(|| Mutex::new(HashMap::new())).lock().unwrap_or_else(|p| p.into_inner());
    *cache.entry(id).or_insert_with(|| {
        let font = db().with_face_data(id, |data, index| Font::try_from_vec_and_index(data.to_vec(), index)).flatten();
        if font.is_none() {
            warn!(family = text.font_family.as_str(), "font face could not be parsed");
        }
        font.map(|font| &*Box::leak(Box::new(font)))
    })
}

/// Advance width of the widest line, in local units.
pub(crate) fn measure_width(text: &TextShape) -> Option<f64> {
    let font = font_for(text)?;
    let scale = Scale::uniform(text.font_size as f32);
    let width = text
        .content
        .split('\n')
        .map(|line| {
            font.layout(line, scale, point(0.0, 0.0))
                .last()
                .map_or(0.0, |g| g.position().x + g.unpositioned().h_metrics().advance_width)
        })
        .fold(0.0_f32, f32::max);
    Some(width as f64)
}

struct SkiaOutline<'a>(&'a mut PathBuilder);

impl OutlineBuilder for SkiaOutline<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.0.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.0.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.0.close();
    }
}

/// Glyph outlines of `text` in its local frame, first baseline at the ascent.
pub(crate) fn text_path(text: &TextShape) -> Option<Path> {
    let font = font_for(text)?;
    let size = text.font_size as f32;
    let scale = Scale::uniform(size);
    let ascent = font.v_metrics(scale).ascent;

    let mut builder = PathBuilder::new();
    for (line_no, line) in text.content.split('\n').enumerate() {
        let baseline = line_no as f32 * size * TEXT_LINE_HEIGHT as f32 + ascent;
        for glyph in font.layout(line, scale, point(0.0, baseline)) {
            glyph.build_outline(&mut SkiaOutline(&mut builder));
        }
    }
    builder.finish()
}
