//! Rasterizes a document with tiny-skia.
//!
//! Rendering only reads the document, so a cloned snapshot can be exported
//! while the editor keeps changing the live one.

use image::RgbaImage;
use kurbo::{Affine, BezPath, PathEl};
use std::borrow::Cow;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};
use tracing::warn;

use crate::document::Document;
use crate::error::{ensure_positive, EditorError, Result};
use crate::image_ops::{self, ImageSource};
use crate::objects::{ImageShape, ObjectKind, SceneObject, StrokeStyle};
use crate::text;
use crate::types::Color;

/// Supplies bytes for remote image references (template backgrounds, gallery assets).
pub trait AssetResolver {
    fn resolve(&self, url: &str) -> Option<Vec<u8>>;
}

#[derive(Default)]
pub struct Renderer<'a> {
    assets: Option<&'a dyn AssetResolver>,
}

impl<'a> Renderer<'a> {
    pub fn new() -> Self {
        Renderer { assets: None }
    }

    pub fn with_assets(assets: &'a dyn AssetResolver) -> Self {
        Renderer { assets: Some(assets) }
    }

    /// Draws background then every visible object in paint order.
    pub fn render(&self, doc: &Document, scale: f64) -> Result<Pixmap> {
        ensure_positive("scale", scale)?;
        let width = (doc.width() as f64 * scale).round() as u32;
        let height = (doc.height() as f64 * scale).round() as u32;
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| EditorError::Encode(format!("cannot allocate a {width}x{height} bitmap")))?;

        let background = doc.background();
        pixmap.fill(skia_color(background.color));
        if let Some(source) = &background.image {
            if let Some(bitmap) = self.bitmap(source).and_then(|img| to_pixmap(&img)) {
                let stretch = Transform::from_scale(
                    width as f32 / bitmap.width() as f32,
                    height as f32 / bitmap.height() as f32,
                );
                pixmap.draw_pixmap(0, 0, bitmap.as_ref(), &image_paint(), stretch, None);
            }
        }

        let base = Transform::from_scale(scale as f32, scale as f32);
        for object in doc.objects().iter().filter(|o| o.visible) {
            self.render_object(&mut pixmap, object, base);
        }
        Ok(pixmap)
    }

    /// Renders to straight RGBA, ready for encoding.
    pub fn render_rgba(&self, doc: &Document, scale: f64) -> Result<RgbaImage> {
        let pixmap = self.render(doc, scale)?;
        let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
        for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
        }
        Ok(out)
    }

    fn render_object(&self, pixmap: &mut Pixmap, object: &SceneObject, base: Transform) {
        let affine = object.placement.affine(object.local_size());
        let transform = base.pre_concat(to_skia(affine));

        match &object.kind {
            ObjectKind::Text(shape) => {
                if let Some(path) = text::text_path(shape) {
                    fill_and_stroke(pixmap, &path, object.fill, &object.stroke, transform);
                }
            }
            ObjectKind::Image(shape) => self.draw_image(pixmap, shape, transform),
            kind => {
                if let Some(path) = to_skia_path(&kind.outline()) {
                    fill_and_stroke(pixmap, &path, object.fill, &object.stroke, transform);
                }
            }
        }
    }

    fn draw_image(&self, pixmap: &mut Pixmap, shape: &ImageShape, transform: Transform) {
        let Some(mut bitmap) = self.bitmap(&shape.source) else {
            return;
        };
        image_ops::apply_filters(&mut bitmap, &shape.filters);
        let Some(mut tile) = to_pixmap(&bitmap) else {
            return;
        };
        // Intrinsic size is authoritative; stretch if the source decoded at another size.
        if tile.width() != shape.width || tile.height() != shape.height {
            if let Some(resized) = stretch_pixmap(&tile, shape.width, shape.height) {
                tile = resized;
            }
        }
        pixmap.draw_pixmap(0, 0, tile.as_ref(), &image_paint(), transform, None);
    }

    fn bitmap(&self, source: &ImageSource) -> Option<RgbaImage> {
        let bytes: Cow<'_, [u8]> = match source {
            ImageSource::Embedded(bytes) => Cow::Borrowed(bytes.as_slice()),
            ImageSource::Remote(url) => match self.assets.and_then(|a| a.resolve(url)) {
                Some(bytes) => Cow::Owned(bytes),
                None => {
                    warn!(url = url.as_str(), "remote image not resolved, skipping");
                    return None;
                }
            },
        };
        match image_ops::decode(&bytes) {
            Ok(img) => Some(img),
            Err(err) => {
                warn!(%err, "skipping undecodable image");
                None
            }
        }
    }
}

fn fill_and_stroke(pixmap: &mut Pixmap, path: &Path, fill: Color, stroke: &StrokeStyle, transform: Transform) {
    if !fill.is_transparent() {
        pixmap.fill_path(path, &paint(fill), FillRule::Winding, transform, None);
    }
    if stroke.is_visible() {
        let style = Stroke { width: stroke.width as f32, ..Default::default() };
        pixmap.stroke_path(path, &paint(stroke.color), &style, transform, None);
    }
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn image_paint() -> PixmapPaint {
    PixmapPaint { quality: FilterQuality::Bilinear, ..Default::default() }
}

fn skia_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn to_skia(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn to_skia_path(path: &BezPath) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => pb.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c1, c2, p) => {
                pb.cubic_to(c1.x as f32, c1.y as f32, c2.x as f32, c2.y as f32, p.x as f32, p.y as f32)
            }
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn to_pixmap(img: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(img.width(), img.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

fn stretch_pixmap(src: &Pixmap, width: u32, height: u32) -> Option<Pixmap> {
    let mut out = Pixmap::new(width, height)?;
    let scale = Transform::from_scale(width as f32 / src.width() as f32, height as f32 / src.height() as f32);
    out.draw_pixmap(0, 0, src.as_ref(), &image_paint(), scale, None);
    Some(out)
}
