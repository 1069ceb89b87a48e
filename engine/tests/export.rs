mod common;

use common::{png, small_editor};
use design_engine::{
    Alignment, AssetResolver, Background, Color, EditorError, ExportFormat, ExportSink, ExportedImage, ImageFilter,
    ImageSource, ShapeParams, ShapeType, StyleChange,
};
use pretty_assertions::assert_eq;

const RED: Color = Color::rgb(255, 0, 0);

fn decode(image: &ExportedImage) -> image::RgbaImage {
    image::load_from_memory(&image.bytes).unwrap().to_rgba8()
}

#[test]
fn export_size_follows_multiplier() {
    let editor = small_editor(120, 80);
    let image = editor.export(ExportFormat::Png, 2.0).unwrap();
    assert_eq!((image.width, image.height), (240, 160));
    assert_eq!(decode(&image).dimensions(), (240, 160));
    assert!(matches!(editor.export(ExportFormat::Png, 0.0), Err(EditorError::InvalidGeometry { field: "scale", .. })));
}

#[test]
fn background_and_shapes_are_composited() {
    let mut editor = small_editor(300, 300);
    editor.set_background_color(Color::rgb(0, 0, 255)).unwrap();
    editor.add_object_with(ShapeType::Rect, &ShapeParams::at(0.0, 0.0).with_fill(RED)).unwrap();

    let pixels = decode(&editor.export(ExportFormat::Png, 1.0).unwrap());
    assert_eq!(pixels.get_pixel(50, 50).0, [255, 0, 0, 255]);
    assert_eq!(pixels.get_pixel(280, 280).0, [0, 0, 255, 255]);
}

fn is_ink(pixel: &image::Rgba<u8>) -> bool {
    pixel.0[0] < 128
}

#[test]
fn text_layers_are_drawn_inside_their_box() {
    let mut editor = small_editor(400, 120);
    let id = editor.add_object_with(ShapeType::Text, &ShapeParams::at(20.0, 20.0)).unwrap();
    let bounds = editor.document().get(id).unwrap().bounds();

    let pixels = decode(&editor.export(ExportFormat::Png, 1.0).unwrap());
    let inked = pixels
        .enumerate_pixels()
        .filter(|(x, y, p)| bounds.contains(kurbo::Point::new(*x as f64 + 0.5, *y as f64 + 0.5)) && is_ink(p))
        .count();
    assert!(inked > 100, "only {inked} dark pixels inside {bounds:?}");
    assert!((0..400).all(|x| pixels.get_pixel(x, 10).0 == [255, 255, 255, 255]));
}

#[test]
fn right_aligned_text_ink_reaches_the_canvas_edge() {
    let mut editor = small_editor(300, 80);
    editor.add_object_with(ShapeType::Text, &ShapeParams::at(0.0, 10.0)).unwrap();
    editor.set_style(&StyleChange::Text("iii".into())).unwrap();
    editor.align_selected(Alignment::Right).unwrap();

    let pixels = decode(&editor.export(ExportFormat::Png, 1.0).unwrap());
    let rightmost = pixels.enumerate_pixels().filter(|(_, _, p)| is_ink(p)).map(|(x, _, _)| x).max().unwrap();
    assert!(rightmost > 290, "rightmost ink at {rightmost}");
}

#[test]
fn invisible_objects_are_excluded_entirely() {
    let mut with_hidden = small_editor(300, 300);
    with_hidden.add_object_with(ShapeType::Circle, &ShapeParams::at(20.0, 20.0).with_fill(RED)).unwrap();
    let hidden = with_hidden.add_object_with(ShapeType::Circle, &ShapeParams::at(20.0, 20.0)).unwrap();
    with_hidden.toggle_visibility(hidden).unwrap();

    let mut without = small_editor(300, 300);
    without.add_object_with(ShapeType::Circle, &ShapeParams::at(20.0, 20.0).with_fill(RED)).unwrap();

    let a = with_hidden.export(ExportFormat::Png, 1.0).unwrap();
    let b = without.export(ExportFormat::Png, 1.0).unwrap();
    assert_eq!(a.bytes, b.bytes);
}

#[test]
fn export_is_deterministic() {
    let mut editor = small_editor(200, 200);
    editor.add_shape(ShapeType::Polygon).unwrap();
    editor.rotate_selected().unwrap();
    editor.add_shape(ShapeType::Triangle).unwrap();
    editor.flip_vertical().unwrap();
    let snapshot = editor.snapshot();

    let first = editor.export(ExportFormat::Png, 1.5).unwrap();
    editor.add_shape(ShapeType::Circle).unwrap();
    editor.load_document(snapshot);
    let second = editor.export(ExportFormat::Png, 1.5).unwrap();
    assert_eq!(first, second);
}

#[test]
fn image_filters_apply_on_export() {
    let mut editor = small_editor(100, 100);
    editor.add_image(&png(40, 20, [200, 40, 40, 255])).unwrap();
    let plain = decode(&editor.export(ExportFormat::Png, 1.0).unwrap());
    let [r, g, b, _] = plain.get_pixel(50, 50).0;
    assert!(r > 190 && g < 50 && b < 50, "unexpected pixel {:?}", (r, g, b));

    editor.apply_filter(ImageFilter::Grayscale).unwrap();
    let gray = decode(&editor.export(ExportFormat::Png, 1.0).unwrap());
    let [r, g, b, _] = gray.get_pixel(50, 50).0;
    assert!(r.abs_diff(93) <= 2 && r == g && g == b, "unexpected pixel {:?}", (r, g, b));
}

#[test]
fn jpeg_export_has_no_alpha() {
    let mut editor = small_editor(64, 64);
    editor.set_background_color(Color::TRANSPARENT).unwrap();
    let image = editor.export(editor.default_export_format(true), 1.0).unwrap();
    assert_eq!(image.format, ExportFormat::Jpeg { quality: 100 });
    let decoded = image::load_from_memory(&image.bytes).unwrap();
    assert_eq!(decoded.color(), image::ColorType::Rgb8);
    let [r, g, b] = decoded.to_rgb8().get_pixel(10, 10).0;
    assert!(r > 250 && g > 250 && b > 250);
}

struct Collect(Vec<(String, usize)>);

impl ExportSink for Collect {
    fn deliver(&mut self, file_name: &str, image: &ExportedImage) -> design_engine::Result<()> {
        self.0.push((file_name.to_string(), image.bytes.len()));
        Ok(())
    }
}

#[test]
fn sink_receives_named_export() {
    let editor = small_editor(50, 50);
    let mut sink = Collect(Vec::new());
    let name = editor.export_to(&mut sink, ExportFormat::Png).unwrap();
    assert_eq!(name, "design.png");
    assert_eq!(sink.0.len(), 1);
    assert_eq!(sink.0[0].0, "design.png");
}

struct OneAsset(Vec<u8>);

impl AssetResolver for OneAsset {
    fn resolve(&self, url: &str) -> Option<Vec<u8>> {
        (url == "https://cdn.example.com/bg.png").then(|| self.0.clone())
    }
}

#[test]
fn remote_background_is_stretched_when_resolved() {
    let mut editor = small_editor(100, 50);
    editor
        .set_background(Background {
            color: Color::WHITE,
            image: Some(ImageSource::Remote("https://cdn.example.com/bg.png".into())),
        })
        .unwrap();

    let unresolved = decode(&editor.export(ExportFormat::Png, 1.0).unwrap());
    assert_eq!(unresolved.get_pixel(50, 25).0, [255, 255, 255, 255]);

    let assets = OneAsset(png(4, 4, [0, 255, 0, 255]));
    let resolved = decode(&editor.export_with(ExportFormat::Png, 1.0, &assets).unwrap());
    let [r, g, b, _] = resolved.get_pixel(50, 25).0;
    assert!(r < 5 && g > 250 && b < 5, "unexpected pixel {:?}", (r, g, b));
}
