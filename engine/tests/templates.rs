mod common;

use common::{editor, png};
use design_engine::{
    Background, Color, Document, DocumentDescriptor, EditorError, FontWeight, ImageFilter, ImageSource,
    Materializer, MemoryDesignStore, ObjectId, ObjectKind, Selection, ShapeType, StyleChange, TemplateCatalog,
    TemplateSource, TransformDelta, UnknownVariantPolicy,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn descriptor(value: serde_json::Value) -> DocumentDescriptor {
    serde_json::from_value(value).unwrap()
}

#[test]
fn materialization_preserves_descriptor_order() {
    let template = descriptor(json!({
        "backgroundColor": "#FFE5B4",
        "elements": [
            { "type": "rect", "left": 50, "top": 50, "width": 980, "height": 300, "fill": "#FF6B6B" },
            { "type": "text", "text": "SUMMER SALE", "left": 200, "top": 120, "fontSize": 80 }
        ]
    }));
    let doc = Materializer::new(UnknownVariantPolicy::Skip, (1080, 1080)).materialize(&template).unwrap();

    assert_eq!(doc.len(), 2);
    assert_eq!(doc.objects()[0].shape_type(), ShapeType::Rect);
    assert_eq!(doc.objects()[1].shape_type(), ShapeType::Text);
    assert_eq!(doc.background().color, Color::rgb(0xff, 0xe5, 0xb4));
    // Text overlaps the rect and paints after it, so it is what a click hits.
    assert_eq!(doc.hit_test(kurbo::Point::new(210.0, 130.0)), Some(doc.objects()[1].id));
}

#[test]
fn builtin_summer_sale_template() {
    let catalog = TemplateCatalog::builtin().unwrap();
    let mut editor = editor();
    editor.add_text().unwrap();
    editor.load_catalog_template(&catalog, 1).unwrap();

    let doc = editor.document();
    let names: Vec<&str> = doc.objects().iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["Header Background", "Title Text", "Subtitle Text", "Decorative Circle", "CTA Text"]);
    assert_eq!(doc.objects()[0].stroke.width, 0.0);
    assert_eq!(doc.objects()[3].kind, ObjectKind::Circle { radius: 150.0 });
    match &doc.objects()[1].kind {
        ObjectKind::Text(text) => {
            assert_eq!(text.content, "SUMMER SALE");
            assert_eq!(text.font_weight, FontWeight::Bold);
        }
        other => panic!("expected text, got {other:?}"),
    }
    assert_eq!(editor.selection(), Selection::Idle);
    assert!(!editor.can_undo());
}

#[test]
fn missing_catalog_entry_is_an_error() {
    let catalog = TemplateCatalog::builtin().unwrap();
    let mut editor = editor();
    assert!(matches!(editor.load_catalog_template(&catalog, 99), Err(EditorError::Persistence(_))));
    assert!(catalog.by_title("Facebook Post - Event").is_some());
}

#[test]
fn background_image_is_not_an_object() {
    let template = descriptor(json!({
        "backgroundImage": "https://images.example.com/beach.jpg",
        "elements": [{ "type": "circle" }]
    }));
    let mut editor = editor();
    editor.load_template(&template).unwrap();
    let doc = editor.document();
    assert_eq!(doc.len(), 1);
    assert_eq!(doc.background().image, Some(ImageSource::Remote("https://images.example.com/beach.jpg".into())));
}

#[test]
fn strict_policy_rejects_unknown_elements() {
    let config = design_engine::EditorConfig { unknown_variants: UnknownVariantPolicy::Reject, ..Default::default() };
    let mut editor = design_engine::Editor::new(config).unwrap();
    let template = descriptor(json!({ "elements": [{ "type": "rect" }, { "type": "sticker" }] }));
    assert!(matches!(editor.load_template(&template), Err(EditorError::UnknownVariant(_))));
    assert!(editor.document().is_empty());
}

fn busy_document() -> Document {
    let mut editor = editor();
    let text = editor.add_text().unwrap();
    editor.set_style(&StyleChange::Text("Line one\nLine two".into())).unwrap();
    editor.set_style(&StyleChange::FontStyle(design_engine::FontStyle::Italic)).unwrap();
    editor.add_shape(ShapeType::Rect).unwrap();
    editor.transform_selected(&TransformDelta { rotation: 12.5, scale_x: 1.5, ..TransformDelta::IDENTITY }).unwrap();
    editor.add_shape(ShapeType::Circle).unwrap();
    editor.set_style(&StyleChange::StrokeWidth(0.0)).unwrap();
    editor.add_shape(ShapeType::Triangle).unwrap();
    editor.flip_horizontal().unwrap();
    editor.add_shape(ShapeType::Polygon).unwrap();
    editor.add_image(&png(30, 20, [1, 2, 3, 128])).unwrap();
    editor.apply_filter(ImageFilter::BRIGHTEN).unwrap();
    editor.toggle_visibility(text).unwrap();
    editor.rename(text, "").unwrap();
    editor
        .set_background(Background {
            color: Color::rgba(10, 20, 30, 40),
            image: Some(ImageSource::Remote("https://cdn.example.com/bg.png".into())),
        })
        .unwrap();
    editor.resize(1200, 630).unwrap();
    editor.document().clone()
}

#[test]
fn serialize_deserialize_round_trip() {
    let doc = busy_document();
    let json = doc.to_json().unwrap();
    let restored = Document::from_json(&json).unwrap();
    assert_eq!(restored, doc);
}

#[test]
fn serialized_form_is_descriptor_shaped() {
    let doc = busy_document();
    let value: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
    assert_eq!(value["width"], 1200);
    assert_eq!(value["backgroundColor"], "#0a141e28");
    assert_eq!(value["elements"][1]["type"], "rect");
    assert_eq!(value["elements"][1]["angle"], 12.5);
    assert_eq!(value["elements"][4]["type"], "polygon");
    assert_eq!(value["elements"][5]["filters"][0]["type"], "brightness");
    assert!(value["elements"][5]["src"].as_str().unwrap().starts_with("data:image/png;base64,"));
}

#[test]
fn empty_name_falls_back_in_layer_panel() {
    let doc = busy_document();
    let text_layer = doc.layers().into_iter().last().unwrap();
    assert_eq!(text_layer.name, "text 1");
}

#[test]
fn save_and_load_through_store() {
    let doc = busy_document();
    let mut editor = editor();
    editor.load_document(doc.clone());
    let mut store = MemoryDesignStore::new();
    let id = editor.save_to(&mut store).unwrap();

    let mut other = common::editor();
    other.load_from(&store, &id).unwrap();
    assert_eq!(other.document(), &doc);

    let next = other.add_text().unwrap();
    assert!(doc.objects().iter().all(|o| o.id < next));
}

#[test]
fn missing_ids_after_the_largest_id_are_an_error() {
    let template = descriptor(json!({
        "elements": [{ "type": "rect", "id": 4294967295u32 }, { "type": "circle" }]
    }));
    let result = Materializer::new(UnknownVariantPolicy::Skip, (1080, 1080)).materialize(&template);
    assert!(matches!(result, Err(EditorError::IdSpaceExhausted)));
}

#[test]
fn largest_id_loads_and_blocks_further_creation() {
    let doc = Document::from_json(r#"{"width":100,"height":100,"elements":[{"type":"rect","id":4294967294}]}"#).unwrap();
    let mut editor = editor();
    editor.load_document(doc);

    let last = editor.add_shape(ShapeType::Circle).unwrap();
    assert_eq!(last, ObjectId(u32::MAX));
    let before = editor.document().clone();
    assert!(matches!(editor.add_text(), Err(EditorError::IdSpaceExhausted)));
    assert!(matches!(editor.duplicate_selected(), Err(EditorError::IdSpaceExhausted)));
    assert_eq!(editor.document(), &before);
    assert_eq!(editor.history_labels(), vec!["Add Circle"]);

    let saved = Document::from_json(&editor.document().to_json().unwrap()).unwrap();
    assert_eq!(saved.max_id(), Some(ObjectId(u32::MAX)));
}
