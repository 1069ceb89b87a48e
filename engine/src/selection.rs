//! Single-object selection.

use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::types::ObjectId;

/// `Idle -> Selected(id) -> Idle`. At most one object is active.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(tag = "state", content = "id", rename_all = "lowercase")]
pub enum Selection {
    #[default]
    Idle,
    Selected(ObjectId),
}

impl Selection {
    pub fn active(self) -> Option<ObjectId> {
        match self {
            Selection::Idle => None,
            Selection::Selected(id) => Some(id),
        }
    }

    pub fn is_selected(self, id: ObjectId) -> bool {
        self.active() == Some(id)
    }

    /// Topmost visible object under `point`, or `Idle` on a miss.
    pub fn pick(doc: &Document, point: Point) -> Selection {
        doc.hit_test(point).map_or(Selection::Idle, Selection::Selected)
    }

    /// Drops the selection when its object is no longer in `doc`.
    pub fn revalidate(self, doc: &Document) -> Selection {
        match self {
            Selection::Selected(id) if doc.contains(id) => self,
            _ => Selection::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{create_object, ShapeParams};
    use crate::types::ShapeType;

    #[test]
    fn pick_prefers_topmost_visible() {
        let mut doc = Document::new(1080, 1080).unwrap();
        let under = create_object(ObjectId(1), ShapeType::Rect, &ShapeParams::at(0.0, 0.0)).unwrap();
        let mut over = create_object(ObjectId(2), ShapeType::Rect, &ShapeParams::at(0.0, 0.0)).unwrap();
        doc.add_object(under).unwrap();
        over.visible = false;
        doc.add_object(over).unwrap();

        assert_eq!(Selection::pick(&doc, Point::new(10.0, 10.0)), Selection::Selected(ObjectId(1)));
        assert_eq!(Selection::pick(&doc, Point::new(900.0, 900.0)), Selection::Idle);
    }

    #[test]
    fn revalidate_clears_removed_objects() {
        let doc = Document::new(100, 100).unwrap();
        assert_eq!(Selection::Selected(ObjectId(3)).revalidate(&doc), Selection::Idle);
    }
}
