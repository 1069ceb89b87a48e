//! Placement of objects on the canvas.
//!
//! An object is drawn in its own local frame, `(0,0)..(width,height)`, and
//! mapped to the canvas by
//! `translate(position) ∘ rotate(about center) ∘ scale(with flips, about center)`.
//! `position` is the origin of the scaled, unrotated bounding box.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    /// Degrees, clockwise on a y-down canvas.
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl Default for Placement {
    fn default() -> Self {
        Placement::at(0.0, 0.0)
    }
}

impl Placement {
    pub fn at(x: f64, y: f64) -> Self {
        Placement { x, y, rotation: 0.0, scale_x: 1.0, scale_y: 1.0, flip_h: false, flip_v: false }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Size of the box after scaling, before rotation.
    pub fn scaled_size(&self, local: Size) -> Size {
        Size::new(local.width * self.scale_x.abs(), local.height * self.scale_y.abs())
    }

    /// Local-to-canvas transform for a shape whose local frame is `local`.
    pub fn affine(&self, local: Size) -> Affine {
        let scaled = self.scaled_size(local);
        let center = Vec2::new(self.x + scaled.width / 2.0, self.y + scaled.height / 2.0);
        let sx = if self.flip_h { -self.scale_x } else { self.scale_x };
        let sy = if self.flip_v { -self.scale_y } else { self.scale_y };
        Affine::translate(center)
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(sx, sy)
            * Affine::translate(Vec2::new(-local.width / 2.0, -local.height / 2.0))
    }

    /// Axis-aligned box of the transformed local frame.
    pub fn bounds(&self, local: Size) -> Rect {
        let affine = self.affine(local);
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(local.width, 0.0),
            Point::new(local.width, local.height),
            Point::new(0.0, local.height),
        ];
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for corner in corners {
            let p = affine * corner;
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect::new(min_x, min_y, max_x, max_y)
    }

    /// Maps a canvas point into the local frame, if the placement is invertible.
    pub fn to_local(&self, local: Size, point: Point) -> Option<Point> {
        let affine = self.affine(local);
        if affine.determinant().abs() < f64::EPSILON {
            return None;
        }
        Some(affine.inverse() * point)
    }

    pub fn apply(&self, delta: &TransformDelta) -> Placement {
        Placement {
            x: self.x + delta.dx,
            y: self.y + delta.dy,
            rotation: self.rotation + delta.rotation,
            scale_x: self.scale_x * delta.scale_x,
            scale_y: self.scale_y * delta.scale_y,
            flip_h: self.flip_h ^ delta.flip_h,
            flip_v: self.flip_v ^ delta.flip_v,
        }
    }
}

/// Relative change to a placement.
///
/// Translation and rotation add, scale multiplies, flips toggle.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformDelta {
    pub dx: f64,
    pub dy: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl Default for TransformDelta {
    fn default() -> Self {
        TransformDelta::IDENTITY
    }
}

impl TransformDelta {
    pub const IDENTITY: TransformDelta = TransformDelta {
        dx: 0.0,
        dy: 0.0,
        rotation: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
        flip_h: false,
        flip_v: false,
    };

    pub fn translate(dx: f64, dy: f64) -> Self {
        TransformDelta { dx, dy, ..Self::IDENTITY }
    }

    pub fn rotate(degrees: f64) -> Self {
        TransformDelta { rotation: degrees, ..Self::IDENTITY }
    }

    pub fn scale(scale_x: f64, scale_y: f64) -> Self {
        TransformDelta { scale_x, scale_y, ..Self::IDENTITY }
    }

    pub fn flip_horizontal() -> Self {
        TransformDelta { flip_h: true, ..Self::IDENTITY }
    }

    pub fn flip_vertical() -> Self {
        TransformDelta { flip_v: true, ..Self::IDENTITY }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// `self` followed by `next`.
    pub fn then(&self, next: &TransformDelta) -> TransformDelta {
        TransformDelta {
            dx: self.dx + next.dx,
            dy: self.dy + next.dy,
            rotation: self.rotation + next.rotation,
            scale_x: self.scale_x * next.scale_x,
            scale_y: self.scale_y * next.scale_y,
            flip_h: self.flip_h ^ next.flip_h,
            flip_v: self.flip_v ^ next.flip_v,
        }
    }

    /// Delta that undoes `self`. `None` when a scale factor is zero.
    pub fn inverse(&self) -> Option<TransformDelta> {
        if self.scale_x == 0.0 || self.scale_y == 0.0 {
            return None;
        }
        Some(TransformDelta {
            dx: -self.dx,
            dy: -self.dy,
            rotation: -self.rotation,
            scale_x: 1.0 / self.scale_x,
            scale_y: 1.0 / self.scale_y,
            flip_h: self.flip_h,
            flip_v: self.flip_v,
        })
    }
}
