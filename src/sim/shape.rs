//! Collision shapes
//!
//! Two variants only: a top-left anchored axis-aligned rectangle and a
//! center-anchored circle. Mixed pairs are tested through their bounding
//! rectangles, which over-reports hits near circle corners.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A collision shape in arena pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    /// Axis-aligned rectangle anchored at its top-left corner
    Rect { x: f32, y: f32, w: f32, h: f32 },
    /// Circle anchored at its center
    Circle { x: f32, y: f32, r: f32 },
}

impl Shape {
    pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Self {
        Shape::Rect { x, y, w, h }
    }

    pub fn circle(x: f32, y: f32, r: f32) -> Self {
        Shape::Circle { x, y, r }
    }

    /// Rectangle of the given size centered on `center`
    pub fn centered_rect(center: Vec2, size: Vec2) -> Self {
        Shape::Rect {
            x: center.x - size.x / 2.0,
            y: center.y - size.y / 2.0,
            w: size.x,
            h: size.y,
        }
    }

    /// Geometric center
    pub fn center(&self) -> Vec2 {
        match *self {
            Shape::Rect { x, y, w, h } => Vec2::new(x + w / 2.0, y + h / 2.0),
            Shape::Circle { x, y, .. } => Vec2::new(x, y),
        }
    }

    /// Same shape moved so its center sits on `center`
    pub fn centered_at(&self, center: Vec2) -> Self {
        match *self {
            Shape::Rect { w, h, .. } => Shape::centered_rect(center, Vec2::new(w, h)),
            Shape::Circle { r, .. } => Shape::Circle {
                x: center.x,
                y: center.y,
                r,
            },
        }
    }

    /// Enclosing rectangle as `(x, y, w, h)`
    pub fn bounding_rect(&self) -> (f32, f32, f32, f32) {
        match *self {
            Shape::Rect { x, y, w, h } => (x, y, w, h),
            Shape::Circle { x, y, r } => (x - r, y - r, r * 2.0, r * 2.0),
        }
    }

    /// Pairwise overlap test
    pub fn intersects(&self, other: &Shape) -> bool {
        match (*self, *other) {
            (
                Shape::Circle {
                    x: ax,
                    y: ay,
                    r: ar,
                },
                Shape::Circle {
                    x: bx,
                    y: by,
                    r: br,
                },
            ) => circles_overlap(Vec2::new(ax, ay), ar, Vec2::new(bx, by), br),
            // Rect/rect is exact; mixed pairs fall back to bounding boxes
            _ => aabb_overlap(self.bounding_rect(), other.bounding_rect()),
        }
    }
}

/// AABB overlap on `(x, y, w, h)` tuples. Touching edges count as overlap.
#[inline]
pub fn aabb_overlap(a: (f32, f32, f32, f32), b: (f32, f32, f32, f32)) -> bool {
    let (ax, ay, aw, ah) = a;
    let (bx, by, bw, bh) = b;
    let disjoint = ax + aw < bx || bx + bw < ax || ay + ah < by || by + bh < ay;
    !disjoint
}

/// Circle overlap using squared distances; tangent circles overlap.
#[inline]
pub fn circles_overlap(a: Vec2, ar: f32, b: Vec2, br: f32) -> bool {
    let reach = ar + br;
    a.distance_squared(b) <= reach * reach
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rect_overlap_and_separation() {
        let a = Shape::rect(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Shape::rect(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.intersects(&Shape::rect(11.0, 0.0, 10.0, 10.0)));
        assert!(!a.intersects(&Shape::rect(0.0, 10.5, 10.0, 10.0)));
    }

    #[test]
    fn test_rect_shared_edge_counts() {
        let a = Shape::rect(0.0, 0.0, 10.0, 10.0);
        let b = Shape::rect(10.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_circle_tangent_is_inclusive() {
        let a = Shape::circle(0.0, 0.0, 3.0);
        let b = Shape::circle(5.0, 0.0, 2.0);
        assert!(a.intersects(&b));
        let c = Shape::circle(5.01, 0.0, 2.0);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_mixed_uses_bounding_box() {
        // Corner of the circle's bounding box touches the rect; the true circle does not.
        let circle = Shape::circle(0.0, 0.0, 10.0);
        let rect = Shape::rect(8.0, 8.0, 5.0, 5.0);
        assert!(circle.intersects(&rect));
        assert!(rect.intersects(&circle));

        let far = Shape::rect(10.5, 0.0, 5.0, 5.0);
        assert!(!circle.intersects(&far));
    }

    #[test]
    fn test_centered_at_keeps_size() {
        let rect = Shape::rect(0.0, 0.0, 40.0, 20.0).centered_at(Vec2::new(100.0, 50.0));
        assert_eq!(rect, Shape::rect(80.0, 40.0, 40.0, 20.0));
        assert_eq!(rect.center(), Vec2::new(100.0, 50.0));

        let circle = Shape::circle(0.0, 0.0, 7.0).centered_at(Vec2::new(3.0, 4.0));
        assert_eq!(circle, Shape::circle(3.0, 4.0, 7.0));
    }

    #[test]
    fn test_shape_json_is_tagged() {
        let json = serde_json::to_string(&Shape::circle(1.0, 2.0, 3.0)).unwrap();
        assert!(json.contains("\"kind\":\"circle\""));
    }

    fn rect_strategy() -> impl Strategy<Value = Shape> {
        (
            -500.0f32..500.0,
            -500.0f32..500.0,
            0.0f32..200.0,
            0.0f32..200.0,
        )
            .prop_map(|(x, y, w, h)| Shape::rect(x, y, w, h))
    }

    fn circle_strategy() -> impl Strategy<Value = Shape> {
        (-500.0f32..500.0, -500.0f32..500.0, 0.0f32..100.0)
            .prop_map(|(x, y, r)| Shape::circle(x, y, r))
    }

    proptest! {
        #[test]
        fn prop_rect_intersection_is_symmetric(a in rect_strategy(), b in rect_strategy()) {
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }

        #[test]
        fn prop_circle_intersection_is_symmetric(a in circle_strategy(), b in circle_strategy()) {
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }

        #[test]
        fn prop_mixed_intersection_is_symmetric(a in rect_strategy(), b in circle_strategy()) {
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }

        #[test]
        fn prop_shape_overlaps_itself(a in rect_strategy()) {
            prop_assert!(a.intersects(&a));
        }
    }
}
