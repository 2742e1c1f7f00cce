//! Dependency arrow geometry: a cubic curve between two bar rectangles plus
//! a filled arrowhead at the target.

use std::collections::HashMap;
use std::f32::consts::FRAC_PI_6;

use egui::emath::Rot2;
use egui::{Pos2, Rect, Vec2};

use crate::model::{AssignmentId, Dependency};

pub const ARROWHEAD_LEN: f32 = 8.0;
pub const ARROWHEAD_ANGLE: f32 = FRAC_PI_6;

#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    pub from: AssignmentId,
    pub to: AssignmentId,
    /// Cubic Bézier control points: source anchor, two controls, target anchor.
    pub curve: [Pos2; 4],
    /// Filled triangle `[tip, left, right]`.
    pub head: [Pos2; 3],
}

impl Arrow {
    pub fn source(&self) -> Pos2 {
        self.curve[0]
    }

    pub fn target(&self) -> Pos2 {
        self.curve[3]
    }

    /// Point on the curve at `t` in `[0, 1]`.
    pub fn sample(&self, t: f32) -> Pos2 {
        let [p0, p1, p2, p3] = self.curve;
        let u = 1.0 - t;
        let v = p0.to_vec2() * (u * u * u)
            + p1.to_vec2() * (3.0 * u * u * t)
            + p2.to_vec2() * (3.0 * u * t * t)
            + p3.to_vec2() * (t * t * t);
        v.to_pos2()
    }
}

/// Curve from the right-middle of `from` to the left-middle of `to`. Both
/// controls sit on the horizontal midpoint, at the source and target height.
pub fn curve_between(from: Rect, to: Rect) -> [Pos2; 4] {
    let start = Pos2::new(from.right(), from.center().y);
    let end = Pos2::new(to.left(), to.center().y);
    let mid_x = (start.x + end.x) * 0.5;
    [
        start,
        Pos2::new(mid_x, start.y),
        Pos2::new(mid_x, end.y),
        end,
    ]
}

/// Unit direction of travel at the end of the curve. When the end tangent
/// degenerates (anchors vertically aligned) fall back to the chord, then to +x.
pub fn terminal_direction(curve: &[Pos2; 4]) -> Vec2 {
    let [p0, p1, p2, p3] = *curve;
    [p3 - p2, p3 - p1, p3 - p0]
        .into_iter()
        .find(|v| v.length_sq() > f32::EPSILON)
        .map(Vec2::normalized)
        .unwrap_or(Vec2::X)
}

/// Two `ARROWHEAD_LEN` segments at ±`ARROWHEAD_ANGLE` off the reversed
/// direction, closed into a triangle at `tip`.
pub fn arrowhead(tip: Pos2, direction: Vec2) -> [Pos2; 3] {
    let back = -direction * ARROWHEAD_LEN;
    [
        tip,
        tip + Rot2::from_angle(ARROWHEAD_ANGLE) * back,
        tip + Rot2::from_angle(-ARROWHEAD_ANGLE) * back,
    ]
}

pub fn arrow_between(from: Rect, to: Rect) -> ([Pos2; 4], [Pos2; 3]) {
    let curve = curve_between(from, to);
    let head = arrowhead(curve[3], terminal_direction(&curve));
    (curve, head)
}

/// Arrows for every edge whose endpoints both have a rendered rectangle.
/// Edges to hidden or missing assignments are skipped.
pub fn arrows(edges: &[Dependency], rects: &HashMap<AssignmentId, Rect>) -> Vec<Arrow> {
    edges
        .iter()
        .filter_map(|e| {
            let from = rects.get(&e.from)?;
            let to = rects.get(&e.to)?;
            let (curve, head) = arrow_between(*from, *to);
            Some(Arrow {
                from: e.from.clone(),
                to: e.to.clone(),
                curve,
                head,
            })
        })
        .collect()
}
