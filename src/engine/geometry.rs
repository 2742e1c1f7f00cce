//! Pixel geometry for rows and bars, in chart content coordinates
//! (x = timeline offset, y = 0 at the top of the first row).

use std::collections::HashMap;

use egui::{Pos2, Rect, Vec2};

use super::drag::DragMode;
use super::lanes::{Row, RowKey};
use crate::model::{Assignment, AssignmentId, TimelineWindow};

/// Height of the baseline strip under a bar.
pub const BASELINE_HEIGHT: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub lane_height: f32,
    pub row_padding: f32,
    pub handle_width: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            lane_height: 28.0,
            row_padding: 6.0,
            handle_width: 7.0,
        }
    }
}

impl LayoutMetrics {
    pub fn row_height(&self, lane_count: usize) -> f32 {
        lane_count.max(1) as f32 * self.lane_height + self.row_padding
    }

    /// Half the diagonal of a milestone diamond.
    pub fn diamond_size(&self) -> f32 {
        (self.lane_height / 2.0 - 3.0).max(6.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarGeometry {
    pub id: AssignmentId,
    pub row: usize,
    pub lane: usize,
    pub milestone: bool,
    /// `left`, `width`, lane-derived `top`, `lane_height`. Zero width for milestones.
    pub rect: Rect,
    pub baseline: Option<Rect>,
}

impl BarGeometry {
    /// What is drawn and hit-tested: the bar itself, or the diamond bounds.
    pub fn shape_rect(&self, metrics: &LayoutMetrics) -> Rect {
        if self.milestone {
            Rect::from_center_size(
                Pos2::new(self.rect.left(), self.rect.center().y),
                Vec2::splat(metrics.diamond_size() * 2.0),
            )
        } else {
            self.rect
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    pub key: RowKey,
    pub top: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Default)]
pub struct ChartLayout {
    pub rows: Vec<RowLayout>,
    pub bars: Vec<BarGeometry>,
    index: HashMap<AssignmentId, usize>,
    pub total_height: f32,
    metrics: LayoutMetrics,
}

fn span_rect(
    window: &TimelineWindow,
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
    top: f32,
    height: f32,
) -> Rect {
    let left = window.date_to_offset(start);
    let width = window.date_to_offset(end) - left + window.day_width();
    Rect::from_min_size(Pos2::new(left, top), Vec2::new(width, height))
}

pub fn bar_geometry(
    a: &Assignment,
    row: usize,
    lane: usize,
    row_top: f32,
    window: &TimelineWindow,
    metrics: &LayoutMetrics,
) -> BarGeometry {
    let top = row_top + metrics.row_padding / 2.0 + lane as f32 * metrics.lane_height;
    let rect = if a.milestone {
        Rect::from_min_size(
            Pos2::new(window.date_to_offset(a.start), top),
            Vec2::new(0.0, metrics.lane_height),
        )
    } else {
        span_rect(window, a.start, a.end, top, metrics.lane_height)
    };
    let baseline = a.baseline.as_ref().filter(|_| !a.milestone).map(|b| {
        span_rect(
            window,
            b.start,
            b.end,
            rect.bottom() - BASELINE_HEIGHT,
            BASELINE_HEIGHT,
        )
    });
    BarGeometry {
        id: a.id.clone(),
        row,
        lane,
        milestone: a.milestone,
        rect,
        baseline,
    }
}

impl ChartLayout {
    pub fn compute(rows: &[Row], window: &TimelineWindow, metrics: LayoutMetrics) -> Self {
        let mut layout = Self {
            metrics,
            ..Self::default()
        };
        let mut top = 0.0;
        for (i, row) in rows.iter().enumerate() {
            let height = metrics.row_height(row.lane_count());
            for a in &row.assignments {
                let lane = row.lanes.lane_of(&a.id).unwrap_or(0);
                layout.index.insert(a.id.clone(), layout.bars.len());
                layout
                    .bars
                    .push(bar_geometry(a, i, lane, top, window, &metrics));
            }
            layout.rows.push(RowLayout {
                key: row.key.clone(),
                top,
                height,
            });
            top += height;
        }
        layout.total_height = top;
        layout
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    pub fn bar(&self, id: &AssignmentId) -> Option<&BarGeometry> {
        self.index.get(id).map(|&i| &self.bars[i])
    }

    pub fn contains(&self, id: &AssignmentId) -> bool {
        self.index.contains_key(id)
    }

    /// Shape rectangles by id, the input to arrow geometry.
    pub fn shape_rects(&self) -> HashMap<AssignmentId, Rect> {
        self.bars
            .iter()
            .map(|b| (b.id.clone(), b.shape_rect(&self.metrics)))
            .collect()
    }

    /// Bar under `pos` and the gesture a press there starts. Edge bands of
    /// `handle_width` resize; milestones only move. Later bars win overlaps.
    pub fn hit_test(&self, pos: Pos2) -> Option<(AssignmentId, DragMode)> {
        let handle = self.metrics.handle_width;
        self.bars.iter().rev().find_map(|b| {
            let shape = b.shape_rect(&self.metrics);
            if b.milestone {
                return shape.contains(pos).then(|| (b.id.clone(), DragMode::Move));
            }
            let grab = shape.expand2(Vec2::new(handle / 2.0, 0.0));
            if !grab.contains(pos) {
                return None;
            }
            let to_left = (pos.x - shape.left()).abs();
            let to_right = (shape.right() - pos.x).abs();
            let mode = if to_left <= handle && to_left <= to_right {
                DragMode::ResizeLeft
            } else if to_right <= handle {
                DragMode::ResizeRight
            } else {
                DragMode::Move
            };
            Some((b.id.clone(), mode))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::filter::FilterCriteria;
    use crate::engine::lanes::{build_rows, ViewMode};
    use crate::model::{Baseline, Dataset, Resource};
    use chrono::NaiveDate;
    use egui::Color32;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn layout() -> ChartLayout {
        let mut a = Assignment::new("r1".into(), "p".into(), d(1), d(5)).with_id("A");
        a.baseline = Some(Baseline {
            start: d(2),
            end: d(3),
        });
        let b = Assignment::new("r1".into(), "p".into(), d(3), d(7)).with_id("B");
        let c = Assignment::new("r2".into(), "p".into(), d(2), d(2)).with_id("C");
        let m = Assignment::new_milestone("r2".into(), "p".into(), d(10)).with_id("M");
        let ds = Dataset {
            resources: vec![
                Resource::new("r1", "One", Color32::RED),
                Resource::new("r2", "Two", Color32::BLUE),
            ],
            assignments: vec![a, b, c, m],
            ..Dataset::default()
        };
        let rows = build_rows(&ds, ViewMode::Resources, &FilterCriteria::default());
        let window = TimelineWindow::new(d(1), 60, 20.0);
        ChartLayout::compute(&rows, &window, LayoutMetrics::default())
    }

    #[test]
    fn test_bar_rects_follow_dates_and_lanes() {
        let l = layout();
        let a = l.bar(&"A".into()).unwrap();
        assert_eq!(a.rect.left(), 0.0);
        assert_eq!(a.rect.width(), 100.0);
        assert_eq!(a.rect.top(), 3.0);
        let b = l.bar(&"B".into()).unwrap();
        assert_eq!(b.lane, 1);
        assert_eq!(b.rect.top(), 3.0 + 28.0);
        assert_eq!(b.rect.left(), 40.0);
    }

    #[test]
    fn test_rows_stack_by_lane_count() {
        let l = layout();
        assert_eq!(l.rows[0].height, 2.0 * 28.0 + 6.0);
        assert_eq!(l.rows[1].top, 62.0);
        assert_eq!(l.total_height, 62.0 + 34.0);
        assert_eq!(l.bar(&"C".into()).unwrap().rect.top(), 65.0);
    }

    #[test]
    fn test_milestone_has_zero_width() {
        let l = layout();
        let m = l.bar(&"M".into()).unwrap();
        assert_eq!(m.rect.width(), 0.0);
        assert_eq!(m.rect.left(), 180.0);
        assert!(m.baseline.is_none());
        let shape = m.shape_rect(l.metrics());
        assert_eq!(shape.center().x, 180.0);
    }

    #[test]
    fn test_baseline_strip_sits_under_bar() {
        let l = layout();
        let a = l.bar(&"A".into()).unwrap();
        let base = a.baseline.unwrap();
        assert_eq!(base.left(), 20.0);
        assert_eq!(base.width(), 40.0);
        assert_eq!(base.bottom(), a.rect.bottom());
    }

    #[test]
    fn test_hit_test_modes() {
        let l = layout();
        let y = 10.0;
        assert_eq!(l.hit_test(Pos2::new(50.0, y)), Some(("A".into(), DragMode::Move)));
        assert_eq!(
            l.hit_test(Pos2::new(2.0, y)),
            Some(("A".into(), DragMode::ResizeLeft))
        );
        assert_eq!(
            l.hit_test(Pos2::new(97.0, y)),
            Some(("A".into(), DragMode::ResizeRight))
        );
        assert_eq!(
            l.hit_test(Pos2::new(181.0, 65.0 + 14.0)),
            Some(("M".into(), DragMode::Move))
        );
        assert_eq!(l.hit_test(Pos2::new(400.0, y)), None);
    }

    #[test]
    fn test_shape_rects_cover_every_bar() {
        let l = layout();
        let rects = l.shape_rects();
        assert_eq!(rects.len(), 4);
        assert!(l.contains(&"C".into()));
    }
}
