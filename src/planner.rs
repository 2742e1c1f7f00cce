//! The interaction engine as one handle: store, timeline, selection, drag,
//! filters and the cached critical path. The egui layer drives this; tests
//! drive it directly.

use std::sync::Arc;

use chrono::NaiveDate;
use egui::{Modifiers, Pos2};
use tracing::debug;

use crate::config::PlannerSettings;
use crate::engine::arrows::{arrows, Arrow};
use crate::engine::drag::{DragController, DragMode, DragOutcome};
use crate::engine::filter::FilterCriteria;
use crate::engine::geometry::ChartLayout;
use crate::engine::graph::{CriticalPath, CriticalPathCache, DependencyGraph};
use crate::engine::keys::Command;
use crate::engine::lanes::{build_rows, visible_ids, Row, ViewMode};
use crate::engine::selection::SelectionModel;
use crate::model::{
    add_days, AssignmentId, Dataset, Extension, ScrollMetrics, TaskPriority, TaskStatus,
    TimelineWindow,
};
use crate::store::PlannerStore;

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub rows: Vec<Row>,
    pub layout: ChartLayout,
    pub arrows: Vec<Arrow>,
    pub critical: Arc<CriticalPath>,
}

impl Frame {
    /// Critical membership is global; the highlight only shows for visible bars.
    pub fn highlight_critical(&self, id: &AssignmentId) -> bool {
        self.critical.is_critical(id) && self.layout.contains(id)
    }
}

#[derive(Debug)]
pub struct Planner {
    store: PlannerStore,
    window: TimelineWindow,
    selection: SelectionModel,
    drag: DragController,
    filter: FilterCriteria,
    view_mode: ViewMode,
    critical: CriticalPathCache,
    settings: PlannerSettings,
}

impl Planner {
    /// Open on `dataset` with the timeline starting one extend chunk before `today`.
    pub fn new(dataset: Dataset, settings: PlannerSettings, today: NaiveDate) -> Self {
        let t = &settings.timeline;
        let anchor = add_days(today, -(t.extend_chunk_days as i64));
        let window = TimelineWindow::new(
            anchor,
            t.initial_days.max(1) + t.extend_chunk_days,
            t.clamp_day_width(t.day_width),
        )
        .with_policy(t.extend_policy());
        Self {
            store: PlannerStore::new(dataset).with_undo_depth(settings.history.undo_depth),
            window,
            selection: SelectionModel::default(),
            drag: DragController::default(),
            filter: FilterCriteria::default(),
            view_mode: ViewMode::default(),
            critical: CriticalPathCache::default(),
            settings,
        }
    }

    pub fn store(&self) -> &PlannerStore {
        &self.store
    }

    pub fn dataset(&self) -> &Dataset {
        self.store.dataset()
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    pub fn window(&self) -> &TimelineWindow {
        &self.window
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn filter(&self) -> &FilterCriteria {
        &self.filter
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    /// Settings as they should be persisted: the loaded values with the
    /// current zoom.
    pub fn settings_to_save(&self) -> PlannerSettings {
        let mut settings = self.settings.clone();
        settings.timeline.day_width = self.window.day_width();
        settings
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    /// Swap in a loaded dataset. Cycles are rejected and leave the plan as is.
    pub fn replace_dataset(&mut self, dataset: Dataset) -> crate::error::Result<()> {
        DependencyGraph::from_dataset(&dataset).check_acyclic()?;
        self.drag.capture_lost(self.window.day_width(), &mut self.store);
        self.store.replace(dataset)?;
        self.selection.clear();
        Ok(())
    }

    // ── Filters and view ────────────────────────────────────────

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode != mode {
            self.view_mode = mode;
            self.sync_selection();
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.set_search(search);
        self.sync_selection();
    }

    pub fn toggle_status(&mut self, status: TaskStatus) {
        self.filter.toggle_status(status);
        self.sync_selection();
    }

    pub fn toggle_priority(&mut self, priority: TaskPriority) {
        self.filter.toggle_priority(priority);
        self.sync_selection();
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
        self.sync_selection();
    }

    fn sync_selection(&mut self) {
        let visible = self.visible_ids();
        self.selection.retain_visible(&visible);
    }

    // ── Derived views ───────────────────────────────────────────

    pub fn rows(&self) -> Vec<Row> {
        build_rows(self.store.dataset(), self.view_mode, &self.filter)
    }

    pub fn visible_ids(&self) -> Vec<AssignmentId> {
        visible_ids(&self.rows())
    }

    pub fn layout(&self) -> ChartLayout {
        ChartLayout::compute(&self.rows(), &self.window, self.settings.layout.metrics())
    }

    /// Recomputed only when the store revision changes.
    pub fn critical_path(&mut self) -> Arc<CriticalPath> {
        self.critical
            .get(self.store.revision(), self.store.dataset())
    }

    pub fn frame(&mut self) -> Frame {
        let rows = self.rows();
        let layout = ChartLayout::compute(&rows, &self.window, self.settings.layout.metrics());
        let arrows = arrows(&self.store.dataset().edges(), &layout.shape_rects());
        Frame {
            rows,
            layout,
            arrows,
            critical: self.critical_path(),
        }
    }

    // ── Pointer ─────────────────────────────────────────────────

    /// Press at `pos` in chart content coordinates. Returns the bar that was
    /// hit. Modifier presses edit the selection; plain presses start a drag;
    /// a plain press on empty space clears the selection.
    pub fn pointer_down(&mut self, pos: Pos2, modifiers: Modifiers) -> Option<AssignmentId> {
        let rows = self.rows();
        let layout = ChartLayout::compute(&rows, &self.window, self.settings.layout.metrics());
        let Some((id, mode)) = layout.hit_test(pos) else {
            if !(modifiers.command || modifiers.ctrl || modifiers.shift) {
                self.selection.clear();
            }
            return None;
        };
        if modifiers.command || modifiers.ctrl || modifiers.shift {
            self.selection.click(&id, modifiers, &visible_ids(&rows));
        } else {
            self.drag.pointer_down(
                &id,
                mode,
                pos.x,
                &mut self.selection,
                self.store.dataset(),
            );
        }
        Some(id)
    }

    /// Start a gesture directly, bypassing hit testing.
    pub fn begin_drag(&mut self, id: &AssignmentId, mode: DragMode, pointer_x: f32) -> bool {
        self.drag
            .pointer_down(id, mode, pointer_x, &mut self.selection, self.store.dataset())
    }

    pub fn pointer_move(&mut self, pointer_x: f32) {
        self.drag.pointer_move(pointer_x);
    }

    /// Apply the coalesced drag position. Call once per frame.
    pub fn flush(&mut self) -> bool {
        self.drag.flush(self.window.day_width(), &mut self.store)
    }

    pub fn pointer_up(&mut self) -> Option<DragOutcome> {
        let outcome = self.drag.pointer_up(self.window.day_width(), &mut self.store);
        if outcome.is_some() {
            self.sync_selection();
        }
        outcome
    }

    pub fn capture_lost(&mut self) -> Option<DragOutcome> {
        self.drag.capture_lost(self.window.day_width(), &mut self.store)
    }

    // ── Viewport ────────────────────────────────────────────────

    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> Extension {
        let ext = self.window.on_scroll(metrics);
        if ext.backward > 0 {
            self.drag
                .shift_origin(ext.backward as f32 * self.window.day_width());
        }
        ext
    }

    pub fn take_scroll_target(&mut self) -> Option<f32> {
        self.window.take_scroll_target()
    }

    pub fn scroll_to_date(&mut self, date: NaiveDate, client_width: f32) {
        self.window.scroll_to_date(date, client_width);
    }

    /// Zoom. A running drag is rescaled so its day delta does not jump.
    pub fn set_day_width(&mut self, width: f32) {
        let width = self.settings.timeline.clamp_day_width(width);
        let old = self.window.day_width();
        self.window.set_day_width(width);
        let new = self.window.day_width();
        if new != old {
            debug!(day_width = new, "zoom");
            self.drag.rescale(old, new);
        }
    }

    pub fn zoom(&mut self, steps: i32) {
        let step = self.settings.timeline.zoom_step;
        self.set_day_width(self.window.day_width() + step * steps as f32);
    }

    // ── Commands ────────────────────────────────────────────────

    /// Run a command. Returns whether anything changed. `FocusSearch` belongs
    /// to the UI and is a no-op here.
    pub fn execute(&mut self, command: Command) -> bool {
        let ids = self.selection.to_vec();
        let changed = match command {
            Command::DeleteSelection => {
                let removed = self.store.remove_assignments(&ids);
                if removed > 0 {
                    self.selection.clear();
                }
                removed > 0
            }
            Command::Cancel => {
                let was_dragging = self.capture_lost().is_some();
                let had_selection = !self.selection.is_empty();
                self.selection.clear();
                was_dragging || had_selection
            }
            Command::Nudge(days) => !self.is_dragging() && self.store.shift(&ids, days) > 0,
            Command::Step { forward } => {
                let before = self.selection.clone();
                self.selection.step(forward, &self.visible_ids());
                before != self.selection
            }
            Command::SelectAll => {
                let before = self.selection.len();
                self.selection.select_all(&self.visible_ids());
                before != self.selection.len()
            }
            Command::Duplicate => {
                let copies = self.store.duplicate(&ids);
                if !copies.is_empty() {
                    self.selection.clear();
                    for id in &copies {
                        self.selection.toggle(id.clone());
                    }
                }
                !copies.is_empty()
            }
            Command::Undo => !self.is_dragging() && self.store.undo(),
            Command::Redo => !self.is_dragging() && self.store.redo(),
            Command::Timescale(i) => match self.settings.timeline.preset(i) {
                Some(width) => {
                    self.set_day_width(width);
                    true
                }
                None => false,
            },
            Command::ZoomIn => {
                self.zoom(1);
                true
            }
            Command::ZoomOut => {
                self.zoom(-1);
                true
            }
            Command::FocusSearch => false,
        };
        if changed {
            debug!(?command, "command applied");
            self.sync_selection();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Assignment;
    use pretty_assertions::assert_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn planner() -> Planner {
        Planner::new(Dataset::sample(d(10)), PlannerSettings::default(), d(10))
    }

    #[test]
    fn test_window_opens_before_today() {
        let p = planner();
        assert_eq!(p.window().anchor(), add_days(d(10), -30));
        assert_eq!(p.window().total_days(), 120);
        assert_eq!(p.window().day_width(), 96.0);
    }

    #[test]
    fn test_filter_prunes_selection() {
        let mut p = planner();
        p.execute(Command::SelectAll);
        assert_eq!(p.selection().len(), 9);
        p.set_search("design");
        assert_eq!(
            p.selection().to_vec(),
            vec![AssignmentId::from("a-design")]
        );
    }

    #[test]
    fn test_press_on_bar_starts_drag() {
        let mut p = planner();
        let layout = p.layout();
        let bar = layout.bar(&"a-design".into()).unwrap();
        let pos = bar.rect.center();
        assert_eq!(p.pointer_down(pos, Modifiers::NONE), Some("a-design".into()));
        assert!(p.is_dragging());
        p.pointer_move(pos.x + 2.0 * p.window().day_width());
        assert!(p.flush());
        let outcome = p.pointer_up().unwrap();
        assert_eq!(outcome.delta_days, 2);
        let design = p.dataset().assignment(&"a-design".into()).unwrap();
        assert_eq!(design.start, add_days(d(10), 8));
        assert!(p.execute(Command::Undo));
        let design = p.dataset().assignment(&"a-design".into()).unwrap();
        assert_eq!(design.start, add_days(d(10), 6));
    }

    #[test]
    fn test_press_on_empty_space_clears() {
        let mut p = planner();
        p.execute(Command::SelectAll);
        assert_eq!(p.pointer_down(Pos2::new(-500.0, -500.0), Modifiers::NONE), None);
        assert!(p.selection().is_empty());
    }

    #[test]
    fn test_modifier_press_toggles_without_drag() {
        let mut p = planner();
        let layout = p.layout();
        let a = layout.bar(&"a-qa".into()).unwrap().rect.center();
        let b = layout.bar(&"a-spike".into()).unwrap().rect.center();
        p.pointer_down(a, Modifiers::COMMAND);
        p.pointer_down(b, Modifiers::COMMAND);
        assert!(!p.is_dragging());
        assert_eq!(p.selection().len(), 2);
    }

    #[test]
    fn test_nudge_and_delete() {
        let mut p = planner();
        p.execute(Command::Step { forward: true });
        let first = p.selection().single().cloned().unwrap();
        let start = p.dataset().assignment(&first).unwrap().start;
        assert!(p.execute(Command::Nudge(-7)));
        assert_eq!(
            p.dataset().assignment(&first).unwrap().start,
            add_days(start, -7)
        );
        assert!(p.execute(Command::DeleteSelection));
        assert!(!p.dataset().contains(&first));
        assert!(p.selection().is_empty());
    }

    #[test]
    fn test_duplicate_selects_copies() {
        let mut p = planner();
        p.execute(Command::Step { forward: true });
        assert!(p.execute(Command::Duplicate));
        assert_eq!(p.dataset().assignments.len(), 10);
        let copy = p.selection().single().cloned().unwrap();
        assert!(copy.as_str().len() > 20);
    }

    #[test]
    fn test_timescale_and_zoom_are_clamped() {
        let mut p = planner();
        assert!(p.execute(Command::Timescale(0)));
        assert_eq!(p.window().day_width(), 24.0);
        p.execute(Command::ZoomOut);
        assert_eq!(p.window().day_width(), 24.0);
        assert!(!p.execute(Command::Timescale(9)));
        assert!(!p.execute(Command::FocusSearch));
    }

    #[test]
    fn test_settings_to_save_carries_zoom() {
        let mut p = planner();
        p.set_day_width(48.0);
        let saved = p.settings_to_save();
        assert_eq!(saved.timeline.day_width, 48.0);
        assert_eq!(saved.timeline.min_day_width, p.settings().timeline.min_day_width);
        // the loaded settings are untouched
        assert_eq!(p.settings().timeline.day_width, 96.0);
    }

    #[test]
    fn test_frame_gates_critical_highlight_by_visibility() {
        let mut p = planner();
        let frame = p.frame();
        assert!(frame.critical.is_critical(&"a-launch".into()));
        assert!(frame.highlight_critical(&"a-launch".into()));
        assert_eq!(frame.arrows.len(), 6);

        p.set_search("kickoff");
        let frame = p.frame();
        assert!(frame.critical.is_critical(&"a-launch".into()));
        assert!(!frame.highlight_critical(&"a-launch".into()));
        assert!(frame.arrows.is_empty());
    }

    #[test]
    fn test_cancel_ends_drag_and_clears() {
        let mut p = planner();
        assert!(p.begin_drag(&"a-qa".into(), DragMode::ResizeRight, 0.0));
        assert!(p.execute(Command::Cancel));
        assert!(!p.is_dragging());
        assert!(p.selection().is_empty());
    }

    #[test]
    fn test_backward_extension_mid_drag_keeps_delta() {
        let mut p = planner();
        let dw = p.window().day_width();
        assert!(p.begin_drag(&"a-spike".into(), DragMode::Move, 10.0));
        let ext = p.on_scroll(ScrollMetrics {
            offset: 0.0,
            client_width: 800.0,
            content_width: p.window().content_width(),
        });
        assert_eq!(ext.backward, 90);
        p.pointer_move(10.0 + 90.0 * dw + dw);
        let outcome = p.pointer_up().unwrap();
        assert_eq!(outcome.delta_days, 1);
    }

    #[test]
    fn test_replace_rejects_cycles() {
        let mut p = planner();
        let rev = p.revision();
        assert!(p.replace_dataset(cyclic()).is_err());
        assert_eq!(p.revision(), rev);
    }

    fn cyclic() -> Dataset {
        let mut a = Assignment::new("r".into(), "p".into(), d(1), d(2)).with_id("x");
        a.dependencies.push(crate::model::Dependency::finish_to_start(
            "x".into(),
            "x".into(),
        ));
        Dataset {
            assignments: vec![a],
            ..Dataset::default()
        }
    }

    #[test]
    fn test_rejected_replace_leaves_running_drag_unflushed() {
        let mut p = planner();
        let dw = p.window().day_width();
        assert!(p.begin_drag(&"a-design".into(), DragMode::Move, 0.0));
        p.pointer_move(2.0 * dw);
        let rev = p.revision();
        assert!(p.replace_dataset(cyclic()).is_err());
        assert_eq!(p.revision(), rev);
        let design = p.dataset().assignment(&"a-design".into()).unwrap();
        assert_eq!(design.start, add_days(d(10), 6));
        assert!(p.is_dragging());
    }

    #[test]
    fn test_zoom_mid_drag_keeps_dates_under_pointer() {
        let mut p = planner();
        let x = p.layout().bar(&"a-design".into()).unwrap().rect.center().x;
        assert!(p.begin_drag(&"a-design".into(), DragMode::Move, x));
        assert!(p.execute(Command::Timescale(0)));
        assert_eq!(p.window().day_width(), 24.0);

        // same date under the pointer at the new scale
        p.pointer_move(x * 24.0 / 96.0);
        assert!(!p.flush());
        p.pointer_move(x * 24.0 / 96.0 + 2.0 * 24.0);
        let outcome = p.pointer_up().unwrap();
        assert_eq!(outcome.delta_days, 2);
        let design = p.dataset().assignment(&"a-design".into()).unwrap();
        assert_eq!(design.start, add_days(d(10), 8));
    }
}
