//! Pointer-driven move / resize of one or many assignments.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use super::selection::SelectionModel;
use crate::model::{add_days, AssignmentId, Dataset};
use crate::store::{PlannerStore, Positions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Move,
    ResizeLeft,
    ResizeRight,
}

/// A gesture in progress. Positions are always recomputed from `origins`.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub mode: DragMode,
    pub targets: Vec<AssignmentId>,
    pub origins: BTreeMap<AssignmentId, Origin>,
    pub pointer_origin_x: f32,
    pointer_x: f32,
    /// Delta last written to the store.
    applied_delta: i64,
    checkpointed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub milestone: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Summary of a finished gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragOutcome {
    pub mode: DragMode,
    pub delta_days: i64,
    pub moved: Vec<AssignmentId>,
}

/// Whole-day delta for a horizontal pointer travel.
pub fn delta_days(pointer_dx: f32, day_width: f32) -> i64 {
    if day_width <= 0.0 {
        return 0;
    }
    (pointer_dx / day_width).round() as i64
}

/// New ranges for every origin after `delta` days of travel.
///
/// Resizes clamp each assignment against its own opposite edge, so a range
/// can collapse to one day but never invert. Milestones only move.
pub fn drag_positions(
    mode: DragMode,
    origins: &BTreeMap<AssignmentId, Origin>,
    delta: i64,
) -> Positions {
    origins
        .iter()
        .filter(|(_, o)| mode == DragMode::Move || !o.milestone)
        .map(|(id, o)| {
            let range = match mode {
                DragMode::Move => (add_days(o.start, delta), add_days(o.end, delta)),
                DragMode::ResizeLeft => (add_days(o.start, delta).min(o.end), o.end),
                DragMode::ResizeRight => (o.start, add_days(o.end, delta).max(o.start)),
            };
            (id.clone(), range)
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(s) => Some(s),
            DragState::Idle => None,
        }
    }

    /// Idle → Dragging. The gesture targets the whole selection when `id` is
    /// already selected; otherwise the selection collapses to `id`.
    /// Ignored while a gesture is already running.
    pub fn pointer_down(
        &mut self,
        id: &AssignmentId,
        mode: DragMode,
        pointer_x: f32,
        selection: &mut SelectionModel,
        dataset: &Dataset,
    ) -> bool {
        match self.state {
            DragState::Dragging(_) => {
                debug!(id = %id, "pointer down ignored while dragging");
                false
            }
            DragState::Idle => {
                if !dataset.contains(id) {
                    return false;
                }
                if !selection.contains(id) {
                    selection.select_single(id.clone());
                }
                let targets = selection.to_vec();
                let origins: BTreeMap<AssignmentId, Origin> = targets
                    .iter()
                    .filter_map(|t| dataset.assignment(t))
                    .map(|a| {
                        (
                            a.id.clone(),
                            Origin {
                                start: a.start,
                                end: a.end,
                                milestone: a.milestone,
                            },
                        )
                    })
                    .collect();
                debug!(?mode, targets = targets.len(), "drag started");
                self.state = DragState::Dragging(DragSession {
                    mode,
                    targets,
                    origins,
                    pointer_origin_x: pointer_x,
                    pointer_x,
                    applied_delta: 0,
                    checkpointed: false,
                });
                true
            }
        }
    }

    /// Record the pointer. Nothing is recomputed until [`Self::flush`].
    pub fn pointer_move(&mut self, pointer_x: f32) {
        if let DragState::Dragging(session) = &mut self.state {
            session.pointer_x = pointer_x;
        }
    }

    /// Content coordinates moved by `dx` under a running gesture (the
    /// timeline grew on the left). Keeps the day delta unchanged.
    pub fn shift_origin(&mut self, dx: f32) {
        if let DragState::Dragging(session) = &mut self.state {
            session.pointer_origin_x += dx;
            session.pointer_x += dx;
        }
    }

    /// The day width changed under a running gesture. Pointer positions are
    /// content pixels, so they are rescaled to keep the same dates.
    pub fn rescale(&mut self, old_day_width: f32, new_day_width: f32) {
        if old_day_width <= 0.0 {
            return;
        }
        if let DragState::Dragging(session) = &mut self.state {
            let k = new_day_width / old_day_width;
            session.pointer_origin_x *= k;
            session.pointer_x *= k;
        }
    }

    /// Positions the gesture would produce right now.
    pub fn preview(&self, day_width: f32) -> Option<Positions> {
        let session = self.session()?;
        let delta = delta_days(session.pointer_x - session.pointer_origin_x, day_width);
        Some(drag_positions(session.mode, &session.origins, delta))
    }

    /// Write the coalesced pointer position to the store. Call once per frame.
    /// Targets deleted mid-gesture are skipped. Returns whether anything changed.
    pub fn flush(&mut self, day_width: f32, store: &mut PlannerStore) -> bool {
        let DragState::Dragging(session) = &mut self.state else {
            return false;
        };
        let delta = delta_days(session.pointer_x - session.pointer_origin_x, day_width);
        if delta == session.applied_delta {
            return false;
        }
        let positions: Positions = drag_positions(session.mode, &session.origins, delta)
            .into_iter()
            .filter(|(id, _)| store.dataset().contains(id))
            .collect();
        if !session.checkpointed {
            store.checkpoint();
            session.checkpointed = true;
        }
        store.apply_positions(&positions);
        session.applied_delta = delta;
        true
    }

    /// Dragging → Idle, committing the final pointer position.
    pub fn pointer_up(&mut self, day_width: f32, store: &mut PlannerStore) -> Option<DragOutcome> {
        self.flush(day_width, store);
        match std::mem::take(&mut self.state) {
            DragState::Idle => None,
            DragState::Dragging(session) => {
                let moved = session
                    .targets
                    .into_iter()
                    .filter(|id| store.dataset().contains(id))
                    .collect();
                debug!(mode = ?session.mode, delta = session.applied_delta, "drag finished");
                Some(DragOutcome {
                    mode: session.mode,
                    delta_days: session.applied_delta,
                    moved,
                })
            }
        }
    }

    /// Pointer capture was lost (focus left the window, escape). Resolves
    /// exactly like a pointer-up so the controller never stays stuck.
    pub fn capture_lost(&mut self, day_width: f32, store: &mut PlannerStore) -> Option<DragOutcome> {
        if self.is_dragging() {
            debug!("pointer capture lost, ending drag");
        }
        self.pointer_up(day_width, store)
    }
}
