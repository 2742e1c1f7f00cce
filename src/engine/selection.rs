use std::collections::BTreeSet;

use egui::Modifiers;

use crate::model::AssignmentId;

/// Single / multi selection with a range anchor.
///
/// Every operation that takes `visible` acts only on ids present in that
/// ordered, post-filter sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionModel {
    selected: BTreeSet<AssignmentId>,
    last_activated: Option<AssignmentId>,
}

impl SelectionModel {
    pub fn contains(&self, id: &AssignmentId) -> bool {
        self.selected.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &AssignmentId> {
        self.selected.iter()
    }

    pub fn to_vec(&self) -> Vec<AssignmentId> {
        self.selected.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn last_activated(&self) -> Option<&AssignmentId> {
        self.last_activated.as_ref()
    }

    /// The sole selected id, if exactly one is selected.
    pub fn single(&self) -> Option<&AssignmentId> {
        if self.selected.len() == 1 {
            self.selected.iter().next()
        } else {
            None
        }
    }

    pub fn select_single(&mut self, id: AssignmentId) {
        self.selected.clear();
        self.selected.insert(id.clone());
        self.last_activated = Some(id);
    }

    /// Add or remove `id`. Removing leaves the anchor untouched.
    pub fn toggle(&mut self, id: AssignmentId) {
        if !self.selected.remove(&id) {
            self.selected.insert(id.clone());
            self.last_activated = Some(id);
        }
    }

    /// Union the contiguous span between the anchor and `id` into the selection.
    /// Without a visible anchor the span is just `id`.
    pub fn select_range(&mut self, id: &AssignmentId, visible: &[AssignmentId]) {
        let Some(to) = visible.iter().position(|v| v == id) else {
            return;
        };
        let from = self
            .last_activated
            .as_ref()
            .and_then(|anchor| visible.iter().position(|v| v == anchor))
            .unwrap_or(to);
        let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
        self.selected.extend(visible[lo..=hi].iter().cloned());
        if self.last_activated.is_none() {
            self.last_activated = Some(id.clone());
        }
    }

    pub fn select_all(&mut self, visible: &[AssignmentId]) {
        self.selected = visible.iter().cloned().collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.last_activated = None;
    }

    /// Drop ids that are no longer visible (filter change, deletion).
    pub fn retain_visible(&mut self, visible: &[AssignmentId]) {
        let visible: BTreeSet<&AssignmentId> = visible.iter().collect();
        self.selected.retain(|id| visible.contains(id));
        if matches!(&self.last_activated, Some(a) if !visible.contains(a)) {
            self.last_activated = None;
        }
    }

    /// Apply a click on `id`: command/ctrl toggles, shift extends a range,
    /// a plain click selects just `id`.
    pub fn click(&mut self, id: &AssignmentId, modifiers: Modifiers, visible: &[AssignmentId]) {
        if !visible.contains(id) {
            return;
        }
        if modifiers.command || modifiers.ctrl {
            self.toggle(id.clone());
        } else if modifiers.shift {
            self.select_range(id, visible);
        } else {
            self.select_single(id.clone());
        }
    }

    /// Move a single selection to the neighbouring visible id.
    pub fn step(&mut self, forward: bool, visible: &[AssignmentId]) {
        if visible.is_empty() {
            return;
        }
        let current = self
            .last_activated
            .as_ref()
            .and_then(|a| visible.iter().position(|v| v == a));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => visible.len() - 1,
            (Some(i), true) => (i + 1).min(visible.len() - 1),
            (Some(i), false) => i.saturating_sub(1),
        };
        self.select_single(visible[next].clone());
    }
}
