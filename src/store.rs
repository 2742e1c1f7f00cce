//! Copy-on-write ownership of the planner dataset.
//!
//! The store is the only writer. Readers hold `Arc<Dataset>` snapshots that
//! never change under them; a mutation clones the dataset only while an older
//! snapshot (undo history, a renderer) is still alive.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::engine::graph::DependencyGraph;
use crate::error::{PlannerError, Result};
use crate::model::{Assignment, AssignmentId, Dataset, Dependency};

/// Proposed `(start, end)` per assignment.
pub type Positions = BTreeMap<AssignmentId, (NaiveDate, NaiveDate)>;

pub const DEFAULT_UNDO_DEPTH: usize = 100;

#[derive(Debug)]
pub struct PlannerStore {
    current: Arc<Dataset>,
    revision: u64,
    undo: Vec<Arc<Dataset>>,
    redo: Vec<Arc<Dataset>>,
    undo_depth: usize,
}

impl Default for PlannerStore {
    fn default() -> Self {
        Self::new(Dataset::default())
    }
}

impl PlannerStore {
    pub fn new(mut dataset: Dataset) -> Self {
        dataset.normalize();
        Self {
            current: Arc::new(dataset),
            revision: 0,
            undo: Vec::new(),
            redo: Vec::new(),
            undo_depth: DEFAULT_UNDO_DEPTH,
        }
    }

    pub fn with_undo_depth(mut self, depth: usize) -> Self {
        self.undo_depth = depth.max(1);
        self
    }

    /// Build a store from loaded data, rejecting dependency cycles.
    pub fn validated(dataset: Dataset) -> Result<Self> {
        DependencyGraph::from_dataset(&dataset).check_acyclic()?;
        Ok(Self::new(dataset))
    }

    pub fn dataset(&self) -> &Dataset {
        &self.current
    }

    pub fn snapshot(&self) -> Arc<Dataset> {
        Arc::clone(&self.current)
    }

    /// Bumped by every mutation; caches key on it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Record the current snapshot as an undo step.
    pub fn checkpoint(&mut self) {
        self.undo.push(Arc::clone(&self.current));
        if self.undo.len() > self.undo_depth {
            self.undo.remove(0);
        }
        self.redo.clear();
    }

    fn mutate<R>(&mut self, f: impl FnOnce(&mut Dataset) -> R) -> R {
        let out = f(Arc::make_mut(&mut self.current));
        self.revision += 1;
        out
    }

    pub fn undo(&mut self) -> bool {
        match self.undo.pop() {
            Some(prev) => {
                let cur = std::mem::replace(&mut self.current, prev);
                self.redo.push(cur);
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.redo.pop() {
            Some(next) => {
                let cur = std::mem::replace(&mut self.current, next);
                self.undo.push(cur);
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    /// Swap in a whole new dataset (e.g. after loading). Clears history.
    pub fn replace(&mut self, dataset: Dataset) -> Result<()> {
        DependencyGraph::from_dataset(&dataset).check_acyclic()?;
        let mut dataset = dataset;
        dataset.normalize();
        self.current = Arc::new(dataset);
        self.undo.clear();
        self.redo.clear();
        self.revision += 1;
        Ok(())
    }

    pub fn add_assignment(&mut self, mut assignment: Assignment) -> AssignmentId {
        assignment.normalize();
        let id = assignment.id.clone();
        self.checkpoint();
        self.mutate(|ds| ds.assignments.push(assignment));
        id
    }

    /// Remove assignments and every edge touching them. Returns how many were removed.
    pub fn remove_assignments(&mut self, ids: &[AssignmentId]) -> usize {
        let doomed: HashSet<&AssignmentId> = ids.iter().collect();
        if !self.current.assignments.iter().any(|a| doomed.contains(&a.id)) {
            return 0;
        }
        self.checkpoint();
        self.mutate(|ds| {
            let before = ds.assignments.len();
            ds.assignments.retain(|a| !doomed.contains(&a.id));
            for a in &mut ds.assignments {
                a.dependencies
                    .retain(|d| !doomed.contains(&d.from) && !doomed.contains(&d.to));
            }
            before - ds.assignments.len()
        })
    }

    /// Set an assignment's dates; an inverted range is clamped.
    pub fn set_dates(&mut self, id: &AssignmentId, start: NaiveDate, end: NaiveDate) -> Result<()> {
        if !self.current.contains(id) {
            return Err(PlannerError::UnknownAssignment(id.clone()));
        }
        self.checkpoint();
        self.mutate(|ds| {
            if let Some(a) = ds.assignment_mut(id) {
                a.set_dates(start, end);
            }
        });
        Ok(())
    }

    pub fn set_progress(&mut self, id: &AssignmentId, progress: u8) -> Result<()> {
        if !self.current.contains(id) {
            return Err(PlannerError::UnknownAssignment(id.clone()));
        }
        self.checkpoint();
        self.mutate(|ds| {
            if let Some(a) = ds.assignment_mut(id) {
                a.set_progress(progress);
            }
        });
        Ok(())
    }

    /// Shift whole ranges by `days`. Unknown ids are skipped.
    pub fn shift(&mut self, ids: &[AssignmentId], days: i64) -> usize {
        let targets: HashSet<&AssignmentId> = ids.iter().collect();
        if days == 0 || !self.current.assignments.iter().any(|a| targets.contains(&a.id)) {
            return 0;
        }
        self.checkpoint();
        self.mutate(|ds| {
            let mut moved = 0;
            for a in ds.assignments.iter_mut().filter(|a| targets.contains(&a.id)) {
                a.shift(days);
                moved += 1;
            }
            moved
        })
    }

    /// Copy assignments under fresh ids, without their dependency edges.
    pub fn duplicate(&mut self, ids: &[AssignmentId]) -> Vec<AssignmentId> {
        let copies: Vec<Assignment> = ids
            .iter()
            .filter_map(|id| self.current.assignment(id))
            .map(|a| {
                let mut copy = a.clone();
                copy.id = AssignmentId::generate();
                copy.dependencies.clear();
                copy
            })
            .collect();
        if copies.is_empty() {
            return Vec::new();
        }
        let new_ids = copies.iter().map(|a| a.id.clone()).collect();
        self.checkpoint();
        self.mutate(|ds| ds.assignments.extend(copies));
        new_ids
    }

    /// Write drag results without recording an undo step; the gesture
    /// checkpoints once when it first moves something.
    pub fn apply_positions(&mut self, positions: &Positions) -> usize {
        if positions.is_empty() {
            return 0;
        }
        self.mutate(|ds| {
            let mut applied = 0;
            for a in &mut ds.assignments {
                if let Some(&(start, end)) = positions.get(&a.id) {
                    a.set_dates(start, end);
                    applied += 1;
                }
            }
            applied
        })
    }

    /// Record `dep` on its target assignment. Rejects unknown endpoints and
    /// edges that would close a cycle; an existing `(from, to)` edge is replaced.
    pub fn add_dependency(&mut self, dep: Dependency) -> Result<()> {
        for id in [&dep.from, &dep.to] {
            if !self.current.contains(id) {
                return Err(PlannerError::UnknownAssignment(id.clone()));
            }
        }
        let mut candidate = (*self.current).clone();
        attach_dependency(&mut candidate, dep.clone());
        DependencyGraph::from_dataset(&candidate).check_acyclic()?;

        debug!(from = %dep.from, to = %dep.to, "dependency added");
        self.checkpoint();
        self.mutate(|ds| attach_dependency(ds, dep));
        Ok(())
    }

    pub fn remove_dependency(&mut self, from: &AssignmentId, to: &AssignmentId) -> bool {
        let exists = self
            .current
            .assignments
            .iter()
            .flat_map(|a| a.dependencies.iter())
            .any(|d| &d.from == from && &d.to == to);
        if !exists {
            return false;
        }
        self.checkpoint();
        self.mutate(|ds| {
            for a in &mut ds.assignments {
                a.dependencies.retain(|d| !(&d.from == from && &d.to == to));
            }
        });
        true
    }
}

fn attach_dependency(ds: &mut Dataset, dep: Dependency) {
    for a in &mut ds.assignments {
        a.dependencies
            .retain(|d| !(d.from == dep.from && d.to == dep.to));
    }
    if let Some(target) = ds.assignment_mut(&dep.to) {
        target.dependencies.push(dep);
    }
}
