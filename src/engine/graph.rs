//! Dependency graph over assignments and its longest (critical) path.
//!
//! Distances are duration-only: dependency kind and lag are ignored.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{PlannerError, Result};
use crate::model::{AssignmentId, Dataset, Dependency};

/// Directed graph built from a dataset snapshot. Edges with a missing
/// endpoint are dropped.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    durations: BTreeMap<AssignmentId, i64>,
    incoming: BTreeMap<AssignmentId, Vec<AssignmentId>>,
    edges: Vec<Dependency>,
}

/// Result of a critical-path computation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriticalPath {
    /// Longest cumulative duration ending at each assignment.
    pub lengths: BTreeMap<AssignmentId, i64>,
    /// The global maximum of `lengths` (0 when empty).
    pub max_length: i64,
    /// Every assignment whose path length equals the maximum.
    pub critical: BTreeSet<AssignmentId>,
    /// One maximal chain from a root to the lowest-id critical assignment,
    /// predecessors chosen by longest length and then lowest id.
    pub chain: Vec<AssignmentId>,
}

impl CriticalPath {
    pub fn is_critical(&self, id: &AssignmentId) -> bool {
        self.critical.contains(id)
    }

    pub fn length_of(&self, id: &AssignmentId) -> Option<i64> {
        self.lengths.get(id).copied()
    }
}

enum Mark {
    InProgress,
    Done(i64),
}

impl DependencyGraph {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let durations: BTreeMap<AssignmentId, i64> = dataset
            .assignments
            .iter()
            .map(|a| (a.id.clone(), a.duration_days()))
            .collect();
        let edges = dataset.edges();
        let mut incoming: BTreeMap<AssignmentId, Vec<AssignmentId>> = BTreeMap::new();
        for e in &edges {
            incoming.entry(e.to.clone()).or_default().push(e.from.clone());
        }
        for preds in incoming.values_mut() {
            preds.sort();
        }
        Self {
            durations,
            incoming,
            edges,
        }
    }

    pub fn edges(&self) -> &[Dependency] {
        &self.edges
    }

    pub fn predecessors(&self, id: &AssignmentId) -> &[AssignmentId] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_incoming(&self, id: &AssignmentId) -> bool {
        !self.predecessors(id).is_empty()
    }

    /// Fail with [`PlannerError::CycleDetected`] if any cycle exists.
    pub fn check_acyclic(&self) -> Result<()> {
        self.path_lengths().map(|_| ())
    }

    /// `length(id) = duration(id) + max(0, max length over predecessors)`.
    ///
    /// Iterative post-order walk with an in-progress mark, so deep chains do
    /// not grow the call stack and a back edge is reported as a cycle.
    pub fn path_lengths(&self) -> Result<BTreeMap<AssignmentId, i64>> {
        let mut marks: HashMap<&AssignmentId, Mark> = HashMap::with_capacity(self.durations.len());

        for root in self.durations.keys() {
            if marks.contains_key(root) {
                continue;
            }
            marks.insert(root, Mark::InProgress);
            let mut stack: Vec<(&AssignmentId, usize)> = vec![(root, 0)];

            while let Some(&(node, next)) = stack.last() {
                let preds = self.predecessors(node);
                if next < preds.len() {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    let pred = &preds[next];
                    match marks.get(pred) {
                        Some(Mark::Done(_)) => {}
                        Some(Mark::InProgress) => {
                            return Err(PlannerError::CycleDetected {
                                cycle: cycle_from_stack(&stack, pred),
                            });
                        }
                        None => {
                            marks.insert(pred, Mark::InProgress);
                            stack.push((pred, 0));
                        }
                    }
                } else {
                    let best = preds
                        .iter()
                        .filter_map(|p| match marks.get(p) {
                            Some(Mark::Done(len)) => Some(*len),
                            _ => None,
                        })
                        .max()
                        .unwrap_or(0);
                    let own = self.durations.get(node).copied().unwrap_or(0);
                    marks.insert(node, Mark::Done(own + best.max(0)));
                    stack.pop();
                }
            }
        }

        Ok(marks
            .into_iter()
            .filter_map(|(id, mark)| match mark {
                Mark::Done(len) => Some((id.clone(), len)),
                Mark::InProgress => None,
            })
            .collect())
    }

    pub fn critical_path(&self) -> Result<CriticalPath> {
        let lengths = self.path_lengths()?;
        let max_length = lengths.values().copied().max().unwrap_or(0);
        let critical: BTreeSet<AssignmentId> = lengths
            .iter()
            .filter(|(_, len)| **len == max_length)
            .map(|(id, _)| id.clone())
            .collect();

        let mut chain = Vec::new();
        let mut cursor = critical.iter().next().cloned();
        while let Some(id) = cursor {
            cursor = self
                .predecessors(&id)
                .iter()
                // max_by_key keeps the last maximum; walk sorted ids backwards
                // so the lowest id wins ties
                .rev()
                .max_by_key(|p| lengths.get(*p).copied().unwrap_or(0))
                .cloned();
            chain.push(id);
        }
        chain.reverse();

        Ok(CriticalPath {
            lengths,
            max_length,
            critical,
            chain,
        })
    }
}

fn cycle_from_stack(stack: &[(&AssignmentId, usize)], repeated: &AssignmentId) -> Vec<AssignmentId> {
    // The stack runs from successor to predecessor; emit it in edge order.
    let start = stack
        .iter()
        .position(|(id, _)| *id == repeated)
        .unwrap_or(0);
    let mut cycle = vec![repeated.clone()];
    cycle.extend(stack[start..].iter().rev().map(|(id, _)| (*id).clone()));
    cycle
}

/// Critical path cached against the store revision it was computed for.
#[derive(Debug, Default)]
pub struct CriticalPathCache {
    revision: Option<u64>,
    result: Arc<CriticalPath>,
}

impl CriticalPathCache {
    /// Return the cached result, recomputing only when `revision` changed.
    /// A cycle yields an empty result and is logged.
    pub fn get(&mut self, revision: u64, dataset: &Dataset) -> Arc<CriticalPath> {
        if self.revision != Some(revision) {
            self.result = match DependencyGraph::from_dataset(dataset).critical_path() {
                Ok(path) => {
                    debug!(
                        revision,
                        max = path.max_length,
                        critical = path.critical.len(),
                        "critical path recomputed"
                    );
                    Arc::new(path)
                }
                Err(e) => {
                    warn!(revision, "critical path unavailable: {}", e);
                    Arc::new(CriticalPath::default())
                }
            };
            self.revision = Some(revision);
        }
        Arc::clone(&self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Assignment;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn task(id: &str, start: u32, end: u32, preds: &[&str]) -> Assignment {
        let mut a = Assignment::new("r".into(), "p".into(), d(start), d(end)).with_id(id);
        a.dependencies = preds
            .iter()
            .map(|p| Dependency::finish_to_start((*p).into(), id.into()))
            .collect();
        a
    }

    fn graph(tasks: Vec<Assignment>) -> DependencyGraph {
        DependencyGraph::from_dataset(&Dataset {
            assignments: tasks,
            ..Dataset::default()
        })
    }

    #[test]
    fn test_single_edge_accumulates_duration() {
        let g = graph(vec![task("A", 1, 5, &[]), task("B", 6, 8, &["A"])]);
        let cp = g.critical_path().unwrap();
        assert_eq!(cp.length_of(&"A".into()), Some(5));
        assert_eq!(cp.length_of(&"B".into()), Some(8));
        assert_eq!(cp.max_length, 8);
        assert_eq!(cp.critical.iter().map(|i| i.as_str()).collect::<Vec<_>>(), ["B"]);
        assert_eq!(cp.chain, vec![AssignmentId::from("A"), AssignmentId::from("B")]);
    }

    #[test]
    fn test_ties_are_all_critical() {
        let g = graph(vec![task("A", 1, 3, &[]), task("B", 10, 12, &[]), task("C", 1, 1, &[])]);
        let cp = g.critical_path().unwrap();
        assert_eq!(cp.critical.len(), 2);
        assert!(cp.is_critical(&"A".into()));
        assert!(cp.is_critical(&"B".into()));
        // lowest id wins the chain
        assert_eq!(cp.chain, vec![AssignmentId::from("A")]);
    }

    #[test]
    fn test_chain_prefers_longest_then_lowest_predecessor() {
        let g = graph(vec![
            task("X", 1, 2, &[]),
            task("Y", 1, 4, &[]),
            task("Z", 1, 4, &[]),
            task("T", 5, 5, &["X", "Z", "Y"]),
        ]);
        let cp = g.critical_path().unwrap();
        assert_eq!(cp.max_length, 5);
        assert_eq!(cp.chain, vec![AssignmentId::from("Y"), AssignmentId::from("T")]);
    }

    #[test]
    fn test_missing_reference_is_ignored() {
        let g = graph(vec![task("A", 1, 2, &["ghost"])]);
        assert!(!g.has_incoming(&"A".into()));
        assert_eq!(g.critical_path().unwrap().max_length, 2);
    }

    #[test]
    fn test_cycle_is_reported() {
        let g = graph(vec![
            task("A", 1, 2, &["C"]),
            task("B", 1, 2, &["A"]),
            task("C", 1, 2, &["B"]),
        ]);
        match g.check_acyclic() {
            Err(PlannerError::CycleDetected { cycle }) => {
                assert_eq!(cycle.len(), 4);
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let g = graph(vec![task("A", 1, 2, &["A"])]);
        assert!(g.critical_path().is_err());
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        // n00000 depends on n00001 and so on, so the walk starts at the deepest end.
        let mut tasks = vec![task("n19999", 1, 1, &[])];
        for i in 0..19_999 {
            let pred = format!("n{:05}", i + 1);
            tasks.push(task(&format!("n{:05}", i), 1, 1, &[pred.as_str()]));
        }
        let cp = graph(tasks).critical_path().unwrap();
        assert_eq!(cp.max_length, 20_000);
        assert_eq!(cp.chain.len(), 20_000);
    }

    #[test]
    fn test_cache_recomputes_on_revision_change_only() {
        let ds = Dataset {
            assignments: vec![task("A", 1, 5, &[])],
            ..Dataset::default()
        };
        let mut cache = CriticalPathCache::default();
        let first = cache.get(1, &ds);
        let again = cache.get(1, &ds);
        assert!(Arc::ptr_eq(&first, &again));
        let next = cache.get(2, &ds);
        assert!(!Arc::ptr_eq(&first, &next));
    }
}
