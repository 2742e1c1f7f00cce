//! Per-row lane assignment for overlapping assignments.

use std::collections::HashMap;

use chrono::NaiveDate;
use egui::Color32;
use tracing::debug;

use super::filter::FilterCriteria;
use crate::model::{Assignment, AssignmentId, Dataset, ProjectId, ResourceId};

/// Whether rows are resources or projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Resources,
    Projects,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Resource(ResourceId),
    Project(ProjectId),
}

/// Lane index per assignment within one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lanes {
    by_id: HashMap<AssignmentId, usize>,
    count: usize,
}

impl Lanes {
    pub fn lane_of(&self, id: &AssignmentId) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Number of lanes in use (0 for an empty row).
    pub fn count(&self) -> usize {
        self.count
    }
}

/// First-fit lane assignment over assignments sorted by start.
///
/// Each assignment takes the lowest lane whose last occupant ends strictly
/// before it starts. Milestones are one-day points under the same rule.
/// Ties on start are broken by end then id, so the result depends only on the
/// set of assignments, not their input order.
pub fn assign_lanes<'a>(assignments: impl IntoIterator<Item = &'a Assignment>) -> Lanes {
    let mut sorted: Vec<&Assignment> = assignments.into_iter().collect();
    sorted.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(a.end.cmp(&b.end))
            .then(a.id.cmp(&b.id))
    });

    let mut lane_ends: Vec<NaiveDate> = Vec::new();
    let mut by_id = HashMap::with_capacity(sorted.len());
    for a in sorted {
        let lane = match lane_ends.iter().position(|end| *end < a.start) {
            Some(free) => {
                lane_ends[free] = a.end;
                free
            }
            None => {
                lane_ends.push(a.end);
                lane_ends.len() - 1
            }
        };
        by_id.insert(a.id.clone(), lane);
    }

    Lanes {
        by_id,
        count: lane_ends.len(),
    }
}

/// One resource or project with its visible, lane-assigned assignments.
#[derive(Debug, Clone)]
pub struct Row {
    pub key: RowKey,
    pub label: String,
    pub color: Color32,
    /// Visible assignments ordered by start, then id.
    pub assignments: Vec<Assignment>,
    pub lanes: Lanes,
}

impl Row {
    fn new(key: RowKey, label: String, color: Color32, mut assignments: Vec<Assignment>) -> Self {
        assignments.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));
        let lanes = assign_lanes(&assignments);
        Self {
            key,
            label,
            color,
            assignments,
            lanes,
        }
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.count().max(1)
    }
}

/// Build rows in dataset order. Assignments failing `filter` or pointing at
/// an unknown resource/project are left out.
pub fn build_rows(dataset: &Dataset, mode: ViewMode, filter: &FilterCriteria) -> Vec<Row> {
    let mut grouped: HashMap<RowKey, Vec<Assignment>> = HashMap::new();
    for a in dataset.assignments.iter().filter(|a| filter.passes(a)) {
        let key = match mode {
            ViewMode::Resources => RowKey::Resource(a.resource_id.clone()),
            ViewMode::Projects => RowKey::Project(a.project_id.clone()),
        };
        grouped.entry(key).or_default().push(a.clone());
    }

    let heads: Vec<(RowKey, &str, Color32)> = match mode {
        ViewMode::Resources => dataset
            .resources
            .iter()
            .map(|r| (RowKey::Resource(r.id.clone()), r.name.as_str(), r.color))
            .collect(),
        ViewMode::Projects => dataset
            .projects
            .iter()
            .map(|p| (RowKey::Project(p.id.clone()), p.name.as_str(), p.color))
            .collect(),
    };

    let rows: Vec<Row> = heads
        .into_iter()
        .map(|(key, label, color)| {
            let items = grouped.remove(&key).unwrap_or_default();
            Row::new(key, label.to_string(), color, items)
        })
        .collect();

    let orphans: usize = grouped.values().map(Vec::len).sum();
    if orphans > 0 {
        debug!(orphans, ?mode, "assignments without a matching row skipped");
    }
    rows
}

/// Visible ids in display order: row by row, each row by start then id.
pub fn visible_ids(rows: &[Row]) -> Vec<AssignmentId> {
    rows.iter()
        .flat_map(|r| r.assignments.iter().map(|a| a.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Project, Resource, TaskStatus};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn task(id: &str, start: u32, end: u32) -> Assignment {
        Assignment::new("r1".into(), "p1".into(), d(start), d(end)).with_id(id)
    }

    #[test]
    fn test_overlapping_tasks_get_distinct_lanes() {
        let a = task("A", 1, 5);
        let b = task("B", 3, 7);
        let lanes = assign_lanes([&a, &b]);
        assert_eq!(lanes.lane_of(&a.id), Some(0));
        assert_eq!(lanes.lane_of(&b.id), Some(1));
        assert_eq!(lanes.count(), 2);
    }

    #[test]
    fn test_touching_ranges_overlap_on_the_shared_day() {
        let a = task("A", 1, 5);
        let b = task("B", 5, 6);
        let c = task("C", 6, 9);
        let lanes = assign_lanes([&a, &b, &c]);
        assert_eq!(lanes.lane_of(&b.id), Some(1));
        // C starts after A ends, so it reuses lane 0
        assert_eq!(lanes.lane_of(&c.id), Some(0));
    }

    #[test]
    fn test_more_collisions_than_any_fixed_modulo() {
        let tasks: Vec<Assignment> = (0..6).map(|i| task(&format!("t{}", i), 1, 10)).collect();
        let lanes = assign_lanes(&tasks);
        assert_eq!(lanes.count(), 6);
        let mut seen: Vec<usize> = tasks.iter().filter_map(|t| lanes.lane_of(&t.id)).collect();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_milestone_occupies_a_point() {
        let a = task("A", 1, 5);
        let mut m = task("M", 3, 3);
        m.milestone = true;
        let after = task("Z", 4, 4);
        let lanes = assign_lanes([&a, &m, &after]);
        assert_eq!(lanes.lane_of(&m.id), Some(1));
        assert_eq!(lanes.lane_of(&after.id), Some(1));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = task("A", 1, 5);
        let b = task("B", 3, 7);
        let c = task("C", 2, 2);
        assert_eq!(assign_lanes([&a, &b, &c]), assign_lanes([&c, &b, &a]));
    }

    fn dataset() -> Dataset {
        let mut blocked = task("B", 3, 7);
        blocked.status = TaskStatus::Blocked;
        let mut other = task("C", 2, 4);
        other.resource_id = "r2".into();
        other.project_id = "p2".into();
        let mut orphan = task("X", 1, 1);
        orphan.resource_id = "ghost".into();
        Dataset {
            resources: vec![
                Resource::new("r1", "Mari", Color32::RED),
                Resource::new("r2", "Jaan", Color32::BLUE),
            ],
            projects: vec![
                Project::new("p1", "Web", Color32::GREEN),
                Project::new("p2", "App", Color32::YELLOW),
            ],
            assignments: vec![task("A", 1, 5), blocked, other, orphan],
        }
    }

    #[test]
    fn test_build_rows_groups_by_view_mode() {
        let ds = dataset();
        let rows = build_rows(&ds, ViewMode::Resources, &FilterCriteria::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "Mari");
        assert_eq!(rows[0].assignments.len(), 2);
        assert_eq!(rows[0].lanes.count(), 2);
        assert_eq!(rows[1].assignments.len(), 1);

        let rows = build_rows(&ds, ViewMode::Projects, &FilterCriteria::default());
        assert_eq!(rows[0].key, RowKey::Project("p1".into()));
        // the orphan still belongs to project p1
        assert_eq!(rows[0].assignments.len(), 3);
    }

    #[test]
    fn test_filter_applies_before_layout() {
        let ds = dataset();
        let mut filter = FilterCriteria::default();
        filter.toggle_status(TaskStatus::NotStarted);
        let rows = build_rows(&ds, ViewMode::Resources, &filter);
        assert_eq!(rows[0].assignments.len(), 1);
        assert_eq!(rows[0].lane_count(), 1);
        assert_eq!(
            visible_ids(&rows),
            vec![AssignmentId::from("A"), AssignmentId::from("C")]
        );
    }
}
